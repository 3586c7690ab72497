use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

use autolearn::alphabet::Alphabet;
use autolearn::learner::LStarLearner;
use autolearn::one_counter::OneCounterLearner;
use autolearn::teachers::fn_teacher::FnTeacher;
use autolearn::teachers::regex_teacher::RegexTeacher;
use tracing_subscriber::EnvFilter;

fn an_bn(word: &[String]) -> bool {
    let n_a = word.iter().take_while(|s| s.as_str() == "a").count();
    let rest = &word[n_a..];
    rest.iter().all(|s| s == "b") && rest.len() == n_a
}

fn write_dot(path: &str, contents: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())
}

fn run() -> Result<(), autolearn::error::AutolearnError> {
    let symbols = vec!["a".to_string(), "b".to_string()];
    let regex_teacher = RegexTeacher::new("^(b*ab*){1}(b*ab*b*ab*){0,}$", symbols.clone());
    let mut regular = LStarLearner::new(Alphabet::new(symbols), regex_teacher);
    let nfa = regular.learn()?;
    write_dot("regular_hypothesis.dot", &nfa.to_dot())
        .expect("unable to write regular_hypothesis.dot");
    println!("Regular hypothesis written to regular_hypothesis.dot");

    let counter_alphabet = Alphabet::weighted([("a".to_string(), 1), ("b".to_string(), -1)]);
    let teacher = FnTeacher::new(counter_alphabet.clone(), an_bn, 10);
    let mut stratified = OneCounterLearner::new(counter_alphabet, teacher);
    let automaton = stratified.learn()?;
    write_dot("one_counter_hypothesis.dot", &automaton.to_dot())
        .expect("unable to write one_counter_hypothesis.dot");
    println!("One-counter hypothesis written to one_counter_hypothesis.dot");

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("learning failed: {err}");
            ExitCode::FAILURE
        }
    }
}
