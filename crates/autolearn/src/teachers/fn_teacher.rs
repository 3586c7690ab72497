use std::collections::VecDeque;

use crate::alphabet::{Alphabet, Symbol, Word};
use crate::automaton::Nfa;
use crate::behaviour::BehaviourGraph;
use crate::one_counter::OneCounterAutomaton;
use crate::teacher::{CounterTeacher, EquivResult, Teacher};

/// A teacher defined by an arbitrary membership closure rather than a
/// regular expression, for demonstration languages a regex cannot express
/// (`aⁿbⁿ`, `(ab)*` fed to the stratified learner, and similar). Equivalence
/// is a bounded breadth-first search over `Σ*`, in the style of
/// `teachers::regex_teacher`.
pub struct FnTeacher<T: Symbol, F: FnMut(&[T]) -> bool> {
    member_fn: F,
    alphabet: Alphabet<T>,
    max_length: usize,
}

impl<T: Symbol, F: FnMut(&[T]) -> bool> FnTeacher<T, F> {
    pub fn new(alphabet: Alphabet<T>, member_fn: F, max_length: usize) -> Self {
        FnTeacher {
            member_fn,
            alphabet,
            max_length,
        }
    }

    fn words(&self) -> VecDeque<Word<T>> {
        let mut queue = VecDeque::new();
        queue.push_back(Vec::new());
        queue
    }
}

impl<T: Symbol, F: FnMut(&[T]) -> bool> Teacher<T> for FnTeacher<T, F> {
    fn member(&mut self, word: &[T]) -> bool {
        (self.member_fn)(word)
    }

    fn equiv(&mut self, hypothesis: &Nfa<T>) -> EquivResult<T> {
        let mut queue = self.words();
        while let Some(word) = queue.pop_front() {
            if (self.member_fn)(&word) != hypothesis.accepts(&word) {
                return EquivResult::CounterExample(word);
            }
            if word.len() < self.max_length {
                for symbol in self.alphabet.symbols() {
                    let mut extended = word.clone();
                    extended.push(symbol.clone());
                    queue.push_back(extended);
                }
            }
        }
        EquivResult::Ok
    }
}

impl<T: Symbol, F: FnMut(&[T]) -> bool> CounterTeacher<T> for FnTeacher<T, F> {
    /// Only judges words whose prefixes never step outside the behaviour
    /// graph's currently known levels; out-of-range words are skipped
    /// rather than treated as a disagreement.
    fn equiv_behaviour(&mut self, graph: &BehaviourGraph<T>) -> EquivResult<T> {
        let mut queue = self.words();
        while let Some(word) = queue.pop_front() {
            if let Some(hypothesis_answer) = graph.accepts_partial(&word) {
                if (self.member_fn)(&word) != hypothesis_answer {
                    return EquivResult::CounterExample(word);
                }
            }
            if word.len() < self.max_length {
                for symbol in self.alphabet.symbols() {
                    let mut extended = word.clone();
                    extended.push(symbol.clone());
                    queue.push_back(extended);
                }
            }
        }
        EquivResult::Ok
    }

    fn equiv_one_counter(&mut self, automaton: &OneCounterAutomaton<T>) -> EquivResult<T> {
        let mut queue = self.words();
        while let Some(word) = queue.pop_front() {
            // Every word built here only ever uses symbols from `self.alphabet`,
            // the same weight map the automaton was learned over, so
            // `WeightUndefined` cannot occur; a well-formed word simply gets
            // skipped rather than treated as a disagreement.
            let disagrees = matches!(automaton.accepts(&word, &self.alphabet), Ok(answer) if answer != (self.member_fn)(&word));
            if disagrees {
                return EquivResult::CounterExample(word);
            }
            if word.len() < self.max_length {
                for symbol in self.alphabet.symbols() {
                    let mut extended = word.clone();
                    extended.push(symbol.clone());
                    queue.push_back(extended);
                }
            }
        }
        EquivResult::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::one_counter::OneCounterLearner;

    fn an_bn(word: &[String]) -> bool {
        let n_a = word.iter().take_while(|s| s.as_str() == "a").count();
        let rest = &word[n_a..];
        rest.iter().all(|s| s == "b") && rest.len() == n_a
    }

    #[test_log::test]
    fn learns_an_bn_with_a_period() {
        let alphabet = Alphabet::weighted([("a".to_string(), 1), ("b".to_string(), -1)]);
        let teacher = FnTeacher::new(alphabet, an_bn, 8);
        let mut learner = OneCounterLearner::new(
            Alphabet::weighted([("a".to_string(), 1), ("b".to_string(), -1)]),
            teacher,
        );
        let automaton = learner.learn().unwrap();
        let alphabet = Alphabet::weighted([("a".to_string(), 1), ("b".to_string(), -1)]);
        let w = |s: &str| -> Vec<String> { s.chars().map(|c| c.to_string()).collect() };
        assert!(automaton.accepts(&w("aabb"), &alphabet).unwrap());
        assert!(!automaton.accepts(&w("aab"), &alphabet).unwrap());
        assert!(!automaton.accepts(&w("abb"), &alphabet).unwrap());
        assert!(!automaton.accepts(&w("abab"), &alphabet).unwrap());
    }
}
