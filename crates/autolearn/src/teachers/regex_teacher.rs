use std::collections::VecDeque;

use regex::Regex;

use crate::alphabet::Word;
use crate::automaton::Nfa;
use crate::teacher::{EquivResult, Teacher};

/// A teacher backed by a regular expression over single-character symbols:
/// `member` is a direct regex match, `equiv` is a bounded breadth-first
/// search over `Σ*` comparing the regex against the hypothesis NFA.
pub struct RegexTeacher {
    regex: Regex,
    alphabet: Vec<String>,
    max_length: usize,
}

impl RegexTeacher {
    pub fn new(pattern: impl AsRef<str>, alphabet: Vec<String>) -> Self {
        RegexTeacher {
            regex: Regex::new(pattern.as_ref()).expect("invalid regex pattern"),
            alphabet,
            max_length: 12,
        }
    }

    fn target_member(&self, word: &[String]) -> bool {
        let input: String = word.iter().map(|s| s.as_str()).collect();
        self.regex.is_match(&input)
    }
}

impl Teacher<String> for RegexTeacher {
    fn member(&mut self, word: &[String]) -> bool {
        self.target_member(word)
    }

    /// Breadth-first search over `Σ*` up to `max_length`, returning the
    /// shortest word (in BFS/alphabet order) where the regex and the
    /// hypothesis disagree.
    fn equiv(&mut self, hypothesis: &Nfa<String>) -> EquivResult<String> {
        let mut queue: VecDeque<Word<String>> = VecDeque::new();
        queue.push_back(Vec::new());

        while let Some(word) = queue.pop_front() {
            if self.target_member(&word) != hypothesis.accepts(&word) {
                return EquivResult::CounterExample(word);
            }
            if word.len() < self.max_length {
                for symbol in &self.alphabet {
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
    use crate::learner::LStarLearner;
    use crate::alphabet::Alphabet;

    #[test]
    fn learns_single_a_or_b_star() {
        let alphabet = Alphabet::new(["a".to_string(), "b".to_string()]);
        let teacher = RegexTeacher::new("^(ab)*$", vec!["a".to_string(), "b".to_string()]);
        let mut learner = LStarLearner::new(alphabet, teacher);
        let nfa = learner.learn().unwrap();
        assert!(nfa.accepts(&[]));
        assert!(nfa.accepts(&["a".to_string(), "b".to_string()]));
        assert!(!nfa.accepts(&["a".to_string()]));
        assert!(!nfa.accepts(&["b".to_string(), "a".to_string()]));
    }
}
