use std::collections::HashMap;

use tracing::warn;

use crate::alphabet::{Symbol, Word};
use crate::automaton::Nfa;
use crate::behaviour::BehaviourGraph;
use crate::error::AutolearnError;
use crate::one_counter::OneCounterAutomaton;

/// The outcome of an equivalence query: either the hypothesis is accepted,
/// or the teacher hands back a counter-example word. Modelled as an
/// explicit tagged enum rather than a runtime-typed return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquivResult<T: Symbol> {
    Ok,
    CounterExample(Word<T>),
}

impl<T: Symbol> EquivResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, EquivResult::Ok)
    }
}

/// A minimally adequate teacher for the regular (L\*) learner: membership
/// and full equivalence queries.
pub trait Teacher<T: Symbol> {
    /// Answer whether `word` is in the target language. Must be pure and
    /// deterministic within a run; callers are expected to route every call
    /// through a [`MembershipCache`] so repeated queries on the same word
    /// are free and consistent.
    fn member(&mut self, word: &[T]) -> bool;

    /// Judge a full hypothesis against the target language.
    fn equiv(&mut self, hypothesis: &Nfa<T>) -> EquivResult<T>;
}

/// A teacher for the stratified (one-counter) learner. Adds a partial
/// equivalence query over the behaviour graph known so far, used before
/// periodicity detection is attempted.
pub trait CounterTeacher<T: Symbol>: Teacher<T> {
    fn equiv_behaviour(&mut self, graph: &BehaviourGraph<T>) -> EquivResult<T>;

    /// Judge the final, looped one-counter automaton.
    fn equiv_one_counter(&mut self, automaton: &OneCounterAutomaton<T>) -> EquivResult<T>;
}

/// The authoritative membership cache: once a word has been answered, every
/// later query for it must return the same answer within a run.
#[derive(Debug, Default)]
pub struct MembershipCache<T: Symbol> {
    answers: HashMap<Word<T>, bool>,
}

impl<T: Symbol> MembershipCache<T> {
    pub fn new() -> Self {
        MembershipCache {
            answers: HashMap::new(),
        }
    }

    /// Looks up `word`, calling `query` and caching the result on a miss.
    pub fn query(&mut self, word: &[T], query: impl FnOnce(&[T]) -> bool) -> bool {
        if let Some(&cached) = self.answers.get(word) {
            return cached;
        }
        let answer = query(word);
        self.answers.insert(word.to_vec(), answer);
        answer
    }

    /// Records an externally observed answer (e.g. from a counter-example),
    /// flagging an inconsistency against a previously cached answer instead
    /// of silently overwriting it.
    pub fn record(&mut self, word: &[T], answer: bool) -> Result<(), AutolearnError> {
        match self.answers.get(word) {
            Some(&cached) if cached != answer => {
                warn!(word = %format_word(word), cached, now = answer, "teacher inconsistency detected");
                Err(AutolearnError::TeacherInconsistent {
                    word: format_word(word),
                    cached,
                    now: answer,
                })
            }
            _ => {
                self.answers.insert(word.to_vec(), answer);
                Ok(())
            }
        }
    }

    pub fn get(&self, word: &[T]) -> Option<bool> {
        self.answers.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

pub fn format_word<T: Symbol>(word: &[T]) -> String {
    if word.is_empty() {
        "ε".to_string()
    } else {
        word.iter().map(|s| s.to_string()).collect()
    }
}
