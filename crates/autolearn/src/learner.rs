use std::collections::HashMap;

use tracing::info;

use crate::alphabet::{Alphabet, Symbol, Word};
use crate::automaton::Nfa;
use crate::error::AutolearnError;
use crate::table::ObservationTable;
use crate::teacher::{EquivResult, MembershipCache, Teacher};

/// Builds the NFA hypothesis from a closed, consistent table (`spec.md`
/// §4.3): rows are deduplicated by signature, `ε`'s class is initial, a
/// class is accepting iff its representative's `T(·, ε)` column is `1`, and
/// one transition per `(state, a)` is emitted to the class of a
/// representative of `r·a`.
pub fn build_nfa<T: Symbol>(table: &ObservationTable<T>, alphabet: &Alphabet<T>) -> Nfa<T> {
    let rows: Vec<Word<T>> = table.rows().iter().cloned().collect();
    let mut signature_to_state: HashMap<Vec<bool>, usize> = HashMap::new();
    let mut nfa: Option<Nfa<T>> = None;

    for r in &rows {
        let sig = table.row_signature(r);
        if signature_to_state.contains_key(&sig) {
            continue;
        }
        let accepting = *sig.first().unwrap_or(&false);
        let label = if r.is_empty() {
            "ε".to_string()
        } else {
            r.iter().map(|s| s.to_string()).collect()
        };
        let id = match &mut nfa {
            None => {
                let automaton = Nfa::new(label, accepting);
                nfa = Some(automaton);
                0
            }
            Some(automaton) => automaton.add_state(label, accepting),
        };
        signature_to_state.insert(sig, id);
    }

    let mut nfa = nfa.expect("table always has at least the ε row");

    for r in &rows {
        let from = signature_to_state[&table.row_signature(r)];
        for a in alphabet.symbols() {
            let mut ra = r.clone();
            ra.push(a.clone());
            let ra_sig = table.row_signature(&ra);
            if let Some(&to) = signature_to_state.get(&ra_sig) {
                nfa.add_transition(from, a.clone(), to);
            }
        }
    }

    nfa
}

/// The L\*-style learner for regular languages (`spec.md` §4.7, "Regular
/// (L\*)" loop).
pub struct LStarLearner<T: Symbol, Te: Teacher<T>> {
    alphabet: Alphabet<T>,
    table: ObservationTable<T>,
    cache: MembershipCache<T>,
    teacher: Te,
}

impl<T: Symbol, Te: Teacher<T>> LStarLearner<T, Te> {
    pub fn new(alphabet: Alphabet<T>, teacher: Te) -> Self {
        LStarLearner {
            alphabet,
            table: ObservationTable::new(),
            cache: MembershipCache::new(),
            teacher,
        }
    }

    /// Runs closure/consistency to a joint fixpoint, builds a hypothesis,
    /// asks the teacher, and on a counter-example absorbs its prefixes —
    /// looping until the teacher accepts.
    pub fn learn(&mut self) -> Result<Nfa<T>, AutolearnError> {
        self.table.fill(&self.alphabet, &mut self.cache, &mut self.teacher);

        loop {
            loop {
                let consistent_changed =
                    self.table
                        .make_consistent(&self.alphabet, &mut self.cache, &mut self.teacher);
                let closed_changed =
                    self.table
                        .make_closed(&self.alphabet, &mut self.cache, &mut self.teacher);
                if !consistent_changed && !closed_changed {
                    break;
                }
            }

            let hypothesis = build_nfa(&self.table, &self.alphabet);
            match self.teacher.equiv(&hypothesis) {
                EquivResult::Ok => {
                    info!(states = hypothesis.states().len(), "L* learner converged");
                    return Ok(hypothesis);
                }
                EquivResult::CounterExample(word) => {
                    if word.is_empty() {
                        tracing::warn!("received illegal empty counter-example, ignoring");
                        continue;
                    }
                    let actual = self.table_member(&word);
                    if hypothesis.accepts(&word) == actual {
                        tracing::warn!(?word, "malformed counter-example: no real disagreement");
                        continue;
                    }
                    self.table.absorb_counterexample(&word);
                    self.table.fill(&self.alphabet, &mut self.cache, &mut self.teacher);
                }
            }
        }
    }

    fn table_member(&mut self, word: &[T]) -> bool {
        let teacher = &mut self.teacher;
        self.cache.query(word, |w| teacher.member(w))
    }
}
