use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexSet;

use crate::alphabet::Symbol;

/// A single state of the learned acceptor: an opaque integer id, a display
/// label (the access word it was built from), and whether it accepts.
#[derive(Debug, Clone)]
pub struct NfaState {
    label: String,
    accepting: bool,
}

impl NfaState {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }
}

/// The NFA hypothesis built from a closed, consistent observation table
/// (`spec.md` §4.3). States live in an arena indexed by small integer ids
/// so that later structural surgery never has to chase pointers.
#[derive(Debug, Clone)]
pub struct Nfa<T: Symbol> {
    states: Vec<NfaState>,
    initial: usize,
    transitions: HashMap<(usize, T), IndexSet<usize>>,
}

impl<T: Symbol> Nfa<T> {
    pub fn new(initial_label: impl Into<String>, initial_accepting: bool) -> Self {
        Nfa {
            states: vec![NfaState {
                label: initial_label.into(),
                accepting: initial_accepting,
            }],
            initial: 0,
            transitions: HashMap::new(),
        }
    }

    pub fn add_state(&mut self, label: impl Into<String>, accepting: bool) -> usize {
        let id = self.states.len();
        self.states.push(NfaState {
            label: label.into(),
            accepting,
        });
        id
    }

    pub fn add_transition(&mut self, from: usize, symbol: T, to: usize) {
        self.transitions.entry((from, symbol)).or_default().insert(to);
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn states(&self) -> &[NfaState] {
        &self.states
    }

    pub fn is_accepting(&self, state: usize) -> bool {
        self.states[state].accepting
    }

    pub fn successors(&self, state: usize, symbol: &T) -> impl Iterator<Item = usize> + '_ {
        self.transitions
            .get(&(state, symbol.clone()))
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Runs `word` from the initial state; a state set is accepting if any
    /// member accepts, matching NFA semantics.
    pub fn accepts(&self, word: &[T]) -> bool {
        let mut current: IndexSet<usize> = IndexSet::from([self.initial]);
        for symbol in word {
            let mut next = IndexSet::new();
            for &state in &current {
                next.extend(self.successors(state, symbol));
            }
            current = next;
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|&s| self.is_accepting(s))
    }

    /// Renders the automaton as Graphviz `dot`, for diagnostics only.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph NFA {\n    rankdir=LR;\n");
        for (id, state) in self.states.iter().enumerate() {
            let shape = if state.accepting { "doublecircle" } else { "circle" };
            let _ = writeln!(dot, "    s{id} [shape={shape}, label={:?}];", state.label);
        }
        let _ = writeln!(dot, "    __start__ [shape=point];");
        let _ = writeln!(dot, "    __start__ -> s{};", self.initial);
        for ((from, symbol), targets) in &self.transitions {
            for to in targets {
                let _ = writeln!(dot, "    s{from} -> s{to} [label={:?}];", symbol.to_string());
            }
        }
        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_via_dedup_transitions() {
        let mut nfa: Nfa<String> = Nfa::new("ε", false);
        let a_state = nfa.add_state("a", true);
        nfa.add_transition(0, "a".to_string(), a_state);
        nfa.add_transition(a_state, "a".to_string(), a_state);
        assert!(!nfa.accepts(&[]));
        assert!(nfa.accepts(&["a".to_string()]));
        assert!(nfa.accepts(&["a".to_string(), "a".to_string(), "a".to_string()]));
    }
}
