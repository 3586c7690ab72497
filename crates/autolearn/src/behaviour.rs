use std::collections::HashMap;
use std::fmt::Write as _;

use crate::alphabet::{Alphabet, Symbol, Word};
use crate::error::AutolearnError;
use crate::stratified::StratifiedTable;

#[derive(Debug, Clone)]
struct BehaviourState {
    level: usize,
    label: String,
    accepting: bool,
}

/// The behaviour graph hypothesis (`spec.md` §3/§4.5): states are
/// equivalence classes at each known level, named `"i_u"` as display
/// metadata only — the structured state carries `(level, class_id)`
/// instead of parsing the name back apart.
#[derive(Debug, Clone)]
pub struct BehaviourGraph<T: Symbol> {
    states: Vec<BehaviourState>,
    class_of: HashMap<(usize, usize), usize>,
    initial: usize,
    transitions: HashMap<(usize, T), usize>,
}

impl<T: Symbol> BehaviourGraph<T> {
    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn level_of(&self, state: usize) -> usize {
        self.states[state].level
    }

    pub fn label(&self, state: usize) -> &str {
        &self.states[state].label
    }

    pub fn is_accepting(&self, state: usize) -> bool {
        self.states[state].accepting
    }

    pub fn states_at_level(&self, level: usize) -> Vec<usize> {
        (0..self.states.len())
            .filter(|&s| self.states[s].level == level)
            .collect()
    }

    pub fn successor(&self, state: usize, symbol: &T) -> Option<usize> {
        self.transitions.get(&(state, symbol.clone())).copied()
    }

    pub fn outgoing(&self, state: usize) -> impl Iterator<Item = (&T, usize)> {
        self.transitions
            .iter()
            .filter(move |((s, _), _)| *s == state)
            .map(|((_, a), &to)| (a, to))
    }

    pub fn incoming(&self, state: usize) -> impl Iterator<Item = (&T, usize)> {
        self.transitions
            .iter()
            .filter(move |&(_, &to)| to == state)
            .map(|((from, a), _)| (a, *from))
    }

    pub fn remove_state(&mut self, state: usize) {
        self.transitions
            .retain(|(from, _), to| *from != state && *to != state);
    }

    /// Judges `word` against the behaviour graph up to its currently known
    /// levels: `None` if the walk steps outside `[0, t]` (out of range for
    /// this partial hypothesis), `Some(accept)` otherwise.
    pub fn accepts_partial(&self, word: &[T]) -> Option<bool> {
        let mut state = self.initial;
        for symbol in word {
            state = self.successor(state, symbol)?;
        }
        Some(self.is_accepting(state))
    }

    /// Renders the graph as Graphviz `dot`, for diagnostics only.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph Behaviour {\n    rankdir=LR;\n");
        for (id, state) in self.states.iter().enumerate() {
            let shape = if state.accepting { "doublecircle" } else { "circle" };
            let _ = writeln!(dot, "    s{id} [shape={shape}, label={:?}];", state.label);
        }
        let _ = writeln!(dot, "    __start__ [shape=point];");
        let _ = writeln!(dot, "    __start__ -> s{};", self.initial);
        for ((from, symbol), to) in &self.transitions {
            let _ = writeln!(dot, "    s{from} -> s{to} [label={:?}];", symbol.to_string());
        }
        dot.push_str("}\n");
        dot
    }
}

/// Builds the behaviour graph from a level-closed, consistent stratified
/// table (`spec.md` §4.5): one deduplicated state per row signature at each
/// level, transitions following `cv`-stepping O-equivalence.
pub fn build_behaviour<T: Symbol>(
    table: &StratifiedTable<T>,
    alphabet: &Alphabet<T>,
) -> Result<BehaviourGraph<T>, AutolearnError> {
    let t = table.t();
    let mut states = Vec::new();
    let mut class_of = HashMap::new();
    // representatives[i][class_id] = (signature, representative word)
    let mut representatives: Vec<Vec<(Vec<bool>, Word<T>)>> = Vec::with_capacity(t + 1);

    for i in 0..=t {
        let level_table = &table.levels()[i];
        let mut reps: Vec<(Vec<bool>, Word<T>)> = Vec::new();
        for r in level_table.rows() {
            let sig = level_table.row_signature(r);
            if !reps.iter().any(|(s, _)| s == &sig) {
                reps.push((sig, r.clone()));
            }
        }
        for (class_id, (sig, rep)) in reps.iter().enumerate() {
            let accepting = i == 0 && *sig.first().unwrap_or(&false);
            let label = format!("{}_{}", i, crate::teacher::format_word(rep));
            let state_id = states.len();
            states.push(BehaviourState {
                level: i,
                label,
                accepting,
            });
            class_of.insert((i, class_id), state_id);
        }
        representatives.push(reps);
    }

    let initial = *class_of
        .get(&(0, 0))
        .expect("level 0 always has at least the ε class");

    let mut transitions = HashMap::new();
    for i in 0..=t {
        let reps = representatives[i].clone();
        for (class_id, (_, rep)) in reps.iter().enumerate() {
            let from = class_of[&(i, class_id)];
            for a in alphabet.symbols() {
                let weight = alphabet.weight(a)? as i64;
                let j = i as i64 + weight;
                if j < 0 || j as usize > t {
                    continue;
                }
                let j = j as usize;
                let mut ra = rep.clone();
                ra.push(a.clone());
                let ra_sig = table.levels()[j].row_signature(&ra);
                if let Some(to_class) = representatives[j]
                    .iter()
                    .position(|(sig, _)| sig == &ra_sig)
                {
                    transitions.insert((from, a.clone()), class_of[&(j, to_class)]);
                }
            }
        }
    }

    Ok(BehaviourGraph {
        states,
        class_of,
        initial,
        transitions,
    })
}
