use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::info;

use crate::alphabet::{Alphabet, Symbol, Word};
use crate::behaviour::{build_behaviour, BehaviourGraph};
use crate::error::AutolearnError;
use crate::periodicity::{find_period, loopback_edges, Period};
use crate::stratified::StratifiedTable;
use crate::teacher::{CounterTeacher, EquivResult, MembershipCache};

/// Classification of a one-counter automaton edge, per `spec.md` §4.6's
/// loop-back construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// An ordinary edge computed directly from the behaviour graph, not
    /// touched by the loop-back construction.
    Init,
    /// Copied from a couple's low partner's `+1` edge onto the high
    /// partner; always taken, no guard.
    LoopinUnconditional,
    /// Copied from a couple's high partner's `-1` edge onto the low
    /// partner; taken only once the live counter value has exceeded the
    /// period's offset.
    LoopinConditional { threshold: i64 },
    /// A pre-existing edge reclassified because a loop-in edge now competes
    /// for the same symbol; taken only while the live counter value is
    /// still within the offset.
    Loopout { threshold: i64 },
}

#[derive(Debug, Clone)]
struct OcState {
    level: usize,
    label: String,
    accepting: bool,
}

/// The one-counter automaton of `spec.md` §3/§4.6: the behaviour graph's
/// states restricted to levels `[0, m+k]`, with guarded loop-back edges
/// substituting for the levels above `m + k`. Supplements the distilled
/// spec with a runtime [`Self::accepts`] evaluator (not itself a learner
/// output, but the natural way to exercise the learned periodic structure
/// on inputs whose counter value exceeds every level ever seen during
/// learning).
#[derive(Debug, Clone)]
pub struct OneCounterAutomaton<T: Symbol> {
    states: Vec<OcState>,
    initial: usize,
    transitions: HashMap<(usize, T), Vec<(usize, EdgeKind)>>,
    period: Option<(usize, usize)>,
}

impl<T: Symbol> OneCounterAutomaton<T> {
    pub fn period(&self) -> Option<(usize, usize)> {
        self.period
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn is_accepting(&self, state: usize) -> bool {
        self.states[state].accepting
    }

    pub fn level_of(&self, state: usize) -> usize {
        self.states[state].level
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    /// The edges leaving `state` on `symbol`, with their [`EdgeKind`] —
    /// more than one only when a loop-in edge competes with a reclassified
    /// `Loopout` edge for the same symbol.
    pub fn edges(&self, state: usize, symbol: &T) -> &[(usize, EdgeKind)] {
        self.transitions
            .get(&(state, symbol.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Runs `word`, tracking the live counter value and resolving any
    /// guarded edge competition against it. Rejects (returns `false`) on a
    /// dead end — no candidate edge's guard matches the current value.
    pub fn accepts(&self, word: &[T], alphabet: &Alphabet<T>) -> Result<bool, AutolearnError> {
        let mut state = self.initial;
        let mut cv: i64 = 0;
        for symbol in word {
            cv += alphabet.weight(symbol)? as i64;
            let Some(candidates) = self.transitions.get(&(state, symbol.clone())) else {
                return Ok(false);
            };
            let chosen = candidates.iter().find(|(_, kind)| match kind {
                EdgeKind::LoopinConditional { threshold } => cv > *threshold,
                EdgeKind::Loopout { threshold } => cv <= *threshold,
                EdgeKind::Init | EdgeKind::LoopinUnconditional => true,
            });
            match chosen {
                Some(&(to, _)) => state = to,
                None => return Ok(false),
            }
        }
        Ok(self.is_accepting(state))
    }

    /// Renders the automaton as Graphviz `dot`, for diagnostics only.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph OneCounter {\n    rankdir=LR;\n");
        for (id, state) in self.states.iter().enumerate() {
            let shape = if state.accepting { "doublecircle" } else { "circle" };
            let _ = writeln!(dot, "    s{id} [shape={shape}, label={:?}];", state.label);
        }
        let _ = writeln!(dot, "    __start__ [shape=point];");
        let _ = writeln!(dot, "    __start__ -> s{};", self.initial);
        for ((from, symbol), targets) in &self.transitions {
            for (to, kind) in targets {
                let guard = match kind {
                    EdgeKind::Init => String::new(),
                    EdgeKind::LoopinUnconditional => " [loopin]".to_string(),
                    EdgeKind::LoopinConditional { threshold } => format!(" [cv>{threshold}]"),
                    EdgeKind::Loopout { threshold } => format!(" [cv<={threshold}]"),
                };
                let _ = writeln!(
                    dot,
                    "    s{from} -> s{to} [label={:?}];",
                    format!("{symbol}{guard}")
                );
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Builds the looped automaton from a behaviour graph and an optional
/// detected period (`spec.md` §4.6): without a period, states at every
/// known level are kept verbatim as `Init` edges; with one, states at
/// levels above `m + k` are dropped and the loop-back edges from
/// [`loopback_edges`] are layered in alongside the surviving ordinary
/// edges (reclassified to `Loopout` where a loop-in edge competes).
pub fn build_one_counter<T: Symbol>(
    graph: &BehaviourGraph<T>,
    alphabet: &Alphabet<T>,
    period: Option<&Period>,
) -> Result<OneCounterAutomaton<T>, AutolearnError> {
    let keep_above: Option<usize> = period.map(|p| p.m + p.k);

    let mut old_to_new: HashMap<usize, usize> = HashMap::new();
    let mut states = Vec::new();
    for s in 0..graph.num_states() {
        if let Some(limit) = keep_above {
            if graph.level_of(s) > limit {
                continue;
            }
        }
        let new_id = states.len();
        states.push(OcState {
            level: graph.level_of(s),
            label: graph.label(s).to_string(),
            accepting: graph.is_accepting(s),
        });
        old_to_new.insert(s, new_id);
    }

    let initial = *old_to_new
        .get(&graph.initial())
        .expect("initial state is always at level 0, never pruned");

    let mut transitions: HashMap<(usize, T), Vec<(usize, EdgeKind)>> = HashMap::new();
    for s in 0..graph.num_states() {
        let Some(&from) = old_to_new.get(&s) else {
            continue;
        };
        for (a, to) in graph.outgoing(s) {
            let Some(&to_new) = old_to_new.get(&to) else {
                continue;
            };
            transitions
                .entry((from, a.clone()))
                .or_default()
                .push((to_new, EdgeKind::Init));
        }
    }

    if let Some(p) = period {
        for (from, symbol, to, kind) in loopback_edges(graph, alphabet, p)? {
            let Some(&from_new) = old_to_new.get(&from) else {
                continue;
            };
            let Some(&to_new) = old_to_new.get(&to) else {
                continue;
            };
            let entry = transitions.entry((from_new, symbol.clone())).or_default();
            if let EdgeKind::LoopinConditional { .. } = kind {
                for (_, existing_kind) in entry.iter_mut() {
                    if matches!(existing_kind, EdgeKind::Init) {
                        *existing_kind = EdgeKind::Loopout { threshold: p.m as i64 };
                    }
                }
            }
            entry.push((to_new, kind));
        }
    }

    Ok(OneCounterAutomaton {
        states,
        initial,
        transitions,
        period: period.map(|p| (p.m, p.k)),
    })
}

/// The stratified learner for visibly one-counter languages (`spec.md`
/// §4.7, "One-counter (stratified)" loop).
pub struct OneCounterLearner<T: Symbol, Te: CounterTeacher<T>> {
    alphabet: Alphabet<T>,
    table: StratifiedTable<T>,
    cache: MembershipCache<T>,
    teacher: Te,
}

impl<T: Symbol, Te: CounterTeacher<T>> OneCounterLearner<T, Te> {
    pub fn new(alphabet: Alphabet<T>, teacher: Te) -> Self {
        OneCounterLearner {
            alphabet,
            table: StratifiedTable::new(),
            cache: MembershipCache::new(),
            teacher,
        }
    }

    /// Runs stratified closure/consistency to a joint fixpoint, builds a
    /// behaviour graph, checks it against the teacher's partial
    /// equivalence query, attempts periodicity detection, and finally
    /// checks the full one-counter automaton — looping on any
    /// counter-example.
    pub fn learn(&mut self) -> Result<OneCounterAutomaton<T>, AutolearnError> {
        self.table.fill(&mut self.cache, &mut self.teacher);

        loop {
            loop {
                let consistent_changed =
                    self.table
                        .make_consistent(&self.alphabet, &mut self.cache, &mut self.teacher)?;
                let closed_changed =
                    self.table
                        .make_closed(&self.alphabet, &mut self.cache, &mut self.teacher)?;
                if !consistent_changed && !closed_changed {
                    break;
                }
            }

            let graph = build_behaviour(&self.table, &self.alphabet)?;

            if let EquivResult::CounterExample(word) = self.teacher.equiv_behaviour(&graph) {
                self.absorb(&word)?;
                continue;
            }

            let period = find_period(&graph, &self.alphabet);
            let automaton = build_one_counter(&graph, &self.alphabet, period.as_ref())?;

            match self.teacher.equiv_one_counter(&automaton) {
                EquivResult::Ok => {
                    info!(
                        states = automaton.num_states(),
                        period = ?automaton.period(),
                        "one-counter learner converged"
                    );
                    return Ok(automaton);
                }
                EquivResult::CounterExample(word) => {
                    self.absorb(&word)?;
                }
            }
        }
    }

    fn absorb(&mut self, word: &Word<T>) -> Result<(), AutolearnError> {
        if word.is_empty() {
            tracing::warn!("received illegal empty counter-example, ignoring");
            return Ok(());
        }
        self.table.absorb_counterexample(word, &self.alphabet)?;
        self.table.fill(&mut self.cache, &mut self.teacher);
        Ok(())
    }
}
