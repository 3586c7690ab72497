use std::collections::{HashMap, VecDeque};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::alphabet::{Alphabet, Symbol};
use crate::behaviour::BehaviourGraph;
use crate::error::AutolearnError;

/// A detected period: offset `m` and length `k`, plus the isomorphism's
/// state couples `(q1, q2)` with `q1` at level `m + i` and `q2` at level
/// `m + k + i`, for `i = 0..=k`.
#[derive(Debug, Clone)]
pub struct Period {
    pub m: usize,
    pub k: usize,
    pub couples: Vec<(usize, usize)>,
}

fn max_level<T: Symbol>(graph: &BehaviourGraph<T>) -> usize {
    (0..graph.num_states())
        .map(|s| graph.level_of(s))
        .max()
        .unwrap_or(0)
}

/// Searches for an isomorphic pair of strata (`spec.md` §4.6): `m` from `0`
/// upward, `k` from `⌊(t-m)/2⌋` downward (longer periods preferred, earliest
/// offset preferred). Requires at least 3 known levels.
pub fn find_period<T: Symbol>(graph: &BehaviourGraph<T>, alphabet: &Alphabet<T>) -> Option<Period> {
    let t = max_level(graph);
    if t + 1 < 3 {
        return None;
    }
    if t < 2 {
        return None;
    }
    for m in 0..=(t - 2) {
        let max_k = (t - m) / 2;
        if max_k < 1 {
            continue;
        }
        for k in (1..=max_k).rev() {
            if let Some(couples) = try_match(graph, alphabet, m, k) {
                debug!(m, k, "periodicity detected");
                return Some(Period { m, k, couples });
            }
        }
    }
    trace!(t, "no period found at any offset/length");
    None
}

/// Attempts to find a level-respecting, acceptance-respecting,
/// transition-respecting isomorphism between the sub-graph induced by
/// levels `[m, m+k]` and the one induced by `[m+k, m+2k]`. Candidate
/// pairings of the level-`m` starting states are tried in turn (one
/// permutation against the level-`m+k` states); the first candidate whose
/// forward propagation and incoming-neighbourhood check both succeed wins.
fn try_match<T: Symbol>(
    graph: &BehaviourGraph<T>,
    alphabet: &Alphabet<T>,
    m: usize,
    k: usize,
) -> Option<Vec<(usize, usize)>> {
    let low_start = graph.states_at_level(m);
    let high_start = graph.states_at_level(m + k);
    if low_start.len() != high_start.len() || low_start.is_empty() {
        return None;
    }

    for perm in high_start.iter().copied().permutations(high_start.len()) {
        if let Some(couples) = try_pairing(graph, alphabet, m, k, &low_start, &perm) {
            return Some(couples);
        }
    }
    None
}

fn try_pairing<T: Symbol>(
    graph: &BehaviourGraph<T>,
    alphabet: &Alphabet<T>,
    m: usize,
    k: usize,
    low_start: &[usize],
    high_start: &[usize],
) -> Option<Vec<(usize, usize)>> {
    let mut forward: HashMap<usize, usize> = HashMap::new();
    let mut backward: HashMap<usize, usize> = HashMap::new();

    for (&q1, &q2) in low_start.iter().zip(high_start.iter()) {
        if graph.is_accepting(q1) != graph.is_accepting(q2) {
            return None;
        }
        forward.insert(q1, q2);
        backward.insert(q2, q1);
    }

    let mut queue: VecDeque<usize> = low_start.iter().copied().collect();
    while let Some(q1) = queue.pop_front() {
        let q2 = forward[&q1];
        for a in alphabet.symbols() {
            let d1 = graph
                .successor(q1, a)
                .filter(|&x| graph.level_of(x) <= m + k);
            let d2 = graph
                .successor(q2, a)
                .filter(|&x| graph.level_of(x) <= m + 2 * k);
            match (d1, d2) {
                (None, None) => {}
                (Some(x), Some(y)) => {
                    if graph.is_accepting(x) != graph.is_accepting(y) {
                        return None;
                    }
                    match (forward.get(&x), backward.get(&y)) {
                        (Some(&existing), _) if existing != y => return None,
                        (_, Some(&existing)) if existing != x => return None,
                        (None, None) => {
                            forward.insert(x, y);
                            backward.insert(y, x);
                            queue.push_back(x);
                        }
                        _ => {}
                    }
                }
                _ => return None,
            }
        }
    }

    if !check_incoming(graph, alphabet, &forward, &backward, m, k) {
        return None;
    }

    // Every pairing discovered while propagating through the low window is a
    // couple — not just the canonical per-level representative — so a
    // branching behaviour graph gets loop-back edges on every state, not
    // only on one arbitrarily chosen path.
    let mut couples: Vec<(usize, usize)> = forward
        .iter()
        .filter(|&(&q1, _)| graph.level_of(q1) >= m && graph.level_of(q1) <= m + k)
        .map(|(&q1, &q2)| (q1, q2))
        .collect();
    couples.sort_by_key(|(q1, _)| graph.level_of(*q1));
    Some(couples)
}

/// Verifies that incoming neighbourhoods agree: for every paired `(q1, q2)`
/// and every symbol, a predecessor of `q1` within the low window has a
/// correspondingly paired predecessor of `q2` within the high window, and
/// vice versa.
fn check_incoming<T: Symbol>(
    graph: &BehaviourGraph<T>,
    _alphabet: &Alphabet<T>,
    forward: &HashMap<usize, usize>,
    backward: &HashMap<usize, usize>,
    m: usize,
    k: usize,
) -> bool {
    for (&q1, &q2) in forward.iter() {
        if graph.level_of(q1) < m || graph.level_of(q1) > m + k {
            continue;
        }
        let preds1: Vec<(T, usize)> = graph
            .incoming(q1)
            .filter(|&(_, p)| graph.level_of(p) >= m && graph.level_of(p) <= m + k)
            .map(|(a, p)| (a.clone(), p))
            .collect();
        for (a, p1) in &preds1 {
            let Some(&p2) = forward.get(p1) else {
                return false;
            };
            if graph.successor(p2, a) != Some(q2) {
                return false;
            }
        }
        let preds2: Vec<(T, usize)> = graph
            .incoming(q2)
            .filter(|&(_, p)| graph.level_of(p) >= m + k && graph.level_of(p) <= m + 2 * k)
            .map(|(a, p)| (a.clone(), p))
            .collect();
        for (a, p2) in &preds2 {
            let Some(&p1) = backward.get(p2) else {
                return false;
            };
            if graph.successor(p1, a) != Some(q1) {
                return false;
            }
        }
    }
    true
}

/// Builds the final [`crate::one_counter::OneCounterAutomaton`] edges
/// (`spec.md` §4.6 "loop-back construction") from a detected period: for
/// every couple `(q1, q2)`, every `+1`-weighted outgoing edge of `q1` is
/// copied onto `q2` as `LoopinUnconditional`; every `-1`-weighted outgoing
/// edge of `q2` is copied onto `q1` as `LoopinConditional` guarded `cv > m`.
/// The caller ([`crate::one_counter::build_one_counter`]) is responsible for
/// reclassifying q1's pre-existing same-symbol edge to `Loopout` guarded
/// `cv <= m` once it sees the competing `LoopinConditional` tuple.
pub fn loopback_edges<T: Symbol>(
    graph: &BehaviourGraph<T>,
    alphabet: &Alphabet<T>,
    period: &Period,
) -> Result<Vec<(usize, T, usize, crate::one_counter::EdgeKind)>, AutolearnError> {
    use crate::one_counter::EdgeKind;

    let mut added = Vec::new();
    for &(q1, q2) in &period.couples {
        for (a, d) in graph.outgoing(q1).collect::<Vec<_>>() {
            if alphabet.weight(a)? == 1 {
                added.push((q2, a.clone(), d, EdgeKind::LoopinUnconditional));
            }
        }
        for (a, d) in graph.outgoing(q2).collect::<Vec<_>>() {
            if alphabet.weight(a)? == -1 {
                // `build_one_counter` reclassifies q1's pre-existing edge on
                // `a` to `Loopout` in place when it consumes this tuple; it
                // does not need a separate tuple for that edge here.
                added.push((q1, a.clone(), d, EdgeKind::LoopinConditional { threshold: period.m as i64 }));
            }
        }
    }
    Ok(added)
}
