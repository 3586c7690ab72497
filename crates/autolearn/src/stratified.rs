use indexmap::IndexSet;
use tracing::debug;

use crate::alphabet::{Alphabet, Symbol, Word};
use crate::error::AutolearnError;
use crate::table::ObservationTable;
use crate::teacher::{MembershipCache, Teacher};

/// The stratified observation table `{Oᵢ}` of `spec.md` §3/§4.4: a family
/// of flat tables indexed by counter value, `levels[i]` holding only access
/// words of `cv = i`. `t = levels.len() - 1` is the highest known level.
#[derive(Debug, Clone)]
pub struct StratifiedTable<T: Symbol> {
    levels: Vec<ObservationTable<T>>,
}

impl<T: Symbol> Default for StratifiedTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Symbol> StratifiedTable<T> {
    /// `O₀ = {(ε, ε) ↦ member(ε)}` (unfilled until [`Self::fill`] is called).
    pub fn new() -> Self {
        let mut level0 = ObservationTable::empty();
        level0.insert_row(Word::new());
        level0.insert_column(Word::new());
        StratifiedTable {
            levels: vec![level0],
        }
    }

    /// The highest level currently known.
    pub fn t(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn level(&self, i: usize) -> Option<&ObservationTable<T>> {
        self.levels.get(i)
    }

    fn ensure_level(&mut self, i: usize) {
        while self.levels.len() <= i {
            self.levels.push(ObservationTable::empty());
        }
    }

    /// Fills every level's `R × S` cells against the teacher.
    pub fn fill<Te: Teacher<T>>(&mut self, cache: &mut MembershipCache<T>, teacher: &mut Te) {
        for level in &mut self.levels {
            level.fill_rows(cache, teacher);
        }
    }

    /// `extend(w)` (`spec.md` §4.4): computes `i = cv(w)`, grows the family
    /// to at least `i + 1` levels if needed, and adds `w` as a row of
    /// `Oᵢ`. Seeds `Oᵢ`'s column set with `ε` the first time a row lands
    /// there.
    pub fn extend(&mut self, word: &[T], alphabet: &Alphabet<T>) -> Result<(), AutolearnError> {
        let cv = alphabet.cv(word)?;
        if cv < 0 {
            return Err(AutolearnError::OutOfRangeStep {
                requested: cv,
                known_max: self.t(),
            });
        }
        let i = cv as usize;
        self.ensure_level(i);
        if self.levels[i].columns().is_empty() {
            self.levels[i].insert_column(Word::new());
        }
        self.levels[i].insert_row(word.to_vec());
        Ok(())
    }

    /// The O-equivalence class representative of `word`: the access word in
    /// `R_{cv(word)}` sharing its row signature, if any. `word`'s cells
    /// against the target level's columns are filled on demand first.
    pub fn representative<Te: Teacher<T>>(
        &mut self,
        word: &[T],
        alphabet: &Alphabet<T>,
        cache: &mut MembershipCache<T>,
        teacher: &mut Te,
    ) -> Result<Option<Word<T>>, AutolearnError> {
        let cv = alphabet.cv(word)?;
        if cv < 0 || cv as usize > self.t() {
            return Ok(None);
        }
        let i = cv as usize;
        let level = &mut self.levels[i];
        level.fill_word(word, cache, teacher);
        let sig = level.row_signature(word);
        Ok(level
            .rows()
            .iter()
            .find(|r| level.row_signature(r) == sig)
            .cloned())
    }

    /// One stratified consistency step (`spec.md` §4.4): over all pairs
    /// `u, v` O-equivalent at the same level `i`, for each `a ∈ Σ` with
    /// `j = i + χ(a)` in `[0, t]`, if `u·a` and `v·a` disagree on some
    /// column of `O_j`, add the witnessing column there and return `true`.
    /// A step whose target level falls outside `[0, t]` is simply skipped —
    /// the caller grows `t` via a counter-example instead.
    pub fn make_consistent<Te: Teacher<T>>(
        &mut self,
        alphabet: &Alphabet<T>,
        cache: &mut MembershipCache<T>,
        teacher: &mut Te,
    ) -> Result<bool, AutolearnError> {
        let t = self.t();
        for i in 0..=t {
            let rows: Vec<Word<T>> = self.levels[i].rows().iter().cloned().collect();
            for (idx, u) in rows.iter().enumerate() {
                let sig_u = self.levels[i].row_signature(u);
                for v in rows.iter().skip(idx + 1) {
                    if self.levels[i].row_signature(v) != sig_u {
                        continue;
                    }
                    for a in alphabet.symbols() {
                        let weight = alphabet.weight(a)? as i64;
                        let j = i as i64 + weight;
                        if j < 0 || j as usize > t {
                            continue;
                        }
                        let j = j as usize;
                        let mut ua = u.clone();
                        ua.push(a.clone());
                        let mut va = v.clone();
                        va.push(a.clone());
                        self.levels[j].fill_word(&ua, cache, teacher);
                        self.levels[j].fill_word(&va, cache, teacher);
                        let witness = self.levels[j]
                            .columns()
                            .iter()
                            .find(|s| self.levels[j].get(&ua, s) != self.levels[j].get(&va, s))
                            .cloned();
                        if let Some(s) = witness {
                            let mut new_col = vec![a.clone()];
                            new_col.extend(s.iter().cloned());
                            if self.levels[j].insert_column(new_col.clone()) {
                                debug!(level = j, column = ?new_col, "stratified consistency violation");
                                self.levels[j].fill_rows(cache, teacher);
                                return Ok(true);
                            }
                        }
                    }
                }
            }
        }
        Ok(false)
    }

    /// One stratified closure step (`spec.md` §4.4): for each `r ∈ R_i`,
    /// `a ∈ Σ` with `j = i + χ(a)` in the strict interior `[0, t]`, if no
    /// row of `R_j` is O-equivalent to `r·a`, add `r·a` to `R_j` and return
    /// `true`. Boundary steps (`χ(a) = -1 ∧ i = 0`, or `j` above `t`) are
    /// skipped, matching the permanent lower-bound exclusion and the
    /// "request more counter-examples" treatment of the upper bound.
    pub fn make_closed<Te: Teacher<T>>(
        &mut self,
        alphabet: &Alphabet<T>,
        cache: &mut MembershipCache<T>,
        teacher: &mut Te,
    ) -> Result<bool, AutolearnError> {
        let t = self.t();
        for i in 0..=t {
            let rows: Vec<Word<T>> = self.levels[i].rows().iter().cloned().collect();
            for r in &rows {
                for a in alphabet.symbols() {
                    let weight = alphabet.weight(a)? as i64;
                    let j = i as i64 + weight;
                    if j < 0 || j as usize > t {
                        continue;
                    }
                    let j = j as usize;
                    let mut ra = r.clone();
                    ra.push(a.clone());
                    if self.levels[j].rows().contains(&ra) {
                        continue;
                    }
                    self.levels[j].fill_word(&ra, cache, teacher);
                    let ra_sig = self.levels[j].row_signature(&ra);
                    let has_representative = self.levels[j]
                        .rows()
                        .iter()
                        .any(|existing| self.levels[j].row_signature(existing) == ra_sig);
                    if !has_representative {
                        debug!(level = j, row = ?ra, "stratified closure violation");
                        self.levels[j].insert_row(ra);
                        self.levels[j].fill_rows(cache, teacher);
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// `absorb_counterexample_strat` (`spec.md` §4.7): inserts every prefix
    /// `p` of `word` into `O_{cv(p)}` (growing the family as needed), and
    /// for each prefix adds the remaining suffix of `word` as a new column
    /// at that prefix's level.
    pub fn absorb_counterexample(
        &mut self,
        word: &[T],
        alphabet: &Alphabet<T>,
    ) -> Result<(), AutolearnError> {
        for i in 0..=word.len() {
            let prefix = &word[..i];
            let suffix = word[i..].to_vec();
            self.extend(prefix, alphabet)?;
            let level_idx = alphabet.cv(prefix)? as usize;
            self.levels[level_idx].insert_column(suffix);
        }
        Ok(())
    }

    /// Every level index currently known, `0..=t`.
    pub fn level_indices(&self) -> impl Iterator<Item = usize> {
        0..self.levels.len()
    }

    pub fn levels(&self) -> &[ObservationTable<T>] {
        &self.levels
    }
}

/// Dedents a set of rows to their distinct row signatures, preserving
/// insertion order — used by the behaviour-graph builder to assign one
/// state per equivalence class at a level.
pub fn dedup_rows<T: Symbol>(table: &ObservationTable<T>) -> IndexSet<Vec<bool>> {
    table.rows().iter().map(|r| table.row_signature(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Nfa;
    use crate::teacher::EquivResult;

    struct AnBn;
    impl Teacher<String> for AnBn {
        fn member(&mut self, word: &[String]) -> bool {
            let n_a = word.iter().take_while(|s| *s == "a").count();
            let rest = &word[n_a..];
            rest.iter().all(|s| s == "b") && rest.len() == n_a
        }
        fn equiv(&mut self, _hypothesis: &Nfa<String>) -> EquivResult<String> {
            EquivResult::Ok
        }
    }
    impl crate::teacher::CounterTeacher<String> for AnBn {
        fn equiv_behaviour(
            &mut self,
            _graph: &crate::behaviour::BehaviourGraph<String>,
        ) -> EquivResult<String> {
            EquivResult::Ok
        }
        fn equiv_one_counter(
            &mut self,
            _automaton: &crate::one_counter::OneCounterAutomaton<String>,
        ) -> EquivResult<String> {
            EquivResult::Ok
        }
    }

    fn alphabet() -> Alphabet<String> {
        Alphabet::weighted([("a".to_string(), 1), ("b".to_string(), -1)])
    }

    #[test]
    fn extend_places_word_at_its_counter_value() {
        let alphabet = alphabet();
        let mut table: StratifiedTable<String> = StratifiedTable::new();
        let word = vec!["a".to_string(), "a".to_string()];
        table.extend(&word, &alphabet).unwrap();
        assert_eq!(table.t(), 2);
        assert!(table.level(2).unwrap().rows().contains(&word));
    }

    #[test]
    fn absorb_counterexample_spans_every_prefix_level() {
        let alphabet = alphabet();
        let mut table: StratifiedTable<String> = StratifiedTable::new();
        let word = vec![
            "a".to_string(),
            "a".to_string(),
            "b".to_string(),
            "b".to_string(),
        ];
        table.absorb_counterexample(&word, &alphabet).unwrap();
        assert_eq!(table.t(), 2);
        assert!(table.level(0).unwrap().rows().contains(&Vec::<String>::new()));
        assert!(table
            .level(1)
            .unwrap()
            .rows()
            .contains(&vec!["a".to_string()]));
        assert!(table.level(2).unwrap().rows().contains(&word[..2].to_vec()));
    }
}
