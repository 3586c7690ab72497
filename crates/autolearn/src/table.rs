use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::debug;

use crate::alphabet::{Alphabet, Symbol, Word};
use crate::teacher::{MembershipCache, Teacher};

/// The flat observation table `(R, S, T)` of `spec.md` §3/§4.2. `R` is a
/// prefix-closed, non-empty set of access words, `S` a non-empty set of
/// distinguishing suffixes, and `T` a dense membership map over
/// `(R ∪ R·Σ) × S`.
#[derive(Debug, Clone)]
pub struct ObservationTable<T: Symbol> {
    rows: IndexSet<Word<T>>,
    columns: IndexSet<Word<T>>,
    cells: HashMap<(Word<T>, Word<T>), bool>,
}

impl<T: Symbol> Default for ObservationTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Symbol> ObservationTable<T> {
    /// `R = {ε}`, `S = {ε}`, no cells filled yet.
    pub fn new() -> Self {
        let mut rows = IndexSet::new();
        rows.insert(Word::new());
        let mut columns = IndexSet::new();
        columns.insert(Word::new());
        ObservationTable {
            rows,
            columns,
            cells: HashMap::new(),
        }
    }

    /// An empty table with no rows or columns yet — used by the stratified
    /// table for a level that has not been populated.
    pub fn empty() -> Self {
        ObservationTable {
            rows: IndexSet::new(),
            columns: IndexSet::new(),
            cells: HashMap::new(),
        }
    }

    pub fn rows(&self) -> &IndexSet<Word<T>> {
        &self.rows
    }

    pub fn insert_row(&mut self, row: Word<T>) -> bool {
        self.rows.insert(row)
    }

    pub fn insert_column(&mut self, column: Word<T>) -> bool {
        self.columns.insert(column)
    }

    pub fn columns(&self) -> &IndexSet<Word<T>> {
        &self.columns
    }

    pub fn get(&self, row: &[T], col: &[T]) -> Option<bool> {
        self.cells.get(&(row.to_vec(), col.to_vec())).copied()
    }

    /// `row(r)`: the vector of `T(r, s)` for `s ∈ S`, in column iteration
    /// order. Panics if a cell is unfilled — callers must `fill` first.
    pub fn row_signature(&self, row: &[T]) -> Vec<bool> {
        self.columns
            .iter()
            .map(|s| {
                self.get(row, s)
                    .unwrap_or_else(|| panic!("unfilled cell ({row:?}, {s:?})"))
            })
            .collect()
    }

    /// `R ∪ R·Σ`: every access word plus every one-symbol extension.
    pub fn extended_rows(&self, alphabet: &Alphabet<T>) -> IndexSet<Word<T>> {
        let mut out = self.rows.clone();
        for r in &self.rows {
            for a in alphabet.symbols() {
                let mut ra = r.clone();
                ra.push(a.clone());
                out.insert(ra);
            }
        }
        out
    }

    /// Fills every unfilled `(row, column)` cell where `row` ranges over the
    /// rows currently in `R` (not `R·Σ`) against the current `S`. The
    /// building block both the flat and the per-level stratified fill are
    /// expressed in terms of.
    pub fn fill_rows<Te: Teacher<T>>(&mut self, cache: &mut MembershipCache<T>, teacher: &mut Te) {
        let rows: Vec<Word<T>> = self.rows.iter().cloned().collect();
        let columns: Vec<Word<T>> = self.columns.iter().cloned().collect();
        for r in &rows {
            for s in &columns {
                self.fill_cell(r, s, cache, teacher);
            }
        }
    }

    /// Fills every unfilled `(word, s)` cell for `s ∈ S`, for an arbitrary
    /// word that need not be (and is not inserted as) a row — used to probe
    /// a one-symbol extension's signature before deciding whether to adopt
    /// it into `R`.
    pub fn fill_word<Te: Teacher<T>>(
        &mut self,
        word: &[T],
        cache: &mut MembershipCache<T>,
        teacher: &mut Te,
    ) {
        let columns: Vec<Word<T>> = self.columns.iter().cloned().collect();
        for s in &columns {
            self.fill_cell(word, s, cache, teacher);
        }
    }

    fn fill_cell<Te: Teacher<T>>(
        &mut self,
        row: &[T],
        col: &[T],
        cache: &mut MembershipCache<T>,
        teacher: &mut Te,
    ) {
        let key = (row.to_vec(), col.to_vec());
        if self.cells.contains_key(&key) {
            return;
        }
        let mut word = row.to_vec();
        word.extend(col.iter().cloned());
        let answer = cache.query(&word, |w| teacher.member(w));
        self.cells.insert(key, answer);
    }

    /// Fills every unfilled cell of `(R ∪ R·Σ) × S`, consulting the teacher
    /// through `cache` (§4.1: repeated queries on the same word must return
    /// the cached answer). Used by the flat (L\*) table, whose row set
    /// conceptually spans both `R` and `R·Σ`.
    pub fn fill<Te: Teacher<T>>(
        &mut self,
        alphabet: &Alphabet<T>,
        cache: &mut MembershipCache<T>,
        teacher: &mut Te,
    ) {
        let extended = self.extended_rows(alphabet);
        let original = std::mem::replace(&mut self.rows, extended);
        self.fill_rows(cache, teacher);
        self.rows = original;
    }

    /// Adds every prefix of `word` (including `ε` and `word` itself) to
    /// `R`. Does not fill; callers must call [`Self::fill`] afterwards.
    pub fn absorb_counterexample(&mut self, word: &[T]) {
        for i in 0..=word.len() {
            self.rows.insert(word[..i].to_vec());
        }
    }

    /// One consistency-rewriting step (`spec.md` §4.2 `make_consistent`):
    /// finds `r1, r2 ∈ R` with `row(r1) = row(r2)` and `a ∈ Σ` such that
    /// `row(r1·a) ≠ row(r2·a)`, adds `a·s` (the first witnessing column) to
    /// `S`, refills, and returns `true`. Candidates are tried in row and
    /// symbol iteration order, so the first witness found wins.
    pub fn make_consistent<Te: Teacher<T>>(
        &mut self,
        alphabet: &Alphabet<T>,
        cache: &mut MembershipCache<T>,
        teacher: &mut Te,
    ) -> bool {
        let rows: Vec<Word<T>> = self.rows.iter().cloned().collect();
        for (i, r1) in rows.iter().enumerate() {
            let sig1 = self.row_signature(r1);
            for r2 in rows.iter().skip(i + 1) {
                if self.row_signature(r2) != sig1 {
                    continue;
                }
                for a in alphabet.symbols() {
                    let mut r1a = r1.clone();
                    r1a.push(a.clone());
                    let mut r2a = r2.clone();
                    r2a.push(a.clone());
                    let witness = self
                        .columns
                        .iter()
                        .find(|s| self.get(&r1a, s) != self.get(&r2a, s));
                    if let Some(s) = witness {
                        let mut new_col = vec![a.clone()];
                        new_col.extend(s.iter().cloned());
                        if self.columns.insert(new_col.clone()) {
                            debug!(column = ?new_col, "consistency violation: adding column");
                            self.fill(alphabet, cache, teacher);
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// One closure-rewriting step (`spec.md` §4.2 `make_closed`): finds
    /// `r ∈ R, a ∈ Σ` with no existing row of `R` sharing `row(r·a)`'s
    /// signature, adds `r·a` to `R`, refills, returns `true`.
    ///
    /// The signature set used for the "does a representative already
    /// exist" check is snapshotted *before* `r·a` is tentatively
    /// considered, so a freshly-added candidate is never mistaken for an
    /// already-existing representative of itself.
    pub fn make_closed<Te: Teacher<T>>(
        &mut self,
        alphabet: &Alphabet<T>,
        cache: &mut MembershipCache<T>,
        teacher: &mut Te,
    ) -> bool {
        let rows: Vec<Word<T>> = self.rows.iter().cloned().collect();
        let existing_signatures: IndexSet<Vec<bool>> =
            rows.iter().map(|r| self.row_signature(r)).collect();
        for r in &rows {
            for a in alphabet.symbols() {
                let mut ra = r.clone();
                ra.push(a.clone());
                if self.rows.contains(&ra) {
                    continue;
                }
                let ra_sig = self.row_signature(&ra);
                if !existing_signatures.contains(&ra_sig) {
                    debug!(row = ?ra, "closure violation: adding row");
                    self.rows.insert(ra);
                    self.fill(alphabet, cache, teacher);
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Nfa;
    use crate::teacher::EquivResult;

    struct AllAccept;
    impl Teacher<String> for AllAccept {
        fn member(&mut self, _word: &[String]) -> bool {
            true
        }
        fn equiv(&mut self, _hypothesis: &Nfa<String>) -> EquivResult<String> {
            EquivResult::Ok
        }
    }

    #[test]
    fn universal_language_is_trivially_closed_and_consistent() {
        let alphabet = Alphabet::new(["a".to_string()]);
        let mut table = ObservationTable::new();
        let mut cache = MembershipCache::new();
        let mut teacher = AllAccept;
        table.fill(&alphabet, &mut cache, &mut teacher);
        assert!(!table.make_consistent(&alphabet, &mut cache, &mut teacher));
        assert!(!table.make_closed(&alphabet, &mut cache, &mut teacher));
        assert_eq!(table.row_signature(&[]), vec![true]);
    }

    #[test]
    fn absorb_counterexample_adds_every_prefix() {
        let mut table: ObservationTable<String> = ObservationTable::new();
        let word: Word<String> = vec!["a".to_string(), "a".to_string(), "b".to_string()];
        table.absorb_counterexample(&word);
        assert!(table.rows().contains(&Vec::<String>::new()));
        assert!(table.rows().contains(&vec!["a".to_string()]));
        assert!(table.rows().contains(&vec!["a".to_string(), "a".to_string()]));
        assert!(table.rows().contains(&word));
    }
}
