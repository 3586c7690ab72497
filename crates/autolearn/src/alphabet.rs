use std::fmt::{Debug, Display};
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use crate::error::AutolearnError;

/// Bound satisfied by every alphabet symbol type used across the crate.
pub trait Symbol: Eq + Hash + Clone + Debug + Display + Ord {}
impl<T: Eq + Hash + Clone + Debug + Display + Ord> Symbol for T {}

/// An integer weight assigned to a symbol by the weight map `χ`.
pub type Weight = i8;

/// A word over some alphabet, represented as a plain vector of symbols.
/// The empty word `ε` is simply the empty vector — no sentinel element.
pub type Word<T> = Vec<T>;

/// A finite symbol set, with an iteration order fixed at insertion time so
/// that "first witness in iteration order" tie-breaks (closure/consistency,
/// periodicity search) are well-defined.
#[derive(Debug, Clone)]
pub struct Alphabet<T: Symbol> {
    symbols: IndexSet<T>,
    weights: Option<IndexMap<T, Weight>>,
}

impl<T: Symbol> Alphabet<T> {
    /// Builds a plain alphabet with no weight map, for the regular (L\*)
    /// learner.
    pub fn new(symbols: impl IntoIterator<Item = T>) -> Self {
        Alphabet {
            symbols: symbols.into_iter().collect(),
            weights: None,
        }
    }

    /// Builds an alphabet paired with a weight map `χ: Σ → {-1, 0, +1}`,
    /// for the one-counter learner. Every symbol must be present in
    /// `weights`.
    pub fn weighted(weights: impl IntoIterator<Item = (T, Weight)>) -> Self {
        let weights: IndexMap<T, Weight> = weights.into_iter().collect();
        Alphabet {
            symbols: weights.keys().cloned().collect(),
            weights: Some(weights),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &T> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &T) -> bool {
        self.symbols.contains(symbol)
    }

    /// The weight `χ(a)` of a single symbol.
    pub fn weight(&self, symbol: &T) -> Result<Weight, AutolearnError> {
        match &self.weights {
            Some(weights) => weights
                .get(symbol)
                .copied()
                .ok_or_else(|| AutolearnError::WeightUndefined {
                    symbol: symbol.to_string(),
                }),
            None => Ok(0),
        }
    }

    /// `cv(w) = Σ χ(a)` over the symbols of `w`. `cv(ε) = 0`.
    pub fn cv(&self, word: &[T]) -> Result<i64, AutolearnError> {
        let mut total = 0i64;
        for symbol in word {
            total += self.weight(symbol)? as i64;
        }
        Ok(total)
    }

    /// `cv` of every proper, non-empty prefix of `word`, in order, including
    /// the full word itself.
    pub fn prefix_cvs(&self, word: &[T]) -> Result<Vec<i64>, AutolearnError> {
        let mut acc = 0i64;
        let mut out = Vec::with_capacity(word.len());
        for symbol in word {
            acc += self.weight(symbol)? as i64;
            out.push(acc);
        }
        Ok(out)
    }
}
