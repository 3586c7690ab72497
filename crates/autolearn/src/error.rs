use std::fmt::Debug;

/// The error taxonomy of the learning engine.
///
/// Every variant corresponds to one row of the error-handling table: most
/// are recovered internally (logged and skipped), the rest are fatal and
/// propagate out of the main learning loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AutolearnError {
    /// The teacher returned two different answers for the same word within
    /// a single run. Fatal: the membership cache is supposed to be
    /// authoritative.
    #[error("teacher returned contradictory answers for {word:?}: cached {cached}, now {now}")]
    TeacherInconsistent { word: String, cached: bool, now: bool },

    /// A stratified closure/consistency step requested a level outside the
    /// currently known range `[0, t]` from the interior of the table rather
    /// than at a boundary. A boundary step is simply skipped; this variant
    /// indicates a table invariant has been broken.
    #[error("stratified step required level {requested}, outside known range [0, {known_max}]")]
    OutOfRangeStep { requested: i64, known_max: usize },

    /// A supposed counter-example's membership does not actually disagree
    /// with the hypothesis being refuted. Non-fatal: logged and ignored, the
    /// main loop retries.
    #[error("counter-example {word:?} does not actually disagree with the hypothesis")]
    MalformedCounterExample { word: String },

    /// The periodicity detector exhausted every candidate pairing without
    /// finding an isomorphism. Non-fatal: the caller gets the unlooped
    /// behaviour graph back and may enlarge `t`.
    #[error("no isomorphic stratum pair found for offset {m} and period {k}")]
    IsomorphismBacktrackExhausted { m: usize, k: usize },

    /// A word contains a symbol absent from the weight map. Fatal
    /// configuration error.
    #[error("symbol {symbol:?} has no assigned weight")]
    WeightUndefined { symbol: String },
}

pub type Result<T> = std::result::Result<T, AutolearnError>;
