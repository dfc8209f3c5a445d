//! Error types for causa.

use thiserror::Error;

/// Errors raised by graph mutation, knowledge setup, statistics and searches.
///
/// This enum is marked `#[non_exhaustive]` so new variants can be added
/// without breaking downstream matches.
///
/// Per-resample failures during resampling never surface through this type
/// directly; they are caught, logged and counted (see
/// [`ResamplingResult::dropped`](crate::resampling::ResamplingResult::dropped)).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CausalError {
    /// Malformed input: self-loops, unknown nodes, illegal variable names,
    /// contradictory knowledge rules.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A mutation the receiving structure does not allow (for example adding
    /// an ordinary directed edge to a knowledge graph view).
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Undefined numerical results (NaN p-values, singular regressions).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// A search could not complete.
    #[error("search error: {0}")]
    Search(String),

    /// Internal invariant violation (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}

impl CausalError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CausalError::InvalidArgument(msg.into())
    }
}
