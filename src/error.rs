//! Error types of the search engine.
use thiserror::Error;

/// Errors surfaced by the engine. Ordinary outcomes (a match, or
/// no match) are never errors; they are always reported through the
/// completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FindError {
    /// A dispatched entry's callback was invoked more than once.
    #[error("callback was already called")]
    DoubleCompletion,

    /// A concurrency limit of zero.
    #[error("concurrency limit must be at least 1, got {0}")]
    InvalidLimit(usize),

    /// A limit string that is neither `unbounded` nor a positive integer.
    #[error("cannot parse concurrency limit from {0:?}")]
    ParseLimit(String),

    /// Every callback of a run was dropped before the run completed.
    #[error("search was abandoned before completing")]
    Abandoned,

    /// A blocking wait requested on the thread that drives a
    /// current-thread runtime, which would starve the search.
    #[error("cannot block inside a current-thread runtime")]
    BlockingInRuntime,
}
