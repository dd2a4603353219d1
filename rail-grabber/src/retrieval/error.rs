//! Retrieval error types.

/// Errors returned when a retrieval operation cannot be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    /// A request is already in flight
    #[error("a journey request is already in progress")]
    Busy,

    /// Update or more was asked for before any trip was requested
    #[error("no trip has been requested")]
    NoTrip,

    /// The retrieval task has stopped
    #[error("journey retrieval has stopped")]
    Closed,
}
