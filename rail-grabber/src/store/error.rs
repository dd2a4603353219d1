//! Storage error types.

use std::path::PathBuf;

/// Errors from persistent storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store file exists but could not be read
    #[error("failed to read store {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store file could not be written
    #[error("failed to write store {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store file does not hold a JSON object of stored values
    #[error("store {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Errors from trip list operations.
#[derive(Debug, thiserror::Error)]
pub enum TripError {
    /// No trip at the given position
    #[error("no trip at index {0}")]
    NoSuchTrip(usize),

    /// The trip is already in the list
    #[error("trip already exists: {0}")]
    Duplicate(String),

    /// A station name was empty
    #[error("station names must not be empty")]
    EmptyStation,

    /// The backing store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
