//! Journey planner client error types.

/// Errors from the journey planner HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body read, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The planner answered with a non-success status code
    #[error("planner returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// The caller cancelled the request
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Returns true if the error came from explicit cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}
