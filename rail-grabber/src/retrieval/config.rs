//! Retrieval configuration.

use chrono::Duration;

/// Configuration parameters for journey retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Minutes added to "now", or to the last known departure, when
    /// anchoring a request.
    pub request_lead_mins: i64,
}

impl RetrievalConfig {
    /// Create a new configuration with the given request lead.
    pub fn new(request_lead_mins: i64) -> Self {
        Self { request_lead_mins }
    }

    /// Returns the request lead as a Duration.
    pub fn request_lead(&self) -> Duration {
        Duration::minutes(self.request_lead_mins)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            request_lead_mins: 1,
        }
    }
}
