//! Journey retrieval for the selected trip.
//!
//! Holds the journeys shown for a trip and supports four operations:
//! - get: replace the list with journeys from a minute from now
//! - update: refresh the list, keeping it until new results arrive
//! - more: append the journeys after the last one held
//! - cancel: abandon the request in flight
//!
//! The planner has no paging, so "more" and multi-page updates re-anchor
//! the search a minute after the last held departure and drop the repeated
//! boundary journey.

mod config;
mod error;
mod handle;
mod response;
mod state;

pub use config::RetrievalConfig;
pub use error::RetrievalError;
pub use handle::RetrievalHandle;
pub use response::JourneyResponse;
pub use state::{JourneyRetrieval, Mode};
