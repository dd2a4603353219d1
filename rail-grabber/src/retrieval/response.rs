//! Callbacks from journey retrieval to its consumer.

use crate::domain::{Journey, Trip};

/// Receives the results of journey retrieval.
///
/// A retrieval owns exactly one consumer. Calls arrive on the retrieval's
/// own task, in the order the events happen.
pub trait JourneyResponse: Send + 'static {
    /// A get, update or more operation for `trip` was accepted.
    fn request_started(&mut self, _trip: &Trip) {}

    /// The held journeys were discarded.
    fn journeys_cleared(&mut self);

    /// The held journeys changed; `journeys` is the full current list.
    fn journeys_available(&mut self, journeys: &[Journey]);

    /// The operation finished.
    ///
    /// Both flags are false after success or cancellation.
    fn journey_request_complete(&mut self, network_problem: bool, no_journeys_found: bool);
}
