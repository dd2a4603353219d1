//! Application state for the web layer.

use std::sync::Arc;

use crate::departure::NextDepartureTracker;
use crate::domain::Clock;
use crate::retrieval::RetrievalHandle;
use crate::store::TripStore;

use super::view::JourneyView;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState<S> {
    /// The user's trips and selection
    pub trips: TripStore<S>,

    /// Journey retrieval for the selected trip
    pub retrieval: RetrievalHandle,

    /// The journey list as last reported by retrieval
    pub view: JourneyView,

    /// Stored next departure
    pub departure: NextDepartureTracker<S>,

    /// Source of "now" for freshness messages
    pub clock: Arc<dyn Clock>,
}

impl<S> AppState<S> {
    /// Create a new app state.
    pub fn new(
        trips: TripStore<S>,
        retrieval: RetrievalHandle,
        view: JourneyView,
        departure: NextDepartureTracker<S>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            trips,
            retrieval,
            view,
            departure,
            clock,
        }
    }
}
