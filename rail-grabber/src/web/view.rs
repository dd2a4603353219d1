//! The journey list as the web client sees it.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;

use crate::domain::{Clock, Journey, Trip};
use crate::retrieval::JourneyResponse;

/// A user-facing notice about the last request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoJourneysFound,
    NetworkProblem,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::NoJourneysFound => "No journeys found",
            Notice::NetworkProblem => "Network problem, check network settings",
        }
    }
}

/// A copy of the view's state at one moment.
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    /// Trip of the most recent request
    pub trip: Option<Trip>,
    pub journeys: Vec<Journey>,
    pub in_progress: bool,
    pub notice: Option<Notice>,
    pub last_update: Option<NaiveDateTime>,
}

/// Retrieval consumer backing the journey endpoints.
///
/// One clone is handed to the retrieval as its consumer; the web handlers
/// read snapshots through another.
#[derive(Clone)]
pub struct JourneyView {
    state: Arc<Mutex<ViewSnapshot>>,
    clock: Arc<dyn Clock>,
}

impl JourneyView {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewSnapshot::default())),
            clock,
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ViewSnapshot> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl JourneyResponse for JourneyView {
    fn request_started(&mut self, trip: &Trip) {
        let mut state = self.lock();
        state.trip = Some(trip.clone());
        state.in_progress = true;
        state.notice = None;
    }

    fn journeys_cleared(&mut self) {
        let mut state = self.lock();
        state.journeys.clear();
        state.last_update = None;
    }

    fn journeys_available(&mut self, journeys: &[Journey]) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.journeys = journeys.to_vec();
        state.last_update = Some(now);
    }

    fn journey_request_complete(&mut self, network_problem: bool, no_journeys_found: bool) {
        let mut state = self.lock();
        state.in_progress = false;
        state.notice = if network_problem {
            Some(Notice::NetworkProblem)
        } else if no_journeys_found {
            Some(Notice::NoJourneysFound)
        } else {
            None
        };
    }
}
