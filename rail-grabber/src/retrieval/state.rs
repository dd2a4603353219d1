//! The journey retrieval state machine.
//!
//! Holds the journeys accumulated for one trip and reconciles each new
//! batch with them. Operations are synchronous and only start a request;
//! the request runs on its own task and its outcome comes back over a
//! channel, so all state is mutated by the owner alone.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::departure::NextDepartureTracker;
use crate::domain::{Clock, Journey, JourneyBatch, Trip, mark_date_changes};
use crate::ojp::{JourneySource, RequestOutcome};
use crate::store::KeyValueStore;

use super::config::RetrievalConfig;
use super::error::RetrievalError;
use super::response::JourneyResponse;

/// What the retrieval is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No request in flight.
    Idle,
    /// Fetching a fresh list for a trip.
    NewRequest,
    /// Refreshing the held list, possibly over several requests.
    Update,
    /// Fetching journeys after the last held one.
    FetchMore,
}

/// Journey retrieval for one trip at a time.
///
/// At most one request is in flight; operations issued while busy are
/// rejected with [`RetrievalError::Busy`]. Call [`next_completion`] to
/// process the outcome of the request in flight, or hand the retrieval to
/// [`spawn`] to have that done on a background task.
///
/// [`next_completion`]: JourneyRetrieval::next_completion
/// [`spawn`]: JourneyRetrieval::spawn
pub struct JourneyRetrieval<R, C, S> {
    source: Arc<R>,
    consumer: C,
    tracker: NextDepartureTracker<S>,
    clock: Arc<dyn Clock>,
    config: RetrievalConfig,

    mode: Mode,
    trip: Option<Trip>,
    accumulated: Vec<Journey>,
    update_target: usize,
    update_count: usize,
    request_date: Option<NaiveDate>,

    cancel: CancellationToken,
    completed_tx: mpsc::UnboundedSender<RequestOutcome>,
    completed_rx: mpsc::UnboundedReceiver<RequestOutcome>,
}

impl<R, C, S> JourneyRetrieval<R, C, S>
where
    R: JourneySource,
    C: JourneyResponse,
    S: KeyValueStore,
{
    pub fn new(
        source: Arc<R>,
        consumer: C,
        tracker: NextDepartureTracker<S>,
        clock: Arc<dyn Clock>,
        config: RetrievalConfig,
    ) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        Self {
            source,
            consumer,
            tracker,
            clock,
            config,
            mode: Mode::Idle,
            trip: None,
            accumulated: Vec::new(),
            update_target: 0,
            update_count: 0,
            request_date: None,
            cancel: CancellationToken::new(),
            completed_tx,
            completed_rx,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns true while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.mode != Mode::Idle
    }

    /// The trip journeys are held for.
    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    /// The accumulated journeys, in departure order.
    pub fn journeys(&self) -> &[Journey] {
        &self.accumulated
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    /// Replace the held journeys with fresh ones for `trip`.
    pub fn get_journeys(&mut self, trip: Trip) -> Result<(), RetrievalError> {
        self.ensure_idle()?;

        info!(%trip, "getting journeys");
        self.consumer.request_started(&trip);
        self.trip = Some(trip);
        self.accumulated.clear();
        self.consumer.journeys_cleared();

        self.mode = Mode::NewRequest;
        let at = self.clock.now() + self.config.request_lead();
        self.issue(at);
        Ok(())
    }

    /// Refresh the held journeys without clearing them first.
    ///
    /// Requests continue until at least as many journeys are held as
    /// before the update.
    pub fn update_journeys(&mut self) -> Result<(), RetrievalError> {
        self.ensure_idle()?;
        let trip = self.ensure_trip()?.clone();
        self.consumer.request_started(&trip);

        self.update_target = self.accumulated.len();
        self.update_count = 0;
        debug!(update_target = self.update_target, "updating journeys");

        self.mode = Mode::Update;
        let at = self.clock.now() + self.config.request_lead();
        self.issue(at);
        Ok(())
    }

    /// Fetch the journeys following the last held one.
    ///
    /// With nothing held, or once the last held journey has departed, this
    /// is the same as getting journeys afresh.
    pub fn more_journeys(&mut self) -> Result<(), RetrievalError> {
        self.ensure_idle()?;
        let trip = self.ensure_trip()?.clone();

        let now = self.clock.now();
        let last = self.accumulated.last().map(|j| j.departure.to_datetime());

        match last {
            Some(last) if last > now => {
                debug!(%last, "fetching more journeys");
                self.consumer.request_started(&trip);
                self.mode = Mode::FetchMore;
                self.issue(last + self.config.request_lead());
                Ok(())
            }
            _ => {
                debug!("no future journeys held, getting journeys afresh");
                self.get_journeys(trip)
            }
        }
    }

    /// Cancel the request in flight, if any.
    ///
    /// The retrieval stays busy until the cancelled outcome is processed.
    pub fn cancel_request(&self) {
        if self.is_busy() {
            debug!(mode = ?self.mode, "cancelling journey request");
        }
        self.cancel.cancel();
    }

    /// Wait for the request in flight and process its outcome.
    ///
    /// Returns false at once if nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        match self.completed_rx.recv().await {
            Some(outcome) => {
                self.complete(outcome);
                true
            }
            None => false,
        }
    }

    /// Wait for the outcome of the request in flight.
    pub(super) async fn recv_outcome(&mut self) -> Option<RequestOutcome> {
        self.completed_rx.recv().await
    }

    /// Process the outcome of the request in flight.
    pub(super) fn complete(&mut self, outcome: RequestOutcome) {
        if !self.is_busy() {
            warn!(?outcome, "ignoring outcome with no request in flight");
            return;
        }

        match outcome {
            RequestOutcome::JourneysFound(batch) => self.journeys_found(batch),
            RequestOutcome::NoJourneysFound => {
                info!("no journeys found");
                self.accumulated.clear();
                self.consumer.journeys_cleared();
                self.mark_suspect();
                self.finish(false, true);
            }
            RequestOutcome::NetworkProblem => {
                info!("journey request failed, keeping held journeys");
                self.mark_suspect();
                self.finish(true, false);
            }
            RequestOutcome::RequestCancelled => {
                debug!("journey request cancelled");
                self.finish(false, false);
            }
        }
    }

    fn journeys_found(&mut self, batch: JourneyBatch) {
        if self.mode == Mode::NewRequest || (self.mode == Mode::Update && self.update_count == 0) {
            self.accumulated.clear();
        }

        let added = self.merge(batch.journeys);

        match self.mode {
            Mode::Update => {
                self.consumer.journeys_available(&self.accumulated);
                self.update_count = self.accumulated.len();

                if self.update_count >= self.update_target || added == 0 {
                    self.finish(false, false);
                    return;
                }

                // Cancelled after this page arrived; the token is replaced on issue
                if self.cancel.is_cancelled() {
                    debug!(count = self.update_count, "update cancelled between pages");
                    self.finish(false, false);
                    return;
                }

                let Some(last) = self.accumulated.last().map(|j| j.departure.to_datetime()) else {
                    self.finish(false, false);
                    return;
                };
                debug!(
                    count = self.update_count,
                    update_target = self.update_target,
                    "update short of target, requesting next page"
                );
                self.issue(last + self.config.request_lead());
            }
            Mode::NewRequest | Mode::FetchMore => {
                self.consumer.journeys_available(&self.accumulated);
                // Failures are logged by the tracker
                let _ = self
                    .tracker
                    .report_time_changes(&self.accumulated, self.clock.now());
                self.finish(false, false);
            }
            Mode::Idle => {}
        }
    }

    /// Append `journeys` to the held list, returning how many were added.
    ///
    /// A batch that starts with the last held departure repeats the page
    /// boundary, so that entry is dropped.
    fn merge(&mut self, mut journeys: Vec<Journey>) -> usize {
        if let (Some(last), Some(first)) = (self.accumulated.last(), journeys.first())
            && last.departure == first.departure
        {
            debug!(departure = %first.departure, "dropping repeated boundary journey");
            journeys.remove(0);
        }

        let base = self
            .accumulated
            .last()
            .map(|j| j.departure.date())
            .or(self.request_date);
        if let Some(base) = base {
            mark_date_changes(&mut journeys, base);
        }

        let added = journeys.len();
        self.accumulated.extend(journeys);
        added
    }

    fn mark_suspect(&self) {
        // Failures are logged by the tracker
        let _ = self.tracker.report_suspect_state_changes(true);
    }

    fn finish(&mut self, network_problem: bool, no_journeys_found: bool) {
        debug!(mode = ?self.mode, network_problem, no_journeys_found, "journey request complete");
        self.mode = Mode::Idle;
        self.consumer
            .journey_request_complete(network_problem, no_journeys_found);
    }

    /// Start a request for the current trip anchored at `at`.
    fn issue(&mut self, at: NaiveDateTime) {
        let Some(trip) = self.trip.clone() else {
            self.finish(false, false);
            return;
        };

        self.request_date = Some(at.date());
        self.cancel = CancellationToken::new();

        let source = Arc::clone(&self.source);
        let cancel = self.cancel.clone();
        let completed = self.completed_tx.clone();

        debug!(%trip, %at, mode = ?self.mode, "issuing journey request");
        tokio::spawn(async move {
            let outcome = source.request_journeys(&trip, at, &cancel).await;
            // The receiver lives as long as the retrieval
            let _ = completed.send(outcome);
        });
    }

    fn ensure_idle(&self) -> Result<(), RetrievalError> {
        if self.is_busy() {
            return Err(RetrievalError::Busy);
        }
        Ok(())
    }

    fn ensure_trip(&self) -> Result<&Trip, RetrievalError> {
        self.trip.as_ref().ok_or(RetrievalError::NoTrip)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
