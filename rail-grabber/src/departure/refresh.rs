//! Background refresh of the next departure.
//!
//! A lighter sibling of journey retrieval: one request per refresh, no
//! accumulated list, only the stored next departure is updated.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{Clock, Trip, mark_date_changes};
use crate::ojp::{JourneySource, RequestOutcome};
use crate::retrieval::RetrievalConfig;
use crate::signals::{DepartureSignal, Signals};
use crate::store::{KeyValueStore, StoreError};

use super::tracker::NextDepartureTracker;

/// Refreshes the stored next departure for a trip.
pub struct NextDepartureRefresh<R, S> {
    source: Arc<R>,
    tracker: NextDepartureTracker<S>,
    signals: Signals,
    clock: Arc<dyn Clock>,
    config: RetrievalConfig,
    cancel: Mutex<CancellationToken>,
}

impl<R: JourneySource, S: KeyValueStore> NextDepartureRefresh<R, S> {
    pub fn new(
        source: Arc<R>,
        tracker: NextDepartureTracker<S>,
        signals: Signals,
        clock: Arc<dyn Clock>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            source,
            tracker,
            signals,
            clock,
            config,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Request the next journeys for `trip` and record the next departure.
    ///
    /// No journeys or a network problem marks the stored departure suspect.
    /// A cancelled refresh leaves it alone.
    pub async fn refresh(&self, trip: &Trip) -> Result<RequestOutcome, StoreError> {
        let cancel = CancellationToken::new();
        *self.lock_cancel() = cancel.clone();

        self.signals.emit(DepartureSignal::UpdateInProgress);

        let at = self.clock.now() + self.config.request_lead();
        let request_date = at.date();
        debug!(%trip, %at, "refreshing next departure");

        let outcome = self.source.request_journeys(trip, at, &cancel).await;

        match &outcome {
            RequestOutcome::JourneysFound(batch) => {
                let mut journeys = batch.journeys.clone();
                mark_date_changes(&mut journeys, request_date);
                self.tracker
                    .report_time_changes(&journeys, self.clock.now())?;
            }
            RequestOutcome::NoJourneysFound | RequestOutcome::NetworkProblem => {
                self.tracker.report_suspect_state_changes(true)?;
            }
            RequestOutcome::RequestCancelled => {
                info!(%trip, "next departure refresh cancelled");
                self.signals.emit(DepartureSignal::UpdateFinished);
            }
        }

        Ok(outcome)
    }

    /// Cancel the refresh in flight, if any.
    pub fn cancel(&self) {
        self.lock_cancel().cancel();
    }

    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner())
    }
}
