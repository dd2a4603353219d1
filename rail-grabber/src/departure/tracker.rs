//! Persisted next departure for the selected trip.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::domain::Journey;
use crate::signals::{DepartureSignal, Signals};
use crate::store::{KeyValueStore, StoreError};

const NEXT_DEPARTURE_TIME: &str = "NextDepartureTime";
const NEXT_DEPARTURE_SUSPECT: &str = "NextDepartureTimeSuspect";

/// Storage format of the next departure time.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Keeps the stored next departure in step with retrieved journeys.
///
/// Stored values only change, and change signals are only emitted, when the
/// new state differs from what is stored. Every report ends with
/// `UpdateFinished`, even when storing fails.
#[derive(Debug, Clone)]
pub struct NextDepartureTracker<S> {
    store: S,
    signals: Signals,
}

impl<S: KeyValueStore> NextDepartureTracker<S> {
    pub fn new(store: S, signals: Signals) -> Self {
        Self { store, signals }
    }

    /// The stored departure time and suspect flag.
    ///
    /// A missing or unreadable time is `None`. A missing flag is suspect.
    pub fn stored(&self) -> (Option<NaiveDateTime>, bool) {
        let time = self.stored_time();
        let suspect = self.store.get_bool(NEXT_DEPARTURE_SUSPECT, true);
        (time, suspect)
    }

    fn stored_time(&self) -> Option<NaiveDateTime> {
        let text = self.store.get_string(NEXT_DEPARTURE_TIME, "");
        if text.is_empty() {
            return None;
        }
        match NaiveDateTime::parse_from_str(&text, TIME_FORMAT) {
            Ok(time) => Some(time),
            Err(e) => {
                warn!(stored = %text, error = %e, "ignoring unreadable next departure time");
                None
            }
        }
    }

    /// Record the first journey departing after `now` as the next departure.
    ///
    /// With no such journey the stored time is kept but marked suspect.
    pub fn report_time_changes(
        &self,
        journeys: &[Journey],
        now: NaiveDateTime,
    ) -> Result<(), StoreError> {
        let result = self.apply_time_changes(journeys, now);
        self.finish(result)
    }

    /// Store a new suspect flag.
    pub fn report_suspect_state_changes(&self, suspect: bool) -> Result<(), StoreError> {
        let result = self.apply_suspect(suspect);
        self.finish(result)
    }

    fn apply_time_changes(
        &self,
        journeys: &[Journey],
        now: NaiveDateTime,
    ) -> Result<(), StoreError> {
        let next = journeys
            .iter()
            .map(|j| j.departure.to_datetime())
            .find(|departure| *departure > now);

        let Some(next) = next else {
            debug!("no future departure in results");
            return self.apply_suspect(true);
        };

        let (stored_time, stored_suspect) = self.stored();
        if stored_time == Some(next) && !stored_suspect {
            return Ok(());
        }

        self.store.set_bool(NEXT_DEPARTURE_SUSPECT, false)?;
        self.store
            .set_string(NEXT_DEPARTURE_TIME, &next.format(TIME_FORMAT).to_string())?;
        debug!(%next, "next departure changed");
        self.signals.emit(DepartureSignal::NextDepartureTimeChanged);
        Ok(())
    }

    fn apply_suspect(&self, suspect: bool) -> Result<(), StoreError> {
        if self.store.get_bool(NEXT_DEPARTURE_SUSPECT, true) == suspect {
            return Ok(());
        }

        self.store.set_bool(NEXT_DEPARTURE_SUSPECT, suspect)?;
        debug!(suspect, "next departure suspect flag changed");
        self.signals
            .emit(DepartureSignal::NextDepartureSuspectChanged);
        Ok(())
    }

    fn finish(&self, result: Result<(), StoreError>) -> Result<(), StoreError> {
        if let Err(e) = &result {
            warn!(error = %e, "failed to store next departure");
        }
        self.signals.emit(DepartureSignal::UpdateFinished);
        result
    }
}
