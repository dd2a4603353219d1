//! Test doubles shared across modules.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tokio_util::sync::CancellationToken;

use crate::domain::{Clock, Journey, JourneyBatch, RailTime, Trip};
use crate::ojp::{JourneySource, RequestOutcome};

/// A scripted reply from [`MockJourneySource`].
#[derive(Debug)]
pub(crate) enum Scripted {
    /// Return this outcome at once.
    Respond(RequestOutcome),
    /// Stay in flight until cancelled.
    Hang,
}

/// Journey source that replays scripted outcomes and records every request.
///
/// Requests beyond the script fail as network problems.
#[derive(Debug, Default)]
pub(crate) struct MockJourneySource {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(Trip, NaiveDateTime)>>,
}

impl MockJourneySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, outcome: RequestOutcome) -> &Self {
        self.script.lock().unwrap().push_back(Scripted::Respond(outcome));
        self
    }

    pub(crate) fn hang(&self) -> &Self {
        self.script.lock().unwrap().push_back(Scripted::Hang);
        self
    }

    /// Request anchors in the order requests were made.
    pub(crate) fn anchors(&self) -> Vec<NaiveDateTime> {
        self.requests.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub(crate) fn trips(&self) -> Vec<Trip> {
        self.requests.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl JourneySource for MockJourneySource {
    async fn request_journeys(
        &self,
        trip: &Trip,
        at: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> RequestOutcome {
        self.requests.lock().unwrap().push((trip.clone(), at));
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Scripted::Respond(outcome)) => outcome,
            Some(Scripted::Hang) => {
                cancel.cancelled().await;
                RequestOutcome::RequestCancelled
            }
            None => RequestOutcome::NetworkProblem,
        }
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub(crate) struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub(crate) fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn datetime(date: NaiveDate, hhmm: &str) -> NaiveDateTime {
    RailTime::parse_hhmm(hhmm, date).unwrap().to_datetime()
}

/// A direct journey departing at `hhmm` on `date`.
pub(crate) fn journey(date: NaiveDate, hhmm: &str) -> Journey {
    Journey {
        departure: RailTime::parse_hhmm(hhmm, date).unwrap(),
        departure_time: hhmm.to_string(),
        arrival_time: String::new(),
        duration: String::new(),
        status: "On time".to_string(),
        date_change: false,
        legs: vec![],
    }
}

/// A found outcome holding journeys at the given times on `date`.
pub(crate) fn found(date: NaiveDate, times: &[&str]) -> RequestOutcome {
    let journeys = times.iter().map(|t| journey(date, t)).collect();
    RequestOutcome::JourneysFound(JourneyBatch::new(journeys, date))
}
