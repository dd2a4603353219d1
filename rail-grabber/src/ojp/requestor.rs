//! One journey request, from session handshake to parsed journeys.

use std::future::Future;

use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{JourneyBatch, Trip};

use super::client::SessionClient;
use super::error::ClientError;
use super::parser::{ParsedPage, parse_journeys};

/// How a journey request ended.
///
/// These are the only outcomes callers ever see; parse-level problems are
/// absorbed by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The page listed at least one journey.
    JourneysFound(JourneyBatch),
    /// The page loaded but listed no journeys.
    NoJourneysFound,
    /// Transport failure not caused by cancellation.
    NetworkProblem,
    /// The caller cancelled the request.
    RequestCancelled,
}

/// Trait for fetching journeys for a trip.
///
/// This abstraction allows retrieval to be tested without the planner.
pub trait JourneySource: Send + Sync + 'static {
    /// Get journeys for `trip` departing after `at`.
    fn request_journeys(
        &self,
        trip: &Trip,
        at: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RequestOutcome> + Send;
}

/// Journey source backed by the live planner.
///
/// Callers keep at most one request in flight; the requestor does not
/// serialize concurrent calls itself.
#[derive(Debug)]
pub struct JourneyRequestor {
    client: SessionClient,
}

impl JourneyRequestor {
    /// Create a requestor using the given client.
    pub fn new(client: SessionClient) -> Self {
        Self { client }
    }

    /// Access the underlying client.
    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    async fn fetch_page(
        &self,
        trip: &Trip,
        at: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> Result<String, ClientError> {
        self.client.ensure_session(cancel).await?;
        self.client
            .plan_journeys(&trip.from, &trip.to, at, cancel)
            .await
    }
}

impl JourneySource for JourneyRequestor {
    async fn request_journeys(
        &self,
        trip: &Trip,
        at: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> RequestOutcome {
        let html = match self.fetch_page(trip, at, cancel).await {
            Ok(html) => html,
            Err(e) => return classify_failure(&e, cancel),
        };

        match parse_journeys(&html, at.date()) {
            ParsedPage::Journeys(batch) => {
                info!(%trip, %at, count = batch.len(), "journeys found");
                RequestOutcome::JourneysFound(batch)
            }
            ParsedPage::NoJourneys => {
                info!(%trip, %at, "no journeys found");
                RequestOutcome::NoJourneysFound
            }
        }
    }
}

/// Classify a failed request.
///
/// Cancellation surfaces through the same error paths as transport
/// failures, so the token is consulted before anything is called a
/// network problem.
fn classify_failure(error: &ClientError, cancel: &CancellationToken) -> RequestOutcome {
    if error.is_cancelled() || cancel.is_cancelled() {
        debug!("journey request cancelled");
        RequestOutcome::RequestCancelled
    } else {
        warn!(error = %error, "journey request failed");
        RequestOutcome::NetworkProblem
    }
}
