//! Journey planner HTTP client.
//!
//! The planner only answers plan requests that carry a session cookie, and
//! the cookie is handed out by its search page. The client keeps a cookie
//! jar, remembers when it last fetched the search page, and repeats the
//! handshake once the session is older than the validity window.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, Timelike};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::ClientError;

/// Default base URL of the journey planner.
const DEFAULT_BASE_URL: &str = "http://ojp.nationalrail.co.uk/service/planjourney";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Sessions are issued for ten minutes; renew slightly early.
const DEFAULT_SESSION_VALIDITY: Duration = Duration::from_secs(9 * 60 + 30);

/// Configuration for the planner client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Search page, fetched only for its session cookie
    pub search_url: String,
    /// Plan endpoint the journey form is posted to
    pub plan_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// How long a session cookie is trusted
    pub session_validity: Duration,
}

impl ClientConfig {
    /// Create a config pointing at the public planner.
    pub fn new() -> Self {
        Self::default().with_base_url(DEFAULT_BASE_URL)
    }

    /// Point both endpoints at a different host (for testing).
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        let base = base_url.as_ref().trim_end_matches('/');
        self.search_url = format!("{base}/search");
        self.plan_url = format!("{base}/plan");
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set how long a session is reused before a new handshake.
    pub fn with_session_validity(mut self, validity: Duration) -> Self {
        self.session_validity = validity;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            search_url: format!("{DEFAULT_BASE_URL}/search"),
            plan_url: format!("{DEFAULT_BASE_URL}/plan"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_validity: DEFAULT_SESSION_VALIDITY,
        }
    }
}

/// Cookie-holding client for the journey planner.
///
/// Never retries. Transport failures and cancellation are returned to the
/// caller as distinct errors.
#[derive(Debug)]
pub struct SessionClient {
    http: reqwest::Client,
    search_url: String,
    plan_url: String,
    session_validity: Duration,
    last_handshake: Mutex<Option<Instant>>,
}

impl SessionClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            search_url: config.search_url,
            plan_url: config.plan_url,
            session_validity: config.session_validity,
            last_handshake: Mutex::new(None),
        })
    }

    /// Returns true if the last handshake is recent enough to reuse.
    pub fn session_valid(&self) -> bool {
        self.last_handshake
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some_and(|at| at.elapsed() < self.session_validity)
    }

    /// Forget the current session so the next request performs a handshake.
    pub fn invalidate_session(&self) {
        *self.last_handshake.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Fetch the search page if the session has expired.
    ///
    /// The page body is discarded; only the cookie it sets matters.
    pub async fn ensure_session(&self, cancel: &CancellationToken) -> Result<(), ClientError> {
        if self.session_valid() {
            return Ok(());
        }

        debug!(url = %self.search_url, "requesting new planner session");

        cancellable(cancel, async {
            let response = self.http.get(&self.search_url).send().await?;
            debug!(status = %response.status(), "planner session handshake");
            response.bytes().await?;
            Ok(())
        })
        .await?;

        *self.last_handshake.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        Ok(())
    }

    /// Post a journey search and return the raw results page.
    ///
    /// # Arguments
    ///
    /// * `from` - Departure station name
    /// * `to` - Destination station name
    /// * `at` - Earliest departure to search from
    /// * `cancel` - Aborts the request when triggered
    pub async fn plan_journeys(
        &self,
        from: &str,
        to: &str,
        at: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> Result<String, ClientError> {
        let form = plan_form(from, to, at);
        debug!(url = %self.plan_url, %from, %to, %at, "posting journey plan request");

        cancellable(cancel, async {
            let response = self.http.post(&self.plan_url).form(&form).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ClientError::Status {
                    status: status.as_u16(),
                    url: self.plan_url.clone(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }
}

/// Build the plan form for a departure-time search.
///
/// Station names are left raw; form encoding turns their spaces into `+`.
pub(crate) fn plan_form(from: &str, to: &str, at: NaiveDateTime) -> Vec<(&'static str, String)> {
    vec![
        ("commandName", "journeyPlannerCommand".to_string()),
        ("from.searchTerm", from.to_string()),
        ("timeOfOutwardJourney.arrivalOrDeparture", "DEPART".to_string()),
        ("timeOfOutwardJourney.hour", at.hour().to_string()),
        ("timeOfOutwardJourney.minute", at.minute().to_string()),
        (
            "timeOfOutwardJourney.monthDay",
            at.format("%d/%m/%y").to_string(),
        ),
        ("to.searchTerm", to.to_string()),
    ]
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ojp::test_server::TestServer;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = ClientConfig::new();

        assert_eq!(config.search_url, format!("{DEFAULT_BASE_URL}/search"));
        assert_eq!(config.plan_url, format!("{DEFAULT_BASE_URL}/plan"));
        assert_eq!(config.timeout_secs, 20);
        assert_eq!(config.session_validity, Duration::from_secs(570));
    }

    #[test]
    fn config_builder() {
        let config = ClientConfig::new()
            .with_base_url("http://localhost:8080/")
            .with_timeout(5)
            .with_session_validity(Duration::from_secs(60));

        assert_eq!(config.search_url, "http://localhost:8080/search");
        assert_eq!(config.plan_url, "http://localhost:8080/plan");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.session_validity, Duration::from_secs(60));
    }

    #[test]
    fn plan_form_fields() {
        let form = plan_form("London Kings Cross", "Cambridge", at(7, 5));
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("commandName"), "journeyPlannerCommand");
        assert_eq!(get("timeOfOutwardJourney.arrivalOrDeparture"), "DEPART");
        assert_eq!(get("timeOfOutwardJourney.hour"), "7");
        assert_eq!(get("timeOfOutwardJourney.minute"), "5");
        assert_eq!(get("timeOfOutwardJourney.monthDay"), "05/03/24");
        assert_eq!(get("from.searchTerm"), "London Kings Cross");
        assert_eq!(get("to.searchTerm"), "Cambridge");
    }

    #[test]
    fn new_client_has_no_session() {
        let client = SessionClient::new(ClientConfig::new()).unwrap();
        assert!(!client.session_valid());
    }

    #[tokio::test]
    async fn handshake_once_then_reuse_session() {
        let server = TestServer::start("<html></html>").await;
        let client = SessionClient::new(ClientConfig::new().with_base_url(server.base_url())).unwrap();
        let cancel = CancellationToken::new();

        client.ensure_session(&cancel).await.unwrap();
        assert!(client.session_valid());
        client.ensure_session(&cancel).await.unwrap();

        assert_eq!(server.count_requests("GET /search"), 1);
    }

    #[tokio::test]
    async fn expired_session_repeats_handshake() {
        let server = TestServer::start("<html></html>").await;
        let config = ClientConfig::new()
            .with_base_url(server.base_url())
            .with_session_validity(Duration::ZERO);
        let client = SessionClient::new(config).unwrap();
        let cancel = CancellationToken::new();

        client.ensure_session(&cancel).await.unwrap();
        client.ensure_session(&cancel).await.unwrap();

        assert_eq!(server.count_requests("GET /search"), 2);
    }

    #[tokio::test]
    async fn plan_posts_form_with_session_cookie() {
        let server = TestServer::start("<table></table>").await;
        let client = SessionClient::new(ClientConfig::new().with_base_url(server.base_url())).unwrap();
        let cancel = CancellationToken::new();

        client.ensure_session(&cancel).await.unwrap();
        let body = client
            .plan_journeys("Bath Spa", "Bristol", at(18, 45), &cancel)
            .await
            .unwrap();

        assert_eq!(body, "<table></table>");

        let post = server.find_request("POST /plan").unwrap().to_lowercase();
        assert!(post.contains("cookie: jsessionid=test-session"));
        assert!(post.contains("commandname=journeyplannercommand"));
        assert!(post.contains("timeofoutwardjourney.hour=18"));
        assert!(post.contains("timeofoutwardjourney.minute=45"));
        assert!(post.contains("from.searchterm=bath+spa"));
        assert!(post.contains("to.searchterm=bristol"));
    }

    #[tokio::test]
    async fn cancelled_before_send() {
        let server = TestServer::start("<html></html>").await;
        let client = SessionClient::new(ClientConfig::new().with_base_url(server.base_url())).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.plan_journeys("A", "B", at(9, 0), &cancel).await;

        assert!(matches!(result, Err(ClientError::Cancelled)));
    }
}
