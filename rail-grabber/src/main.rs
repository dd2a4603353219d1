use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rail_grabber::departure::{NextDepartureRefresh, NextDepartureTracker};
use rail_grabber::domain::{Clock, SystemClock};
use rail_grabber::ojp::{ClientConfig, JourneyRequestor, SessionClient};
use rail_grabber::retrieval::{JourneyRetrieval, RetrievalConfig};
use rail_grabber::signals::Signals;
use rail_grabber::store::{FileStore, TripStore};
use rail_grabber::web::{AppState, JourneyView, create_router};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_STORE_PATH: &str = "rail_grabber_store.json";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_REFRESH_SECS: u64 = 60;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rail_grabber=info")),
        )
        .init();

    // Configuration from environment
    let store_path =
        std::env::var("RAIL_GRABBER_STORE").unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string());
    let addr: SocketAddr = std::env::var("RAIL_GRABBER_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .expect("RAIL_GRABBER_ADDR must be a socket address");
    let refresh_period = std::env::var("RAIL_GRABBER_REFRESH_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_REFRESH_SECS));
    let client_config = match std::env::var("RAIL_GRABBER_BASE_URL") {
        Ok(base_url) => ClientConfig::new().with_base_url(base_url),
        Err(_) => ClientConfig::new(),
    };

    // Persistent state
    let store = FileStore::open(&store_path).expect("Failed to open store");
    info!(path = %store_path, "opened store");
    let signals = Signals::new();
    let trips = TripStore::load(store.clone(), signals.clone()).expect("Failed to load trips");
    let tracker = NextDepartureTracker::new(store, signals.clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let retrieval_config = RetrievalConfig::default();

    // Journey retrieval for the web client
    let requestor = JourneyRequestor::new(
        SessionClient::new(client_config.clone()).expect("Failed to create planner client"),
    );
    let view = JourneyView::new(Arc::clone(&clock));
    let retrieval = JourneyRetrieval::new(
        Arc::new(requestor),
        view.clone(),
        tracker.clone(),
        Arc::clone(&clock),
        retrieval_config.clone(),
    )
    .spawn();

    // Background next-departure refresh, with its own planner session
    let refresh_requestor = JourneyRequestor::new(
        SessionClient::new(client_config).expect("Failed to create planner client"),
    );
    let refresh = NextDepartureRefresh::new(
        Arc::new(refresh_requestor),
        tracker.clone(),
        signals.clone(),
        Arc::clone(&clock),
        retrieval_config,
    );
    let refresh_trips = trips.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_period);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            let Some(trip) = refresh_trips.current_trip() else {
                continue;
            };
            if let Err(e) = refresh.refresh(&trip).await {
                warn!(error = %e, "next departure refresh failed");
            }
        }
    });

    // Log change signals
    let mut signal_rx = signals.subscribe();
    tokio::spawn(async move {
        loop {
            match signal_rx.recv().await {
                Ok(signal) => debug!(?signal, "departure signal"),
                Err(RecvError::Lagged(missed)) => debug!(missed, "departure signals missed"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let state = AppState::new(trips, retrieval, view, tracker, clock);
    let app = create_router(state);

    info!(%addr, "rail grabber listening");
    info!("  GET    /health            - Health check");
    info!("  GET    /trips             - List trips");
    info!("  POST   /trips             - Add a trip");
    info!("  POST   /trips/select      - Select a trip");
    info!("  DELETE /trips/:index      - Remove a trip");
    info!("  GET    /journeys          - Journeys for the selected trip");
    info!("  POST   /journeys          - Get journeys");
    info!("  POST   /journeys/update   - Update journeys");
    info!("  POST   /journeys/more     - More journeys");
    info!("  POST   /journeys/cancel   - Cancel the request in flight");
    info!("  GET    /departure         - Stored next departure");
    info!("  GET    /stations/recent   - Recently used stations");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
