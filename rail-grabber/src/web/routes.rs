//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tracing::warn;

use crate::domain::Trip;
use crate::retrieval::RetrievalError;
use crate::store::{KeyValueStore, TripError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S: KeyValueStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trips", get(list_trips::<S>).post(add_trip::<S>))
        .route("/trips/select", post(select_trip::<S>))
        .route("/trips/:index", delete(remove_trip::<S>))
        .route("/journeys", get(list_journeys::<S>).post(get_journeys::<S>))
        .route("/journeys/update", post(update_journeys::<S>))
        .route("/journeys/more", post(more_journeys::<S>))
        .route("/journeys/cancel", post(cancel_request::<S>))
        .route("/departure", get(next_departure::<S>))
        .route("/stations/recent", get(recent_stations::<S>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn list_trips<S: KeyValueStore>(State(state): State<AppState<S>>) -> Json<TripsResponse> {
    Json(trips_response(&state))
}

async fn add_trip<S: KeyValueStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<AddTripRequest>,
) -> Result<(StatusCode, Json<TripsResponse>), AppError> {
    state.trips.add(req.into_trip())?;
    Ok((StatusCode::CREATED, Json(trips_response(&state))))
}

async fn select_trip<S: KeyValueStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<SelectTripRequest>,
) -> Result<Json<TripsResponse>, AppError> {
    state.trips.select(req.index)?;
    Ok(Json(trips_response(&state)))
}

async fn remove_trip<S: KeyValueStore>(
    State(state): State<AppState<S>>,
    Path(index): Path<usize>,
) -> Result<Json<TripsResponse>, AppError> {
    state.trips.remove(index)?;
    Ok(Json(trips_response(&state)))
}

fn trips_response<S: KeyValueStore>(state: &AppState<S>) -> TripsResponse {
    TripsResponse::new(&state.trips.trips(), state.trips.selected())
}

async fn list_journeys<S: KeyValueStore>(
    State(state): State<AppState<S>>,
) -> Json<JourneysResponse> {
    Json(journeys_response(&state))
}

/// Get fresh journeys for the selected trip.
async fn get_journeys<S: KeyValueStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, AppError> {
    let trip = selected_trip(&state)?;
    state.retrieval.get_journeys(trip).await?;
    Ok(accepted(&state))
}

/// Refresh the journey list.
///
/// If the selected trip has changed since the list was fetched, the list
/// is fetched afresh instead.
async fn update_journeys<S: KeyValueStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, AppError> {
    let trip = selected_trip(&state)?;
    if state.view.snapshot().trip.as_ref() == Some(&trip) {
        state.retrieval.update_journeys().await?;
    } else {
        state.retrieval.get_journeys(trip).await?;
    }
    Ok(accepted(&state))
}

/// Fetch journeys after the last one listed.
async fn more_journeys<S: KeyValueStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, AppError> {
    let trip = selected_trip(&state)?;
    if state.view.snapshot().trip.as_ref() == Some(&trip) {
        state.retrieval.more_journeys().await?;
    } else {
        state.retrieval.get_journeys(trip).await?;
    }
    Ok(accepted(&state))
}

async fn cancel_request<S: KeyValueStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, AppError> {
    state.retrieval.cancel_request().await?;
    Ok(accepted(&state))
}

async fn next_departure<S: KeyValueStore>(
    State(state): State<AppState<S>>,
) -> Json<DepartureResponse> {
    let (time, suspect) = state.departure.stored();
    Json(DepartureResponse {
        time: time.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
        suspect,
    })
}

async fn recent_stations<S: KeyValueStore>(
    State(state): State<AppState<S>>,
) -> Json<RecentStationsResponse> {
    Json(RecentStationsResponse {
        stations: state.trips.recent_stations(),
    })
}

fn selected_trip<S: KeyValueStore>(state: &AppState<S>) -> Result<Trip, AppError> {
    state.trips.current_trip().ok_or_else(|| AppError::BadRequest {
        message: "No trip selected".to_string(),
    })
}

fn accepted<S: KeyValueStore>(state: &AppState<S>) -> (StatusCode, Json<JourneysResponse>) {
    (StatusCode::ACCEPTED, Json(journeys_response(state)))
}

fn journeys_response<S: KeyValueStore>(state: &AppState<S>) -> JourneysResponse {
    let snapshot = state.view.snapshot();
    let trip_selected = state.trips.selected().is_some();

    JourneysResponse {
        trip: snapshot.trip.as_ref().map(Trip::to_string),
        journeys: snapshot
            .journeys
            .iter()
            .map(JourneyResult::from_journey)
            .collect(),
        in_progress: snapshot.in_progress,
        notice: snapshot.notice.map(|n| n.message().to_string()),
        updated: freshness_message(snapshot.last_update, state.clock.now(), trip_selected),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Internal { message: String },
}

impl From<TripError> for AppError {
    fn from(e: TripError) -> Self {
        let message = e.to_string();
        match e {
            TripError::NoSuchTrip(_) => AppError::NotFound { message },
            TripError::Duplicate(_) => AppError::Conflict { message },
            TripError::EmptyStation => AppError::BadRequest { message },
            TripError::Store(_) => AppError::Internal { message },
        }
    }
}

impl From<RetrievalError> for AppError {
    fn from(e: RetrievalError) -> Self {
        let message = e.to_string();
        match e {
            RetrievalError::Busy => AppError::Conflict { message },
            RetrievalError::NoTrip => AppError::BadRequest { message },
            RetrievalError::Closed => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
