//! Data transfer objects for the web API.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Journey, JourneyLeg, Trip};

/// Request body for adding a trip.
#[derive(Debug, Deserialize)]
pub struct AddTripRequest {
    /// Departure station name
    pub from: String,
    /// Destination station name
    pub to: String,
    /// Optional departure station code
    #[serde(default)]
    pub from_code: Option<String>,
    /// Optional destination station code
    #[serde(default)]
    pub to_code: Option<String>,
}

impl AddTripRequest {
    pub fn into_trip(self) -> Trip {
        let trip = Trip::new(self.from.trim(), self.to.trim());
        match (self.from_code, self.to_code) {
            (Some(from_code), Some(to_code)) => trip.with_codes(from_code, to_code),
            _ => trip,
        }
    }
}

/// Request body for selecting a trip.
#[derive(Debug, Deserialize)]
pub struct SelectTripRequest {
    pub index: usize,
}

/// A trip in the trip list.
#[derive(Debug, Serialize)]
pub struct TripResult {
    pub index: usize,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_code: Option<String>,
    /// Display label, e.g. "Bath Spa to Bristol Temple Meads"
    pub label: String,
}

impl TripResult {
    pub fn from_trip(index: usize, trip: &Trip) -> Self {
        Self {
            index,
            from: trip.from.clone(),
            to: trip.to.clone(),
            from_code: trip.from_code.clone(),
            to_code: trip.to_code.clone(),
            label: trip.to_string(),
        }
    }
}

/// The trip list and selection.
#[derive(Debug, Serialize)]
pub struct TripsResponse {
    pub trips: Vec<TripResult>,
    pub selected: Option<usize>,
}

impl TripsResponse {
    pub fn new(trips: &[Trip], selected: Option<usize>) -> Self {
        Self {
            trips: trips
                .iter()
                .enumerate()
                .map(|(i, t)| TripResult::from_trip(i, t))
                .collect(),
            selected,
        }
    }
}

/// One leg of a journey with changes.
#[derive(Debug, Serialize)]
pub struct LegResult {
    pub departure_time: String,
    pub from: String,
    pub arrival_time: String,
    pub to: String,
}

impl LegResult {
    fn from_leg(leg: &JourneyLeg) -> Self {
        Self {
            departure_time: leg.departure_time.clone(),
            from: leg.from.clone(),
            arrival_time: leg.arrival_time.clone(),
            to: leg.to.clone(),
        }
    }
}

/// A journey in the journey list.
#[derive(Debug, Serialize)]
pub struct JourneyResult {
    /// Departure date (YYYY-MM-DD)
    pub date: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub status: String,
    /// First journey on a later day than the one before it
    pub date_change: bool,
    pub changes: usize,
    pub legs: Vec<LegResult>,
}

impl JourneyResult {
    pub fn from_journey(journey: &Journey) -> Self {
        Self {
            date: journey.departure.date().format("%Y-%m-%d").to_string(),
            departure_time: journey.departure_time.clone(),
            arrival_time: journey.arrival_time.clone(),
            duration: journey.duration.clone(),
            status: journey.status.clone(),
            date_change: journey.date_change,
            changes: journey.changes(),
            legs: journey.legs.iter().map(LegResult::from_leg).collect(),
        }
    }
}

/// The journey list for the selected trip.
#[derive(Debug, Serialize)]
pub struct JourneysResponse {
    /// Label of the selected trip
    pub trip: Option<String>,
    pub journeys: Vec<JourneyResult>,
    /// A request is in flight
    pub in_progress: bool,
    /// Problem reported by the last request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// How long ago the list was last updated
    pub updated: String,
}

/// The stored next departure.
#[derive(Debug, Serialize)]
pub struct DepartureResponse {
    /// Departure time (YYYY-MM-DDTHH:MM:SS)
    pub time: Option<String>,
    /// The time may be stale
    pub suspect: bool,
}

/// Recently used station names, most recent first.
#[derive(Debug, Serialize)]
pub struct RecentStationsResponse {
    pub stations: Vec<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Describe how long ago the journey list was updated.
///
/// With no update yet, prompts for one if a trip is selected.
pub fn freshness_message(
    last_update: Option<NaiveDateTime>,
    now: NaiveDateTime,
    trip_selected: bool,
) -> String {
    let Some(last_update) = last_update else {
        return if trip_selected {
            "Click to update".to_string()
        } else {
            String::new()
        };
    };

    let secs = (now - last_update).num_seconds();
    match secs {
        i64::MIN..60 => "Updated a moment ago".to_string(),
        60..120 => "Updated a minute ago".to_string(),
        120..3600 => format!("Updated {} minutes ago", secs / 60),
        3600..7200 => "Updated an hour ago".to_string(),
        7200..86400 => format!("Updated {} hours ago", secs / 3600),
        _ => "Updated more than a day ago".to_string(),
    }
}
