//! The user's list of trips and the selected trip.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::domain::Trip;
use crate::signals::{DepartureSignal, Signals};

use super::recent::RecentStations;
use super::{KeyValueStore, TripError};

const TRIPS_SIZE: &str = "TrainTripsSize";
const TRIP_FROM: &str = "TrainTripFrom";
const TRIP_TO: &str = "TrainTripTo";
const TRIP_FROM_CODE: &str = "TrainTripFromCode";
const TRIP_TO_CODE: &str = "TrainTripToCode";
const TRIP_SELECTED: &str = "TrainTripSelected";

#[derive(Debug, Default)]
struct TripList {
    trips: Vec<Trip>,
    selected: Option<usize>,
}

/// Shared handle onto the persisted trip list.
///
/// Clones see the same list. Every change is written to the backing store
/// before the `TripUpdated` signal is emitted. Stations of added trips are
/// remembered in the recent station list.
#[derive(Debug, Clone)]
pub struct TripStore<S> {
    store: S,
    signals: Signals,
    list: Arc<Mutex<TripList>>,
    recent: RecentStations<S>,
}

impl<S: KeyValueStore> TripStore<S> {
    /// Load the trip list from `store`.
    ///
    /// A stored selection past the end of the list is clamped to the last
    /// trip, and the clamped value is written back.
    pub fn load(store: S, signals: Signals) -> Result<Self, TripError> {
        let count = store.get_int(TRIPS_SIZE, 0).max(0) as usize;

        let trips: Vec<Trip> = (0..count).map(|i| read_trip(&store, i)).collect();

        let stored = store.get_int(TRIP_SELECTED, 0);
        let selected = if trips.is_empty() {
            None
        } else if stored < 0 {
            Some(0)
        } else {
            Some((stored as usize).min(trips.len() - 1))
        };

        if selected_key(selected) != stored {
            store.set_int(TRIP_SELECTED, selected_key(selected))?;
        }

        debug!(count = trips.len(), ?selected, "loaded trips");

        Ok(Self {
            recent: RecentStations::load(store.clone()),
            store,
            signals,
            list: Arc::new(Mutex::new(TripList { trips, selected })),
        })
    }

    /// All trips in display order.
    pub fn trips(&self) -> Vec<Trip> {
        self.lock().trips.clone()
    }

    /// Index of the selected trip, if any.
    pub fn selected(&self) -> Option<usize> {
        self.lock().selected
    }

    /// The selected trip, if any.
    pub fn current_trip(&self) -> Option<Trip> {
        let list = self.lock();
        list.selected.and_then(|i| list.trips.get(i).cloned())
    }

    /// Recently used station names, most recent first.
    pub fn recent_stations(&self) -> Vec<String> {
        self.recent.stations()
    }

    /// Returns true if a trip between these stations already exists.
    pub fn is_duplicate(&self, from: &str, to: &str) -> bool {
        self.lock().trips.iter().any(|t| t.is_between(from, to))
    }

    /// Select the trip at `index`.
    pub fn select(&self, index: usize) -> Result<(), TripError> {
        {
            let mut list = self.lock();
            if index >= list.trips.len() {
                return Err(TripError::NoSuchTrip(index));
            }
            self.store.set_int(TRIP_SELECTED, index as i64)?;
            list.selected = Some(index);
        }

        self.signals.emit(DepartureSignal::TripUpdated);
        Ok(())
    }

    /// Append `trip` to the list, returning its index.
    ///
    /// The first trip added becomes the selected trip.
    pub fn add(&self, trip: Trip) -> Result<usize, TripError> {
        if trip.from.trim().is_empty() || trip.to.trim().is_empty() {
            return Err(TripError::EmptyStation);
        }

        let (trip_from, trip_to) = (trip.from.clone(), trip.to.clone());
        let index = {
            let mut list = self.lock();
            if list.trips.iter().any(|t| *t == trip) {
                return Err(TripError::Duplicate(trip.to_string()));
            }

            let index = list.trips.len();
            write_trip(&self.store, index, &trip)?;
            self.store.set_int(TRIPS_SIZE, (index + 1) as i64)?;
            list.trips.push(trip);

            if list.selected.is_none() {
                self.store.set_int(TRIP_SELECTED, index as i64)?;
                list.selected = Some(index);
            }
            index
        };

        for station in [&trip_from, &trip_to] {
            if let Err(e) = self.recent.add(station) {
                warn!(error = %e, station = %station, "failed to save recent stations");
            }
        }

        self.signals.emit(DepartureSignal::TripUpdated);
        Ok(index)
    }

    /// Remove the trip at `index` and return it.
    ///
    /// The selection follows the trip it pointed at; removing the selected
    /// trip selects its successor, or the new last trip.
    pub fn remove(&self, index: usize) -> Result<Trip, TripError> {
        let removed = {
            let mut list = self.lock();
            if index >= list.trips.len() {
                return Err(TripError::NoSuchTrip(index));
            }

            let removed = list.trips.remove(index);

            for (i, trip) in list.trips.iter().enumerate().skip(index) {
                write_trip(&self.store, i, trip)?;
            }
            clear_trip(&self.store, list.trips.len())?;
            self.store.set_int(TRIPS_SIZE, list.trips.len() as i64)?;

            list.selected = match list.selected {
                _ if list.trips.is_empty() => None,
                Some(s) if s > index => Some(s - 1),
                Some(s) => Some(s.min(list.trips.len() - 1)),
                None => None,
            };
            self.store.set_int(TRIP_SELECTED, selected_key(list.selected))?;

            removed
        };

        self.signals.emit(DepartureSignal::TripUpdated);
        Ok(removed)
    }

    fn lock(&self) -> MutexGuard<'_, TripList> {
        self.list.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn selected_key(selected: Option<usize>) -> i64 {
    selected.map_or(-1, |i| i as i64)
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn read_trip<S: KeyValueStore>(store: &S, index: usize) -> Trip {
    Trip {
        from: store.get_string(&format!("{TRIP_FROM}{index}"), ""),
        to: store.get_string(&format!("{TRIP_TO}{index}"), ""),
        from_code: optional(store.get_string(&format!("{TRIP_FROM_CODE}{index}"), "")),
        to_code: optional(store.get_string(&format!("{TRIP_TO_CODE}{index}"), "")),
    }
}

fn write_trip<S: KeyValueStore>(store: &S, index: usize, trip: &Trip) -> Result<(), TripError> {
    store.set_string(&format!("{TRIP_FROM}{index}"), &trip.from)?;
    store.set_string(&format!("{TRIP_TO}{index}"), &trip.to)?;
    store.set_string(
        &format!("{TRIP_FROM_CODE}{index}"),
        trip.from_code.as_deref().unwrap_or(""),
    )?;
    store.set_string(
        &format!("{TRIP_TO_CODE}{index}"),
        trip.to_code.as_deref().unwrap_or(""),
    )?;
    Ok(())
}

fn clear_trip<S: KeyValueStore>(store: &S, index: usize) -> Result<(), TripError> {
    for prefix in [TRIP_FROM, TRIP_TO, TRIP_FROM_CODE, TRIP_TO_CODE] {
        store.delete(&format!("{prefix}{index}"))?;
    }
    Ok(())
}
