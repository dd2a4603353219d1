//! Most recently used station names.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::{KeyValueStore, StoreError};

const RECENT_SIZE: &str = "RecentStationsSize";
const RECENT_STATION: &str = "RecentStation";

/// Number of station names remembered.
pub const MAX_RECENT_STATIONS: usize = 4;

/// Shared handle onto the persisted recent station list, most recent first.
#[derive(Debug, Clone)]
pub struct RecentStations<S> {
    store: S,
    stations: Arc<Mutex<Vec<String>>>,
}

impl<S: KeyValueStore> RecentStations<S> {
    /// Load up to [`MAX_RECENT_STATIONS`] names from `store`.
    pub fn load(store: S) -> Self {
        let count = (store.get_int(RECENT_SIZE, 0).max(0) as usize).min(MAX_RECENT_STATIONS);
        let stations = (0..count)
            .map(|i| store.get_string(&format!("{RECENT_STATION}{i}"), ""))
            .collect();

        Self {
            store,
            stations: Arc::new(Mutex::new(stations)),
        }
    }

    pub fn stations(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Move `name` to the front of the list, inserting it if new.
    ///
    /// Returns true if the list changed. Only a changed list is saved.
    pub fn add(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        let mut stations = self.lock();
        match stations.iter().position(|s| s == name) {
            Some(0) => return Ok(false),
            Some(i) => {
                let existing = stations.remove(i);
                stations.insert(0, existing);
            }
            None => {
                stations.insert(0, name.to_string());
                stations.truncate(MAX_RECENT_STATIONS);
            }
        }

        debug!(station = name, "recent stations changed");
        self.store.set_int(RECENT_SIZE, stations.len() as i64)?;
        for (i, station) in stations.iter().enumerate() {
            self.store.set_string(&format!("{RECENT_STATION}{i}"), station)?;
        }
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.stations.lock().unwrap_or_else(|e| e.into_inner())
    }
}
