//! Train departure checking for saved trips.
//!
//! Scrapes journeys for a trip from the National Rail journey planner,
//! keeps a paginated list of them up to date, and tracks the next departure
//! for the selected trip.

pub mod departure;
pub mod domain;
pub mod ojp;
pub mod retrieval;
pub mod signals;
pub mod store;
pub mod web;

#[cfg(test)]
mod testing;
