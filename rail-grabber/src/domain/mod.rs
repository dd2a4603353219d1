//! Domain types for departure retrieval.
//!
//! Trips, the journeys the planner returns for them, and the date-aware
//! time type that orders journeys across midnight.

mod journey;
mod time;
mod trip;

pub use journey::{Journey, JourneyBatch, JourneyLeg, mark_date_changes};
pub use time::{Clock, RailTime, SystemClock, TimeError};
pub use trip::Trip;
