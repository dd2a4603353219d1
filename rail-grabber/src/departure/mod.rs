//! Next departure tracking.
//!
//! The next departure for the selected trip is persisted so that widgets
//! and background consumers can show it without a fresh request. A suspect
//! flag marks the stored time as possibly stale after a failed refresh.

mod refresh;
mod tracker;

pub use refresh::NextDepartureRefresh;
pub use tracker::NextDepartureTracker;
