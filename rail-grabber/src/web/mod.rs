//! Web layer for rail departure checking.
//!
//! A JSON API over the trip list, journey retrieval and the stored next
//! departure.

mod dto;
mod routes;
mod state;
mod view;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use view::{JourneyView, Notice, ViewSnapshot};
