//! National Rail online journey planner (OJP) client.
//!
//! The planner has no API; journeys are scraped from its HTML results page.
//!
//! Key characteristics of the planner:
//! - A session cookie from the search page must precede any plan request
//! - Results give clock times only; the date comes from day headings
//! - There is no pagination token, so later pages are requested by
//!   re-anchoring the search time after the last known departure

mod client;
mod error;
mod parser;
mod requestor;
#[cfg(test)]
mod test_server;

pub use client::{ClientConfig, SessionClient};
pub use error::ClientError;
pub use parser::{ParsedPage, parse_journeys};
pub use requestor::{JourneyRequestor, JourneySource, RequestOutcome};
