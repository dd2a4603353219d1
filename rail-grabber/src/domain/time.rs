//! Departure times.
//!
//! The planner prints clock times as "HH:MM" with no date; the date comes
//! from the request or from the last day heading on the results page.

use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Error returned for a clock time that is not "HH:MM".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("expected HH:MM, got {0:?}")]
    Format(String),
    #[error("no such time of day: {0:?}")]
    OutOfRange(String),
}

/// A departure time resolved to a calendar date, to the minute.
///
/// Ordering is chronological, so journeys either side of midnight sort
/// correctly once their dates are resolved.
///
/// ```
/// use rail_grabber::domain::RailTime;
/// use chrono::NaiveDate;
///
/// let friday = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let late = RailTime::parse_hhmm("23:50", friday).unwrap();
/// let early = RailTime::parse_hhmm("00:05", friday.succ_opt().unwrap()).unwrap();
///
/// assert!(late < early);
/// assert_eq!(early.to_string(), "00:05");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RailTime(NaiveDateTime);

impl RailTime {
    /// Resolve a planner clock time on `date`.
    pub fn parse_hhmm(s: &str, date: NaiveDate) -> Result<Self, TimeError> {
        let well_formed = s.len() == 5
            && s.as_bytes()[2] == b':'
            && s.bytes().enumerate().all(|(i, b)| i == 2 || b.is_ascii_digit());
        if !well_formed {
            return Err(TimeError::Format(s.to_string()));
        }

        let time = NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| TimeError::OutOfRange(s.to_string()))?;
        Ok(Self(date.and_time(time)))
    }

    /// Truncate a timestamp to the minute.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self(dt.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(dt))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn to_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Debug for RailTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RailTime({})", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl fmt::Display for RailTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Source of the current local time.
///
/// Request anchors and next-departure extraction are relative to "now";
/// tests substitute a fixed clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
