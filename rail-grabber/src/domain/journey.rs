//! Journey types.
//!
//! A `Journey` is one departure option returned by the planner for a trip.
//! Journeys that need a change of train carry their individual legs.

use chrono::NaiveDate;

use super::RailTime;

/// One train segment of a journey with changes.
///
/// All fields are display strings exactly as the planner printed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyLeg {
    /// Departure time ("HH:MM")
    pub departure_time: String,
    /// Station the leg departs from
    pub from: String,
    /// Arrival time ("HH:MM")
    pub arrival_time: String,
    /// Station the leg arrives at
    pub to: String,
}

/// One scheduled departure option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    /// Full departure timestamp (request or banner date + departure time)
    pub departure: RailTime,
    /// Departure time for display ("HH:MM")
    pub departure_time: String,
    /// Arrival time for display ("HH:MM")
    pub arrival_time: String,
    /// Journey duration as printed, e.g. "1h 5m"
    pub duration: String,
    /// Free-text status, e.g. "On time" or "Delayed"
    pub status: String,
    /// True if this is the first journey on a later day than the one before it
    pub date_change: bool,
    /// Legs of the journey; empty for a direct train
    pub legs: Vec<JourneyLeg>,
}

impl Journey {
    /// Returns true if the journey needs no change of train.
    pub fn is_direct(&self) -> bool {
        self.legs.is_empty()
    }

    /// Number of changes of train.
    pub fn changes(&self) -> usize {
        self.legs.len().saturating_sub(1)
    }
}

/// The parsed result of one planner request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyBatch {
    /// Journeys in departure order
    pub journeys: Vec<Journey>,
    /// Date used to resolve clock times before any day banner was seen
    pub reference_date: NaiveDate,
}

impl JourneyBatch {
    /// Create a batch.
    pub fn new(journeys: Vec<Journey>, reference_date: NaiveDate) -> Self {
        Self {
            journeys,
            reference_date,
        }
    }

    /// Number of journeys in the batch.
    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    /// Returns true if the batch holds no journeys.
    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }

    /// Departure of the first journey.
    pub fn first_departure(&self) -> Option<RailTime> {
        self.journeys.first().map(|j| j.departure)
    }

    /// Departure of the last journey.
    pub fn last_departure(&self) -> Option<RailTime> {
        self.journeys.last().map(|j| j.departure)
    }
}

/// Recompute `date_change` flags for a run of journeys.
///
/// A journey is flagged iff its departure date is strictly later than the
/// running date, which starts at `base` and advances to each flagged
/// journey's date.
///
/// ```
/// use rail_grabber::domain::{mark_date_changes, Journey, RailTime};
/// use chrono::NaiveDate;
///
/// let d1 = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let d2 = d1.succ_opt().unwrap();
/// let make = |time: &str, date| Journey {
///     departure: RailTime::parse_hhmm(time, date).unwrap(),
///     departure_time: time.into(),
///     arrival_time: String::new(),
///     duration: String::new(),
///     status: String::new(),
///     date_change: false,
///     legs: vec![],
/// };
///
/// let mut journeys = vec![make("23:40", d1), make("00:10", d2), make("00:40", d2)];
/// mark_date_changes(&mut journeys, d1);
///
/// let flags: Vec<bool> = journeys.iter().map(|j| j.date_change).collect();
/// assert_eq!(flags, [false, true, false]);
/// ```
pub fn mark_date_changes(journeys: &mut [Journey], base: NaiveDate) {
    let mut running = base;

    for journey in journeys {
        let date = journey.departure.date();
        journey.date_change = date > running;
        if journey.date_change {
            running = date;
        }
    }
}
