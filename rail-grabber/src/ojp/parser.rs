//! Journey planner results page parsing.
//!
//! Side-effect free. The results page is a table with one row per journey,
//! optional rows for the legs of journeys with changes, and date headings
//! wherever the list moves on to another day. The report heading above the
//! table carries the date of the first journeys.
//!
//! The parser targets that one page structure. Rows it cannot make sense of
//! are skipped rather than failing the page.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::domain::{Journey, JourneyBatch, JourneyLeg, RailTime};

/// Journey rows, leg rows, the report heading and day headings, in
/// document order.
static MARKERS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr, h3").expect("static selector is valid"));

/// Classes identifying the report heading.
const REPORT_HEADING_CLASSES: [&str; 3] = ["outward", "top", "ctf-h3"];

/// Number of non-empty cells in a well-formed leg row.
const LEG_CELLS: usize = 4;

/// Result of parsing a results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPage {
    /// At least one journey was found.
    Journeys(JourneyBatch),
    /// The page held no journeys.
    NoJourneys,
}

/// A structural element of the results page.
enum Marker<'a> {
    Journey(ElementRef<'a>),
    Leg(ElementRef<'a>),
    DayHeading(String),
}

/// Parse a results page into journeys.
///
/// Clock times are placed on `reference_date` until a date heading moves
/// the list on to another day.
///
/// ```
/// use rail_grabber::ojp::{parse_journeys, ParsedPage};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let html = r#"<table><tr>
///     <td class="dep">09:00</td><td class="arr">09:45</td>
///     <td class="dur">0h 45m</td><td class="status">On time</td>
/// </tr></table>"#;
///
/// let ParsedPage::Journeys(batch) = parse_journeys(html, date) else {
///     panic!("expected journeys");
/// };
/// assert_eq!(batch.journeys[0].departure_time, "09:00");
/// assert_eq!(batch.journeys[0].departure.date(), date);
///
/// assert_eq!(parse_journeys("<p>none</p>", date), ParsedPage::NoJourneys);
/// ```
pub fn parse_journeys(html: &str, reference_date: NaiveDate) -> ParsedPage {
    let document = Html::parse_document(html);

    let mut journeys: Vec<Journey> = Vec::new();
    let mut current_date = reference_date;
    let mut last_seen: Option<NaiveDate> = None;

    for element in document.select(&MARKERS) {
        match classify(element) {
            Some(Marker::DayHeading(text)) => match banner_date(&text, reference_date) {
                Some(date) => current_date = date,
                None => debug!(banner = %text, "skipping unreadable date heading"),
            },
            Some(Marker::Journey(row)) => {
                let Some(mut journey) = parse_journey_row(row, current_date) else {
                    debug!("skipping malformed journey row");
                    continue;
                };

                let date = journey.departure.date();
                // Only advances; a row dated earlier than one already seen is left unflagged
                journey.date_change = last_seen.is_some_and(|seen| date > seen);
                if last_seen.is_none() || journey.date_change {
                    last_seen = Some(date);
                }

                journeys.push(journey);
            }
            Some(Marker::Leg(row)) => {
                let Some(journey) = journeys.last_mut() else {
                    debug!("skipping leg row before any journey");
                    continue;
                };
                match parse_leg_row(row) {
                    Some(leg) => journey.legs.push(leg),
                    None => debug!("skipping malformed leg row"),
                }
            }
            None => {}
        }
    }

    if journeys.is_empty() {
        ParsedPage::NoJourneys
    } else {
        ParsedPage::Journeys(JourneyBatch::new(journeys, reference_date))
    }
}

fn classify(element: ElementRef<'_>) -> Option<Marker<'_>> {
    let value = element.value();

    match value.name() {
        "h3" => {
            let is_report_heading = REPORT_HEADING_CLASSES
                .iter()
                .all(|class| value.classes().any(|c| c == *class));
            is_report_heading.then(|| Marker::DayHeading(element_text(element)))
        }
        "tr" => {
            if value.classes().any(|c| c == "day-heading") {
                Some(Marker::DayHeading(element_text(element)))
            } else if child_cell(element, "dep").is_some() {
                Some(Marker::Journey(element))
            } else if child_cell(element, "origin").is_some() {
                Some(Marker::Leg(element))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn parse_journey_row(row: ElementRef<'_>, date: NaiveDate) -> Option<Journey> {
    let departure_time = clock_time(&element_text(child_cell(row, "dep")?))?;
    let arrival_time = clock_time(&element_text(child_cell(row, "arr")?))?;
    let duration = clean_text(&element_text(child_cell(row, "dur")?));
    let status = clean_text(&element_text(child_cell(row, "status")?));

    let departure = RailTime::parse_hhmm(&departure_time, date).ok()?;

    Some(Journey {
        departure,
        departure_time,
        arrival_time,
        duration,
        status,
        date_change: false,
        legs: Vec::new(),
    })
}

/// A leg row has exactly four non-empty cells: departure time, origin,
/// arrival time, destination.
fn parse_leg_row(row: ElementRef<'_>) -> Option<JourneyLeg> {
    let cells: Vec<String> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "td")
        .map(|cell| clean_text(&element_text(cell)))
        .filter(|text| !text.is_empty())
        .collect();

    let [departure_time, from, arrival_time, to]: [String; LEG_CELLS] = cells.try_into().ok()?;

    Some(JourneyLeg {
        departure_time,
        from,
        arrival_time,
        to,
    })
}

/// Find a direct `td` child carrying `class`.
fn child_cell<'a>(row: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "td" && child.value().classes().any(|c| c == class))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// First five characters ("HH:MM") of a time cell.
fn clock_time(raw: &str) -> Option<String> {
    raw.trim().get(..5).map(str::to_string)
}

/// Strip layout whitespace and non-breaking spaces, collapsing runs.
fn clean_text(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract a "Tue 5 Mar" style date from heading text.
///
/// The heading has no year; the reference date's year is used and the
/// weekday must agree with it, otherwise the heading is ignored.
pub(crate) fn banner_date(text: &str, reference_date: NaiveDate) -> Option<NaiveDate> {
    let normalized = clean_text(text).replace('+', " ");
    let words: Vec<&str> = normalized
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .collect();

    words
        .windows(3)
        .find_map(|w| day_month(w[0], w[1], w[2], reference_date.year()))
}

fn day_month(weekday: &str, day: &str, month: &str, year: i32) -> Option<NaiveDate> {
    let shaped = weekday.len() == 3
        && weekday.chars().all(|c| c.is_ascii_alphabetic())
        && (1..=2).contains(&day.len())
        && day.chars().all(|c| c.is_ascii_digit())
        && month.len() == 3
        && month.chars().all(|c| c.is_ascii_alphabetic());
    if !shaped {
        return None;
    }

    NaiveDate::parse_from_str(&format!("{weekday} {day} {month} {year}"), "%a %d %b %Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn journey_row(dep: &str, arr: &str) -> String {
        format!(
            "<tr>\n\t<td class=\"dep\">{dep}\n\t</td><td class=\"arr\">{arr}</td>\
             <td class=\"dur\">\n\t\t1h&nbsp;5m\n</td><td class=\"status\">\n\tOn time\n</td></tr>"
        )
    }

    fn leg_row(cells: &[&str]) -> String {
        let mut row = String::from("<tr><td class=\"origin\"></td>");
        for cell in cells {
            row.push_str(&format!("<td>\n\t{cell}\n</td>"));
        }
        row.push_str("<td>  </td></tr>");
        row
    }

    fn page(heading: &str, rows: &[String]) -> String {
        format!(
            "<html><body><h3 class=\"outward top ctf-h3\">{heading}</h3>\
             <table><tbody>{}</tbody></table></body></html>",
            rows.concat()
        )
    }

    fn journeys(html: &str, reference: NaiveDate) -> Vec<Journey> {
        match parse_journeys(html, reference) {
            ParsedPage::Journeys(batch) => batch.journeys,
            ParsedPage::NoJourneys => panic!("expected journeys"),
        }
    }

    #[test]
    fn parses_journey_fields() {
        let d = date(2024, 3, 15);
        let html = page("", &[journey_row("09:00abc", "09:45 (+1)")]);

        let result = journeys(&html, d);

        assert_eq!(result.len(), 1);
        let j = &result[0];
        assert_eq!(j.departure_time, "09:00");
        assert_eq!(j.arrival_time, "09:45");
        assert_eq!(j.duration, "1h 5m");
        assert_eq!(j.status, "On time");
        assert_eq!(j.departure, RailTime::parse_hhmm("09:00", d).unwrap());
        assert!(!j.date_change);
        assert!(j.legs.is_empty());
    }

    #[test]
    fn same_day_rows_share_reference_date() {
        let d = date(2024, 3, 15);
        let html = page(
            "",
            &[
                journey_row("09:00", "09:40"),
                journey_row("09:30", "10:10"),
                journey_row("10:15", "10:55"),
            ],
        );

        let result = journeys(&html, d);

        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|j| j.departure.date() == d));
        assert!(result.iter().all(|j| !j.date_change));
    }

    #[test]
    fn empty_page_is_no_journeys() {
        let d = date(2024, 3, 15);

        assert_eq!(parse_journeys("", d), ParsedPage::NoJourneys);
        assert_eq!(parse_journeys(&page("Fri 15 Mar", &[]), d), ParsedPage::NoJourneys);
    }

    #[test]
    fn all_rows_malformed_is_no_journeys() {
        let d = date(2024, 3, 15);
        let html = "<table><tr><td class=\"dep\">09:00</td></tr></table>";

        assert_eq!(parse_journeys(html, d), ParsedPage::NoJourneys);
    }

    #[test]
    fn row_missing_cell_is_skipped() {
        let d = date(2024, 3, 15);
        let broken = "<tr><td class=\"dep\">08:00</td><td class=\"arr\">08:30</td></tr>".to_string();
        let html = page("", &[broken, journey_row("09:00", "09:30")]);

        let result = journeys(&html, d);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].departure_time, "09:00");
    }

    #[test]
    fn day_heading_moves_to_next_day() {
        let d = date(2024, 3, 15);
        let html = page(
            "Outward journey Fri 15 Mar",
            &[
                journey_row("23:30", "00:10"),
                "<tr class=\"day-heading\"><td>\n\tSat 16 Mar\n</td></tr>".to_string(),
                journey_row("00:15", "00:55"),
                journey_row("05:40", "06:20"),
            ],
        );

        let result = journeys(&html, d);

        assert_eq!(result[0].departure.date(), d);
        assert_eq!(result[1].departure.date(), date(2024, 3, 16));
        assert_eq!(result[2].departure.date(), date(2024, 3, 16));
        let flags: Vec<bool> = result.iter().map(|j| j.date_change).collect();
        assert_eq!(flags, [false, true, false]);
    }

    #[test]
    fn heading_back_to_earlier_day_is_not_a_date_change() {
        let d = date(2024, 3, 15);
        let heading = |text: &str| format!("<tr class=\"day-heading\"><td>{text}</td></tr>");
        let html = page(
            "",
            &[
                journey_row("23:30", "00:10"),
                heading("Sat 16 Mar"),
                journey_row("00:15", "00:55"),
                heading("Fri 15 Mar"),
                journey_row("23:45", "00:25"),
                heading("Sat 16 Mar"),
                journey_row("01:00", "01:40"),
            ],
        );

        let result = journeys(&html, d);

        assert_eq!(result[2].departure.date(), d);
        let flags: Vec<bool> = result.iter().map(|j| j.date_change).collect();
        assert_eq!(flags, [false, true, false, false]);
    }

    #[test]
    fn report_heading_sets_first_date() {
        let d = date(2024, 3, 15);
        let html = page(
            "Journey&nbsp;from Bath to Bristol on Sat+16+Mar",
            &[journey_row("06:00", "06:20")],
        );

        let result = journeys(&html, d);

        assert_eq!(result[0].departure.date(), date(2024, 3, 16));
        // first journey of a batch has nothing before it to change from
        assert!(!result[0].date_change);
    }

    #[test]
    fn unreadable_heading_keeps_current_date() {
        let d = date(2024, 3, 15);
        let html = page(
            "",
            &[
                "<tr class=\"day-heading\"><td>Someday soon</td></tr>".to_string(),
                journey_row("09:00", "09:30"),
            ],
        );

        let result = journeys(&html, d);

        assert_eq!(result[0].departure.date(), d);
    }

    #[test]
    fn leg_with_four_cells_is_attached() {
        let d = date(2024, 3, 15);
        let html = page(
            "",
            &[
                journey_row("09:00", "10:30"),
                leg_row(&["09:00", "Bath Spa", "09:15", "Bristol Temple Meads"]),
                leg_row(&["09:40", "Bristol Temple Meads", "10:30", "Cardiff Central"]),
            ],
        );

        let result = journeys(&html, d);

        assert_eq!(result[0].legs.len(), 2);
        assert_eq!(
            result[0].legs[0],
            JourneyLeg {
                departure_time: "09:00".into(),
                from: "Bath Spa".into(),
                arrival_time: "09:15".into(),
                to: "Bristol Temple Meads".into(),
            }
        );
        assert_eq!(result[0].changes(), 1);
    }

    #[test]
    fn leg_with_wrong_cell_count_is_discarded() {
        let d = date(2024, 3, 15);
        let html = page(
            "",
            &[
                journey_row("09:00", "10:30"),
                leg_row(&["09:00", "Bath Spa", "09:15"]),
                leg_row(&["09:00", "Bath Spa", "09:15", "Bristol", "extra"]),
            ],
        );

        let result = journeys(&html, d);

        assert!(result[0].legs.is_empty());
    }

    #[test]
    fn leg_before_any_journey_is_discarded() {
        let d = date(2024, 3, 15);
        let html = page(
            "",
            &[
                leg_row(&["08:00", "Bath Spa", "08:15", "Bristol"]),
                journey_row("09:00", "09:30"),
            ],
        );

        let result = journeys(&html, d);

        assert_eq!(result.len(), 1);
        assert!(result[0].legs.is_empty());
    }

    #[test]
    fn legs_attach_to_most_recent_journey() {
        let d = date(2024, 3, 15);
        let html = page(
            "",
            &[
                journey_row("09:00", "09:30"),
                journey_row("10:00", "11:30"),
                leg_row(&["10:00", "Bath Spa", "10:15", "Bristol"]),
            ],
        );

        let result = journeys(&html, d);

        assert!(result[0].legs.is_empty());
        assert_eq!(result[1].legs.len(), 1);
    }

    #[test]
    fn banner_date_formats() {
        let d = date(2024, 3, 1);

        assert_eq!(banner_date("Sat 16 Mar", d), Some(date(2024, 3, 16)));
        assert_eq!(banner_date("Tue 5 Mar", d), Some(date(2024, 3, 5)));
        assert_eq!(banner_date("\n\tTue 05 Mar\n", d), Some(date(2024, 3, 5)));
        assert_eq!(banner_date("Depart after 10:00 on Tue 5 Mar,", d), Some(date(2024, 3, 5)));
    }

    #[test]
    fn banner_date_rejects_garbage() {
        let d = date(2024, 3, 1);

        assert_eq!(banner_date("", d), None);
        assert_eq!(banner_date("Tue Mar 5", d), None);
        assert_eq!(banner_date("Tuesday 5 March", d), None);
        assert_eq!(banner_date("Tue 35 Mar", d), None);
    }

    #[test]
    fn banner_date_weekday_must_match_reference_year() {
        // 1 Jan 2025 is a Wednesday; read in 2024 it does not exist as a Wednesday
        let d = date(2024, 12, 31);

        assert_eq!(banner_date("Wed 1 Jan", d), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn row(minutes: u32) -> String {
        format!(
            "<tr><td class=\"dep\">{:02}:{:02}</td><td class=\"arr\">23:59</td>\
             <td class=\"dur\">1h</td><td class=\"status\">On time</td></tr>",
            minutes / 60,
            minutes % 60
        )
    }

    proptest! {
        /// Every well-formed row becomes one journey, in document order
        #[test]
        fn rows_parse_in_order(mut minutes in proptest::collection::vec(0u32..1440, 1..20)) {
            minutes.sort_unstable();
            let html = format!("<table>{}</table>", minutes.iter().map(|m| row(*m)).collect::<String>());
            let reference = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

            let ParsedPage::Journeys(batch) = parse_journeys(&html, reference) else {
                return Err(TestCaseError::fail("expected journeys"));
            };

            prop_assert_eq!(batch.len(), minutes.len());
            prop_assert!(batch.journeys.windows(2).all(|w| w[0].departure <= w[1].departure));
            prop_assert!(batch.journeys.iter().all(|j| !j.date_change));
        }

        /// Leg rows only attach when they hold exactly four values
        #[test]
        fn leg_cell_count(count in 0usize..8) {
            let cells: String = (0..count).map(|i| format!("<td>v{i}</td>")).collect();
            let html = format!("<table>{}<tr><td class=\"origin\"></td>{cells}</tr></table>", row(600));
            let reference = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

            let ParsedPage::Journeys(batch) = parse_journeys(&html, reference) else {
                return Err(TestCaseError::fail("expected journeys"));
            };

            let expected = usize::from(count == LEG_CELLS);
            prop_assert_eq!(batch.journeys[0].legs.len(), expected);
        }
    }
}
