//! Locale-style timestamps.
//!
//! Log entries and the dialog marker store dates the way an en-US browser
//! prints them (`10/19/2026, 3:04:05 PM` and `10/19/2026`). Day comparisons
//! parse the date back out of the stored text.

use chrono::{NaiveDate, NaiveDateTime};

const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";
const DATE_FORMAT: &str = "%-m/%-d/%Y";
const DATE_PARSE_FORMAT: &str = "%m/%d/%Y";

/// Current local wall-clock time.
pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Calendar date of a stored timestamp or date marker. Anything after the
/// first comma (the time of day) is ignored.
pub fn parse_date(stored: &str) -> Option<NaiveDate> {
    let date_part = stored.split(',').next()?.trim();
    NaiveDate::parse_from_str(date_part, DATE_PARSE_FORMAT).ok()
}

/// Parse the `now` override accepted by mutating routes
/// (`YYYY-MM-DDTHH:MM:SS`, seconds optional).
pub fn parse_now(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
}
