//! Lenient timestamp parsing for date columns.
//!
//! Accepts the common spellings found in exported CSVs and renders every
//! parsed value as `YYYY-MM-DD HH:MM:SS`. Anything unparseable becomes
//! [`Cell::Missing`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::Cell;

/// Output format for normalized date cells.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats carrying a time component, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
];

/// Date-only formats, tried in order. Midnight is assumed.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%Y%m%d",
];

/// Zone markers accepted after a space-separated datetime. The wall-clock
/// time is kept as written.
const UTC_SUFFIXES: &[&str] = &[" UTC", " GMT", "UTC", "Z"];

/// Parse a timestamp from free text. Empty text never parses.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Offsets are dropped; the wall-clock time is kept.
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    parse_local(text).or_else(|| {
        UTC_SUFFIXES
            .iter()
            .find_map(|suffix| text.strip_suffix(suffix))
            .and_then(|rest| parse_local(rest.trim_end()))
    })
}

fn parse_local(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .or_else(|| parse_partial_iso(text))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// `YYYY` or `YYYY-MM`, anchored to the first day of the period.
fn parse_partial_iso(text: &str) -> Option<NaiveDate> {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let (year, month) = match text.split_once('-') {
        Some((y, m)) if m.len() <= 2 && all_digits(m) => (y, m.parse().ok()?),
        Some(_) => return None,
        None => (text, 1),
    };
    if year.len() != 4 || !all_digits(year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, 1)
}

/// Normalize one cell of a date column.
///
/// Parsed values become text in [`OUTPUT_FORMAT`]; missing and unparseable
/// values become [`Cell::Missing`].
pub fn normalize_date_cell(cell: &Cell) -> Cell {
    let parsed = match cell {
        Cell::Missing | Cell::Bool(_) => None,
        Cell::Text(s) => parse_timestamp(s),
        Cell::Integer(_) | Cell::Float(_) => parse_timestamp(&cell.render()),
    };

    match parsed {
        Some(ts) => Cell::Text(ts.format(OUTPUT_FORMAT).to_string()),
        None => Cell::Missing,
    }
}
