//! Calendar date and clock-time resolution
//!
//! Request payloads carry dates and times as literals (`YYYY-MM-DD`,
//! `HH:MM:SS`). These helpers turn them into absolute instants and enforce
//! window ordering before anything is persisted.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use carelog_domain::{CarelogError, Result, TimeWindow};

lazy_static! {
    /// Strict 24-hour `HH:MM:SS` pattern.
    static ref TIME_FORMAT: Regex =
        Regex::new(r"^([01]\d|2[0-3]):[0-5]\d:[0-5]\d$").expect("valid time pattern");

    /// Strict `YYYY-MM-DD` pattern.
    static ref DATE_FORMAT: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern");
}

/// Parse a calendar-date literal.
///
/// Accepts a strict `YYYY-MM-DD` literal or an already-absolute RFC 3339
/// instant, whose UTC calendar date is taken.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    if DATE_FORMAT.is_match(value) {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| CarelogError::InvalidDate(value.to_owned()));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc).date_naive())
        .map_err(|_| CarelogError::InvalidDate(value.to_owned()))
}

/// Merge a calendar date with an `HH:MM:SS` clock-time literal into one
/// absolute instant.
pub fn combine(date: NaiveDate, time_of_day: &str) -> Result<DateTime<Utc>> {
    if !TIME_FORMAT.is_match(time_of_day) {
        return Err(CarelogError::InvalidTimeFormat(time_of_day.to_owned()));
    }

    let time = NaiveTime::parse_from_str(time_of_day, "%H:%M:%S")
        .map_err(|_| CarelogError::InvalidTimeFormat(time_of_day.to_owned()))?;

    Ok(date.and_time(time).and_utc())
}

/// Require the window start to come strictly before its end.
pub fn validate_ordering(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start >= end {
        return Err(CarelogError::EndBeforeStart);
    }
    Ok(())
}

/// Inclusive instant range covering the calendar day containing `now`.
#[must_use]
pub fn day_range(now: DateTime<Utc>) -> TimeWindow {
    let day = now.date_naive();
    let start = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = day.and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc();
    TimeWindow { start, end }
}
