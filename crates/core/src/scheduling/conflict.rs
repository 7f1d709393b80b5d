//! Caregiver double-booking detection
//!
//! Two windows on the same calendar day conflict iff they overlap as
//! half-open intervals: `existing.start < candidate.end && candidate.start <
//! existing.end`. Touching boundaries (back-to-back appointments) do not
//! conflict.

use chrono::NaiveDate;

use carelog_domain::{Schedule, TimeWindow};

/// A prospective schedule window to test against a caregiver's calendar.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub date: NaiveDate,
    pub window: TimeWindow,
    /// Schedule being edited, exempt from conflicting with itself.
    pub exclude_schedule_id: Option<&'a str>,
}

/// Whether two half-open windows overlap.
#[must_use]
pub fn windows_overlap(a: TimeWindow, b: TimeWindow) -> bool {
    a.start < b.end && b.start < a.end
}

/// Whether the candidate clashes with any of the caregiver's existing
/// schedules on the same calendar day.
///
/// `existing` is the caregiver's full schedule set; day comparison uses the
/// stored calendar-date field, not the start instant.
#[must_use]
pub fn has_conflict(existing: &[Schedule], candidate: &Candidate<'_>) -> bool {
    existing
        .iter()
        .filter(|s| candidate.exclude_schedule_id != Some(s.id.as_str()))
        .filter(|s| s.date == candidate.date)
        .any(|s| windows_overlap(s.window(), candidate.window))
}
