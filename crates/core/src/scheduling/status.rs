//! Derived schedule status
//!
//! Status is never persisted; it is recomputed from the planned window and
//! the visit record on every read. Rule order is load-bearing: an ended
//! visit is always `completed` even past the scheduled end, and a visit that
//! started late is `in-progress`, never `missed`.

use chrono::{DateTime, Utc};

use carelog_domain::{ScheduleStatus, ScheduleSummary, TimeWindow, VisitLog};

/// Resolve the lifecycle status of a schedule at `now`.
///
/// Priority, first match wins:
/// 1. visit end recorded → `Completed`
/// 2. past the scheduled end → `Missed`
/// 3. visit start recorded → `InProgress`
/// 4. past the scheduled start → `Started`
/// 5. otherwise → `Upcoming`
#[must_use]
pub fn resolve(window: TimeWindow, visit: Option<&VisitLog>, now: DateTime<Utc>) -> ScheduleStatus {
    if visit.is_some_and(|v| v.end_time.is_some()) {
        return ScheduleStatus::Completed;
    }

    if now > window.end {
        return ScheduleStatus::Missed;
    }

    if visit.is_some() {
        return ScheduleStatus::InProgress;
    }

    if now > window.start {
        return ScheduleStatus::Started;
    }

    ScheduleStatus::Upcoming
}

/// Order a list by status priority.
///
/// Stable: rows with equal priority keep their incoming (start-time) order.
pub fn sort_by_status(summaries: &mut [ScheduleSummary]) {
    summaries.sort_by_key(|s| s.status.priority());
}
