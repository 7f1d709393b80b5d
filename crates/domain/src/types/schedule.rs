//! Schedule, visit log and task entities plus their read/write models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;
use super::{GeoPoint, ScheduleStatus, ServiceKind};

/// A planned caregiver/client appointment with a fixed date and time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    /// Calendar day the appointment belongs to. Conflict detection compares
    /// this field, not the start instant.
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub caregiver_id: String,
    pub client_id: String,
    pub service: ServiceKind,
    /// Target location. Absent coordinates fail the geofence check closed.
    pub location: Option<GeoPoint>,
    pub service_notes: String,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    /// The schedule's planned window.
    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        TimeWindow { start: self.start_time, end: self.end_time }
    }
}

/// A half-open `[start, end)` time interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Execution record of a schedule's visit.
///
/// Created only when the visit starts, so the start instant and coordinate
/// are always present; at most one exists per schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitLog {
    pub id: String,
    pub schedule_id: String,
    pub start_time: DateTime<Utc>,
    pub start_point: GeoPoint,
    pub end_time: Option<DateTime<Utc>>,
    pub end_point: Option<GeoPoint>,
}

/// A unit of work attached to a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub schedule_id: String,
    pub title: String,
    pub description: String,
    /// Unset until a caregiver records an outcome.
    pub completed: Option<bool>,
    /// Required explanation when the task was not completed.
    pub reason: Option<String>,
}

impl Task {
    /// Whether this task blocks the visit from ending: neither completed
    /// nor excused with a recorded reason.
    #[must_use]
    pub fn blocks_visit_end(&self) -> bool {
        let excused = self.reason.as_deref().is_some_and(|r| !r.trim().is_empty());
        !self.completed.unwrap_or(false) && !excused
    }
}

/// Input for creating a schedule. Date and clock times arrive as literals
/// and are resolved by the time-window validator before anything persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub caregiver_id: String,
    pub client_id: String,
    pub service: ServiceKind,
    pub location: Option<GeoPoint>,
    pub service_notes: String,
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

/// Task shape accepted at schedule creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
}

/// Partial update applied over an existing schedule. Absent fields keep
/// their current values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePatch {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub caregiver_id: Option<String>,
    pub client_id: Option<String>,
    pub service: Option<ServiceKind>,
    pub location: Option<GeoPoint>,
    pub service_notes: Option<String>,
    /// When supplied, replaces the schedule's entire task set.
    pub tasks: Option<Vec<TaskReplacement>>,
}

/// Task shape accepted by an edit: each id must reference an existing task
/// and the replacement set is applied all-or-nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReplacement {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Query filter for schedule lists.
#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub caregiver_id: Option<String>,
    pub client_id: Option<String>,
    /// Restrict to the current calendar day and compute [`DayStats`].
    pub today: bool,
}

/// Aggregate counts for a today-filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub total: i64,
    pub completed: i64,
    pub missed: i64,
    pub upcoming: i64,
}

/// A schedule joined with its participants, visit record and tasks, as
/// loaded from persistence. Status and address enrichment happen in core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBundle {
    pub schedule: Schedule,
    pub caregiver: User,
    pub client: User,
    pub visit_log: Option<VisitLog>,
    pub tasks: Vec<Task>,
}

/// Full schedule view returned by the detail operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDetail {
    pub bundle: ScheduleBundle,
    pub status: ScheduleStatus,
    /// Reverse-geocoded address of the recorded visit start, when any.
    pub visit_address: Option<String>,
}

/// Row shape returned by schedule list operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub id: String,
    pub date: NaiveDate,
    pub client_name: String,
    pub client_picture: Option<String>,
    pub caregiver_id: String,
    pub caregiver_name: String,
    pub shift: TimeWindow,
    pub visit: Option<VisitWindow>,
    pub service: ServiceKind,
    pub status: ScheduleStatus,
    /// Reverse-geocoded schedule address; `None` when lookup fails.
    pub address: Option<String>,
}

/// Actual visit times shown alongside the planned shift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisitWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// A page of schedule summaries plus aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleListPage {
    pub list: Vec<ScheduleSummary>,
    /// Present only for today-filtered queries.
    pub stats: Option<DayStats>,
    /// Count of all schedules matching the participant filter, ignoring
    /// the day restriction.
    pub total_schedules: i64,
}
