//! Port interfaces for the scheduling core
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use carelog_domain::{
    GeoPoint, Result, Schedule, ScheduleBundle, ScheduleFilter, Task, TaskReplacement, TimeWindow,
    User, VisitLog,
};

/// Persistence for schedules and their dependents.
///
/// Multi-entity writes (`insert_with_tasks`, `update_with_tasks`,
/// `delete_cascade`, `wipe_all`) are atomic: either every write lands or
/// none do.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Persist a schedule together with its initial tasks.
    async fn insert_with_tasks(&self, schedule: &Schedule, tasks: &[Task]) -> Result<()>;

    /// Persist a schedule update, optionally replacing its entire task set.
    ///
    /// Every id in `replacement` must reference an existing task; otherwise
    /// the whole write fails with `NotFound` and nothing changes.
    async fn update_with_tasks(
        &self,
        schedule: &Schedule,
        replacement: Option<&[TaskReplacement]>,
    ) -> Result<()>;

    /// Remove a schedule and its dependent visit log and tasks,
    /// dependents first.
    async fn delete_cascade(&self, schedule_id: &str) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Schedule>>;

    /// Load a schedule joined with participants, visit log and tasks.
    async fn find_bundle(&self, id: &str) -> Result<Option<ScheduleBundle>>;

    /// All schedules assigned to a caregiver, for conflict checking.
    async fn list_for_caregiver(&self, caregiver_id: &str) -> Result<Vec<Schedule>>;

    /// Filtered list ordered by start time, optionally restricted to a
    /// calendar-day range.
    async fn list_bundles(
        &self,
        filter: &ScheduleFilter,
        day: Option<TimeWindow>,
    ) -> Result<Vec<ScheduleBundle>>;

    /// Count schedules matching the participant filter.
    async fn count(&self, filter: &ScheduleFilter) -> Result<i64>;

    /// Count schedules in the day range whose visit has ended.
    async fn count_completed(&self, filter: &ScheduleFilter, day: TimeWindow) -> Result<i64>;

    /// Count schedules whose window has closed without a completed visit
    /// (no visit at all, or started and never ended).
    async fn count_missed(&self, filter: &ScheduleFilter, now: DateTime<Utc>) -> Result<i64>;

    /// The caregiver's schedule whose window contains `now` and whose visit
    /// is started but not yet ended, earliest first.
    async fn find_started(
        &self,
        caregiver_id: &str,
        day: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduleBundle>>;

    /// Remove all schedules, visit logs, tasks and users (dependents
    /// first). Demo-data support.
    async fn wipe_all(&self) -> Result<()>;
}

/// Persistence for visit execution records.
#[async_trait]
pub trait VisitLogRepository: Send + Sync {
    async fn find_by_schedule(&self, schedule_id: &str) -> Result<Option<VisitLog>>;

    /// Record a visit start as a single conditional write keyed by the
    /// schedule reference.
    ///
    /// Exactly one concurrent caller may create the record; any other
    /// fails with `VisitAlreadyStarted` rather than overwriting.
    async fn try_start(&self, visit: &VisitLog) -> Result<()>;

    /// Record the end instant and coordinate of a started visit.
    async fn record_end(
        &self,
        schedule_id: &str,
        end_time: DateTime<Utc>,
        end_point: GeoPoint,
    ) -> Result<()>;

    /// Delete the visit record (cancellation).
    async fn delete_by_schedule(&self, schedule_id: &str) -> Result<()>;
}

/// Persistence for schedule tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, task: &Task) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>>;

    async fn list_by_schedule(&self, schedule_id: &str) -> Result<Vec<Task>>;

    /// Record a completion outcome. Completed tasks clear any stored
    /// reason; incomplete tasks store the supplied one.
    async fn update_status(
        &self,
        id: &str,
        completed: bool,
        reason: Option<&str>,
    ) -> Result<Task>;
}

/// Persistence for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn insert(&self, user: &User) -> Result<()>;
}

/// Single process-wide time authority.
///
/// Injectable so tests can pin "now"; production uses the system clock.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Fire-and-forget operator error reporting.
///
/// Delivery failures must never fail the calling operation.
#[async_trait]
pub trait FailureNotifier: Send + Sync {
    /// Report an unexpected failure in `operation`.
    async fn report_failure(&self, operation: &str, message: &str);
}

/// Optional coordinate-to-address enrichment, consumed only for display.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Resolve a human-readable address; `None` on any failure.
    async fn reverse(&self, point: GeoPoint) -> Option<String>;
}
