//! Scheduling service - core business logic
//!
//! Orchestrates the pure validators against the persistence ports. Every
//! operation validates before it writes, so a rejected request never leaves
//! partial state behind. Unexpected infrastructure failures are reported to
//! the operator notifier and surfaced as a generic internal error.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};
use uuid::Uuid;

use carelog_domain::constants::{DEMO_SCHEDULE_COUNT, DEMO_SCHEDULE_DURATION_MINUTES};
use carelog_domain::{
    CarelogError, DayStats, GeoPoint, Result, Schedule, ScheduleBundle, ScheduleDetail,
    ScheduleDraft, ScheduleFilter, ScheduleListPage, SchedulePatch, ScheduleSummary, ServiceKind,
    Task, TaskDraft, User, UserRole, VisitLog, VisitWindow,
};

use super::ports::{
    AddressLookup, Clock, FailureNotifier, ScheduleRepository, TaskRepository, UserRepository,
    VisitLogRepository,
};
use super::{conflict, geofence, lifecycle, status, time_window};

/// Scheduling service
pub struct SchedulingService {
    schedules: Arc<dyn ScheduleRepository>,
    visits: Arc<dyn VisitLogRepository>,
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    notifier: Option<Arc<dyn FailureNotifier>>,
    addresses: Option<Arc<dyn AddressLookup>>,
}

impl SchedulingService {
    /// Create a new scheduling service over the given ports.
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        visits: Arc<dyn VisitLogRepository>,
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { schedules, visits, tasks, users, clock, notifier: None, addresses: None }
    }

    /// Attach an operator failure notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn FailureNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Attach a reverse-geocoding lookup for display enrichment.
    #[must_use]
    pub fn with_address_lookup(mut self, addresses: Arc<dyn AddressLookup>) -> Self {
        self.addresses = Some(addresses);
        self
    }

    /// Book a new schedule after role, conflict and ordering checks.
    pub async fn create_schedule(&self, draft: ScheduleDraft) -> Result<ScheduleBundle> {
        let result = self.create_schedule_impl(draft).await;
        self.finish("create_schedule", result).await
    }

    /// Apply a partial update to an existing schedule, optionally replacing
    /// its task set in the same transaction.
    pub async fn edit_schedule(&self, id: &str, patch: SchedulePatch) -> Result<ScheduleBundle> {
        let result = self.edit_schedule_impl(id, patch).await;
        self.finish("edit_schedule", result).await
    }

    /// Remove a schedule and its dependents.
    pub async fn delete_schedule(&self, id: &str) -> Result<()> {
        let result = self.delete_schedule_impl(id).await;
        self.finish("delete_schedule", result).await
    }

    /// Load a schedule with participants, tasks, derived status and the
    /// visit-start address when available.
    pub async fn get_schedule(&self, id: &str) -> Result<ScheduleDetail> {
        let result = self.get_schedule_impl(id).await;
        self.finish("get_schedule", result).await
    }

    /// List schedules, optionally restricted to the current calendar day
    /// with aggregate counts.
    pub async fn list_schedules(&self, filter: &ScheduleFilter) -> Result<ScheduleListPage> {
        let result = self.list_schedules_impl(filter).await;
        self.finish("list_schedules", result).await
    }

    /// The caregiver's currently in-flight visit, if any.
    pub async fn started_schedule(&self, caregiver_id: &str) -> Result<Option<ScheduleSummary>> {
        let result = self.started_schedule_impl(caregiver_id).await;
        self.finish("started_schedule", result).await
    }

    /// Start the visit for a schedule from the actor's reported position.
    pub async fn start_visit(&self, schedule_id: &str, point: GeoPoint) -> Result<VisitLog> {
        let result = self.start_visit_impl(schedule_id, point).await;
        self.finish("start_visit", result).await
    }

    /// End the visit for a schedule from the actor's reported position.
    pub async fn end_visit(&self, schedule_id: &str, point: GeoPoint) -> Result<VisitLog> {
        let result = self.end_visit_impl(schedule_id, point).await;
        self.finish("end_visit", result).await
    }

    /// Cancel an in-flight visit, removing its record entirely.
    pub async fn cancel_visit(&self, schedule_id: &str) -> Result<()> {
        let result = self.cancel_visit_impl(schedule_id).await;
        self.finish("cancel_visit", result).await
    }

    /// Record a completion outcome for a task.
    pub async fn update_task_status(
        &self,
        task_id: &str,
        completed: bool,
        reason: Option<String>,
    ) -> Result<Task> {
        let result = self.update_task_status_impl(task_id, completed, reason).await;
        self.finish("update_task_status", result).await
    }

    /// Attach a new task to an existing schedule.
    pub async fn create_task(&self, schedule_id: &str, draft: TaskDraft) -> Result<Task> {
        let result = self.create_task_impl(schedule_id, draft).await;
        self.finish("create_task", result).await
    }

    /// Wipe and regenerate the demo dataset around the given location.
    pub async fn seed_demo_data(&self, point: GeoPoint) -> Result<()> {
        let result = self.seed_demo_data_impl(point).await;
        self.finish("seed_demo_data", result).await
    }

    /* ---------------------------------------------------------------- */
    /* Operation bodies */
    /* ---------------------------------------------------------------- */

    async fn create_schedule_impl(&self, draft: ScheduleDraft) -> Result<ScheduleBundle> {
        if draft.caregiver_id == draft.client_id {
            return Err(CarelogError::SameUser);
        }

        let caregiver =
            self.ensure_role(&draft.caregiver_id, UserRole::Caregiver, "caregiver").await?;
        let client = self.ensure_role(&draft.client_id, UserRole::Client, "client").await?;

        let date = time_window::parse_date(&draft.date)?;
        let start_time = time_window::combine(date, &draft.start_time)?;
        let end_time = time_window::combine(date, &draft.end_time)?;

        let existing = self.schedules.list_for_caregiver(&draft.caregiver_id).await?;
        let candidate = conflict::Candidate {
            date,
            window: carelog_domain::TimeWindow { start: start_time, end: end_time },
            exclude_schedule_id: None,
        };
        if conflict::has_conflict(&existing, &candidate) {
            return Err(CarelogError::CaregiverUnavailable);
        }

        time_window::validate_ordering(start_time, end_time)?;

        let now = self.clock.now();
        let schedule = Schedule {
            id: Uuid::now_v7().to_string(),
            date,
            start_time,
            end_time,
            caregiver_id: draft.caregiver_id,
            client_id: draft.client_id,
            service: draft.service,
            location: draft.location,
            service_notes: draft.service_notes,
            created_at: now,
        };
        let tasks = draft
            .tasks
            .into_iter()
            .map(|t| new_task(&schedule.id, t.title, t.description))
            .collect::<Vec<_>>();

        self.schedules.insert_with_tasks(&schedule, &tasks).await?;
        info!(schedule_id = %schedule.id, caregiver_id = %schedule.caregiver_id, "schedule created");

        Ok(ScheduleBundle { schedule, caregiver, client, visit_log: None, tasks })
    }

    async fn edit_schedule_impl(&self, id: &str, patch: SchedulePatch) -> Result<ScheduleBundle> {
        let existing = self
            .schedules
            .find_by_id(id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("schedule".to_owned()))?;

        let caregiver_id = patch.caregiver_id.clone().unwrap_or_else(|| existing.caregiver_id.clone());
        let client_id = patch.client_id.clone().unwrap_or_else(|| existing.client_id.clone());

        if caregiver_id == client_id {
            return Err(CarelogError::SameUser);
        }

        // Roles are re-validated only for participants actually supplied.
        if patch.caregiver_id.is_some() {
            self.ensure_role(&caregiver_id, UserRole::Caregiver, "caregiver").await?;
        }
        if patch.client_id.is_some() {
            self.ensure_role(&client_id, UserRole::Client, "client").await?;
        }

        let date = match &patch.date {
            Some(literal) => time_window::parse_date(literal)?,
            None => existing.date,
        };
        let start_time = match &patch.start_time {
            Some(literal) => time_window::combine(date, literal)?,
            None => existing.start_time,
        };
        let end_time = match &patch.end_time {
            Some(literal) => time_window::combine(date, literal)?,
            None => existing.end_time,
        };

        let others = self.schedules.list_for_caregiver(&caregiver_id).await?;
        let candidate = conflict::Candidate {
            date,
            window: carelog_domain::TimeWindow { start: start_time, end: end_time },
            exclude_schedule_id: Some(id),
        };
        if conflict::has_conflict(&others, &candidate) {
            return Err(CarelogError::CaregiverUnavailable);
        }

        if patch.date.is_some() || patch.start_time.is_some() || patch.end_time.is_some() {
            time_window::validate_ordering(start_time, end_time)?;
        }

        let merged = Schedule {
            id: existing.id.clone(),
            date,
            start_time,
            end_time,
            caregiver_id,
            client_id,
            service: patch.service.unwrap_or(existing.service),
            location: patch.location.or(existing.location),
            service_notes: patch.service_notes.unwrap_or(existing.service_notes),
            created_at: existing.created_at,
        };

        self.schedules.update_with_tasks(&merged, patch.tasks.as_deref()).await?;
        info!(schedule_id = %merged.id, "schedule updated");

        self.schedules
            .find_bundle(id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("schedule".to_owned()))
    }

    async fn delete_schedule_impl(&self, id: &str) -> Result<()> {
        self.schedules
            .find_by_id(id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("schedule".to_owned()))?;

        self.schedules.delete_cascade(id).await?;
        info!(schedule_id = %id, "schedule deleted");
        Ok(())
    }

    async fn get_schedule_impl(&self, id: &str) -> Result<ScheduleDetail> {
        let now = self.clock.now();
        let bundle = self
            .schedules
            .find_bundle(id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("schedule".to_owned()))?;

        let derived = status::resolve(bundle.schedule.window(), bundle.visit_log.as_ref(), now);
        let visit_address = match &bundle.visit_log {
            Some(visit) => self.resolve_address(Some(visit.start_point)).await,
            None => None,
        };

        Ok(ScheduleDetail { bundle, status: derived, visit_address })
    }

    async fn list_schedules_impl(&self, filter: &ScheduleFilter) -> Result<ScheduleListPage> {
        if let Some(caregiver_id) = &filter.caregiver_id {
            self.ensure_role(caregiver_id, UserRole::Caregiver, "user").await?;
        }
        if let Some(client_id) = &filter.client_id {
            self.ensure_role(client_id, UserRole::Client, "user").await?;
        }

        let now = self.clock.now();
        let day = filter.today.then(|| time_window::day_range(now));

        let stats = match day {
            Some(day) => {
                let total = self.schedules.count(filter).await?;
                let completed = self.schedules.count_completed(filter, day).await?;
                let missed = self.schedules.count_missed(filter, now).await?;
                Some(DayStats { total, completed, missed, upcoming: total - completed - missed })
            }
            None => None,
        };

        let mut bundles = self.schedules.list_bundles(filter, day).await?;
        if filter.today && bundles.is_empty() {
            // Degraded-but-non-empty beats an empty page: drop the day
            // restriction when today has nothing.
            bundles = self.schedules.list_bundles(filter, None).await?;
        }

        let total_schedules = self.schedules.count(filter).await?;

        let mut list = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            list.push(self.summarize(bundle, now).await);
        }
        status::sort_by_status(&mut list);

        Ok(ScheduleListPage { list, stats, total_schedules })
    }

    async fn started_schedule_impl(&self, caregiver_id: &str) -> Result<Option<ScheduleSummary>> {
        let now = self.clock.now();
        let day = time_window::day_range(now);

        match self.schedules.find_started(caregiver_id, day, now).await? {
            Some(bundle) => Ok(Some(self.summarize(bundle, now).await)),
            None => Ok(None),
        }
    }

    async fn start_visit_impl(&self, schedule_id: &str, point: GeoPoint) -> Result<VisitLog> {
        let now = self.clock.now();
        let schedule = self
            .schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("schedule".to_owned()))?;

        geofence::check_proximity(schedule.location, point)?;

        let existing = self.visits.find_by_schedule(schedule_id).await?;
        lifecycle::check_start(schedule.window(), existing.as_ref(), now)?;

        let visit = VisitLog {
            id: Uuid::now_v7().to_string(),
            schedule_id: schedule.id,
            start_time: now,
            start_point: point,
            end_time: None,
            end_point: None,
        };
        // The conditional write closes the race two concurrent starters
        // would otherwise win together.
        self.visits.try_start(&visit).await?;
        info!(schedule_id = %visit.schedule_id, "visit started");

        Ok(visit)
    }

    async fn end_visit_impl(&self, schedule_id: &str, point: GeoPoint) -> Result<VisitLog> {
        let now = self.clock.now();
        let schedule = self
            .schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("schedule".to_owned()))?;

        geofence::check_proximity(schedule.location, point)?;

        let visit = self.visits.find_by_schedule(schedule_id).await?;
        lifecycle::check_end(visit.as_ref(), now)?;

        let tasks = self.tasks.list_by_schedule(schedule_id).await?;
        lifecycle::check_tasks_complete(&tasks)?;

        self.visits.record_end(schedule_id, now, point).await?;
        info!(schedule_id = %schedule_id, "visit ended");

        let mut visit = visit.ok_or(CarelogError::VisitNotStarted)?;
        visit.end_time = Some(now);
        visit.end_point = Some(point);
        Ok(visit)
    }

    async fn cancel_visit_impl(&self, schedule_id: &str) -> Result<()> {
        self.schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("schedule".to_owned()))?;

        let visit = self.visits.find_by_schedule(schedule_id).await?;
        lifecycle::check_cancel(visit.as_ref())?;

        self.visits.delete_by_schedule(schedule_id).await?;
        info!(schedule_id = %schedule_id, "visit cancelled");
        Ok(())
    }

    async fn update_task_status_impl(
        &self,
        task_id: &str,
        completed: bool,
        reason: Option<String>,
    ) -> Result<Task> {
        let reason_missing = reason.as_deref().map_or(true, |r| r.trim().is_empty());
        if !completed && reason_missing {
            return Err(CarelogError::ReasonRequired);
        }

        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("task".to_owned()))?;

        // Completed tasks never keep a stale excuse around.
        let reason = if completed { None } else { reason };
        self.tasks.update_status(task_id, completed, reason.as_deref()).await
    }

    async fn create_task_impl(&self, schedule_id: &str, draft: TaskDraft) -> Result<Task> {
        self.schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| CarelogError::NotFound("schedule".to_owned()))?;

        let task = new_task(schedule_id, draft.title, draft.description);
        self.tasks.insert(&task).await?;
        Ok(task)
    }

    async fn seed_demo_data_impl(&self, point: GeoPoint) -> Result<()> {
        let now = self.clock.now();

        self.schedules.wipe_all().await?;

        let caregiver = demo_user(
            "Caregiver",
            "caregiver1@example.com",
            "123 Main St, Springfield, IL 62704",
            "081234567890",
            UserRole::Caregiver,
            "https://randomuser.me/api/portraits/women/40.jpg",
            now,
        );
        let client = demo_user(
            "Client",
            "client1@example.com",
            "789 Oak Avenue, San Francisco, CA 94102",
            "089876543210",
            UserRole::Client,
            "https://randomuser.me/api/portraits/women/25.jpg",
            now,
        );
        self.users.insert(&caregiver).await?;
        self.users.insert(&client).await?;

        let services = ServiceKind::all();
        for i in 0..DEMO_SCHEDULE_COUNT {
            let start_time = now + Duration::hours(i as i64);
            let end_time = start_time + Duration::minutes(DEMO_SCHEDULE_DURATION_MINUTES);

            let schedule = Schedule {
                id: Uuid::now_v7().to_string(),
                date: now.date_naive(),
                start_time,
                end_time,
                caregiver_id: caregiver.id.clone(),
                client_id: client.id.clone(),
                service: services[i % services.len()],
                location: Some(point),
                service_notes: format!("Demo schedule {}", i + 1),
                created_at: now,
            };
            let tasks = vec![
                new_task(&schedule.id, format!("Task {}A", i + 1), "Do something important".to_owned()),
                new_task(&schedule.id, format!("Task {}B", i + 1), "Another task description".to_owned()),
            ];
            self.schedules.insert_with_tasks(&schedule, &tasks).await?;
        }

        info!(count = DEMO_SCHEDULE_COUNT, "demo data generated");
        Ok(())
    }

    /* ---------------------------------------------------------------- */
    /* Shared helpers */
    /* ---------------------------------------------------------------- */

    /// Load a user and require the expected role. `label` names the entity
    /// in not-found messages ("caregiver", "client", "user").
    async fn ensure_role(&self, user_id: &str, role: UserRole, label: &str) -> Result<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CarelogError::NotFound(label.to_owned()))?;

        if user.role != role {
            return Err(CarelogError::RoleMismatch { expected: role.label().to_owned() });
        }

        Ok(user)
    }

    async fn resolve_address(&self, point: Option<GeoPoint>) -> Option<String> {
        match (&self.addresses, point) {
            (Some(lookup), Some(point)) => lookup.reverse(point).await,
            _ => None,
        }
    }

    async fn summarize(&self, bundle: ScheduleBundle, now: DateTime<Utc>) -> ScheduleSummary {
        let address = self.resolve_address(bundle.schedule.location).await;
        let derived = status::resolve(bundle.schedule.window(), bundle.visit_log.as_ref(), now);

        ScheduleSummary {
            id: bundle.schedule.id,
            date: bundle.schedule.date,
            client_name: bundle.client.name,
            client_picture: bundle.client.picture,
            caregiver_id: bundle.caregiver.id,
            caregiver_name: bundle.caregiver.name,
            shift: carelog_domain::TimeWindow {
                start: bundle.schedule.start_time,
                end: bundle.schedule.end_time,
            },
            visit: bundle
                .visit_log
                .as_ref()
                .map(|v| VisitWindow { start: v.start_time, end: v.end_time }),
            service: bundle.schedule.service,
            status: derived,
            address,
        }
    }

    /// Route unexpected failures to the operator notifier and collapse them
    /// into a generic internal error; validation outcomes pass through.
    async fn finish<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        match result {
            Err(err) if err.is_unexpected() => {
                error!(operation, error = %err, "scheduling operation failed unexpectedly");
                if let Some(notifier) = &self.notifier {
                    notifier.report_failure(operation, &err.to_string()).await;
                }
                Err(CarelogError::Internal(operation.to_owned()))
            }
            other => other,
        }
    }
}

fn new_task(schedule_id: &str, title: String, description: String) -> Task {
    Task {
        id: Uuid::now_v7().to_string(),
        schedule_id: schedule_id.to_owned(),
        title,
        description,
        completed: None,
        reason: None,
    }
}

fn demo_user(
    name: &str,
    email: &str,
    address: &str,
    phone: &str,
    role: UserRole,
    picture: &str,
    now: DateTime<Utc>,
) -> User {
    User {
        id: Uuid::now_v7().to_string(),
        name: name.to_owned(),
        email: email.to_owned(),
        address: Some(address.to_owned()),
        phone: Some(phone.to_owned()),
        role,
        picture: Some(picture.to_owned()),
        created_at: now,
    }
}
