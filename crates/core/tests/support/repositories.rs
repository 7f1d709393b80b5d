//! Mock repository implementations for testing
//!
//! Provides a shared in-memory store behind all core repository ports,
//! enabling deterministic service tests without database dependencies.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use carelog_core::scheduling::ports::{
    ScheduleRepository, TaskRepository, UserRepository, VisitLogRepository,
};
use carelog_domain::{
    CarelogError, GeoPoint, Result as DomainResult, Schedule, ScheduleBundle, ScheduleFilter,
    Task, TaskReplacement, TimeWindow, User, VisitLog,
};

/// Shared in-memory backing state for all mock repositories.
#[derive(Default)]
pub struct InMemoryStore {
    pub schedules: Mutex<Vec<Schedule>>,
    pub visits: Mutex<Vec<VisitLog>>,
    pub tasks: Mutex<Vec<Task>>,
    pub users: Mutex<Vec<User>>,
    /// When set, every repository call fails with a database error. Used to
    /// exercise the notifier path.
    pub database_down: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn add_schedule(&self, schedule: Schedule) {
        self.schedules.lock().unwrap().push(schedule);
    }

    pub fn add_task(&self, task: Task) {
        self.tasks.lock().unwrap().push(task);
    }

    pub fn add_visit(&self, visit: VisitLog) {
        self.visits.lock().unwrap().push(visit);
    }

    fn check_up(&self) -> DomainResult<()> {
        if self.database_down.load(Ordering::SeqCst) {
            return Err(CarelogError::Database("connection refused".to_owned()));
        }
        Ok(())
    }

    fn bundle_for(&self, schedule: &Schedule) -> Option<ScheduleBundle> {
        let users = self.users.lock().unwrap();
        let caregiver = users.iter().find(|u| u.id == schedule.caregiver_id)?.clone();
        let client = users.iter().find(|u| u.id == schedule.client_id)?.clone();
        drop(users);

        let visit_log = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.schedule_id == schedule.id)
            .cloned();
        let tasks = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.schedule_id == schedule.id)
            .cloned()
            .collect();

        Some(ScheduleBundle { schedule: schedule.clone(), caregiver, client, visit_log, tasks })
    }

    fn matches_filter(schedule: &Schedule, filter: &ScheduleFilter) -> bool {
        filter.caregiver_id.as_ref().map_or(true, |id| *id == schedule.caregiver_id)
            && filter.client_id.as_ref().map_or(true, |id| *id == schedule.client_id)
    }
}

/// `ScheduleRepository` over the shared store.
#[derive(Clone)]
pub struct MockScheduleRepository {
    store: Arc<InMemoryStore>,
}

impl MockScheduleRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ScheduleRepository for MockScheduleRepository {
    async fn insert_with_tasks(&self, schedule: &Schedule, tasks: &[Task]) -> DomainResult<()> {
        self.store.check_up()?;
        self.store.schedules.lock().unwrap().push(schedule.clone());
        self.store.tasks.lock().unwrap().extend(tasks.iter().cloned());
        Ok(())
    }

    async fn update_with_tasks(
        &self,
        schedule: &Schedule,
        replacement: Option<&[TaskReplacement]>,
    ) -> DomainResult<()> {
        self.store.check_up()?;

        // Mirror the transactional contract: verify ids before any write.
        if let Some(replacement) = replacement {
            let tasks = self.store.tasks.lock().unwrap();
            for task in replacement {
                if !tasks.iter().any(|t| t.id == task.id) {
                    return Err(CarelogError::NotFound(format!(
                        "task with the id {}",
                        task.id
                    )));
                }
            }
        }

        let mut schedules = self.store.schedules.lock().unwrap();
        let Some(slot) = schedules.iter_mut().find(|s| s.id == schedule.id) else {
            return Err(CarelogError::NotFound("schedule".to_owned()));
        };
        *slot = schedule.clone();
        drop(schedules);

        if let Some(replacement) = replacement {
            let mut tasks = self.store.tasks.lock().unwrap();
            tasks.retain(|t| t.schedule_id != schedule.id);
            tasks.extend(replacement.iter().map(|r| Task {
                id: Uuid::now_v7().to_string(),
                schedule_id: schedule.id.clone(),
                title: r.title.clone(),
                description: r.description.clone(),
                completed: None,
                reason: None,
            }));
        }

        Ok(())
    }

    async fn delete_cascade(&self, schedule_id: &str) -> DomainResult<()> {
        self.store.check_up()?;
        self.store.visits.lock().unwrap().retain(|v| v.schedule_id != schedule_id);
        self.store.tasks.lock().unwrap().retain(|t| t.schedule_id != schedule_id);
        self.store.schedules.lock().unwrap().retain(|s| s.id != schedule_id);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Schedule>> {
        self.store.check_up()?;
        Ok(self.store.schedules.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn find_bundle(&self, id: &str) -> DomainResult<Option<ScheduleBundle>> {
        self.store.check_up()?;
        let schedule = self.store.schedules.lock().unwrap().iter().find(|s| s.id == id).cloned();
        Ok(schedule.and_then(|s| self.store.bundle_for(&s)))
    }

    async fn list_for_caregiver(&self, caregiver_id: &str) -> DomainResult<Vec<Schedule>> {
        self.store.check_up()?;
        Ok(self
            .store
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.caregiver_id == caregiver_id)
            .cloned()
            .collect())
    }

    async fn list_bundles(
        &self,
        filter: &ScheduleFilter,
        day: Option<TimeWindow>,
    ) -> DomainResult<Vec<ScheduleBundle>> {
        self.store.check_up()?;

        let mut schedules: Vec<Schedule> = self
            .store
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| InMemoryStore::matches_filter(s, filter))
            .filter(|s| {
                day.map_or(true, |d| {
                    s.date >= d.start.date_naive() && s.date <= d.end.date_naive()
                })
            })
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.start_time);

        Ok(schedules.iter().filter_map(|s| self.store.bundle_for(s)).collect())
    }

    async fn count(&self, filter: &ScheduleFilter) -> DomainResult<i64> {
        self.store.check_up()?;
        Ok(self
            .store
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| InMemoryStore::matches_filter(s, filter))
            .count() as i64)
    }

    async fn count_completed(
        &self,
        filter: &ScheduleFilter,
        day: TimeWindow,
    ) -> DomainResult<i64> {
        self.store.check_up()?;
        let visits = self.store.visits.lock().unwrap();
        Ok(self
            .store
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| InMemoryStore::matches_filter(s, filter))
            .filter(|s| s.date >= day.start.date_naive() && s.date <= day.end.date_naive())
            .filter(|s| {
                visits
                    .iter()
                    .any(|v| v.schedule_id == s.id && v.end_time.is_some())
            })
            .count() as i64)
    }

    async fn count_missed(
        &self,
        filter: &ScheduleFilter,
        now: DateTime<Utc>,
    ) -> DomainResult<i64> {
        self.store.check_up()?;
        let visits = self.store.visits.lock().unwrap();
        Ok(self
            .store
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| InMemoryStore::matches_filter(s, filter))
            .filter(|s| s.end_time < now)
            .filter(|s| {
                let visit = visits.iter().find(|v| v.schedule_id == s.id);
                visit.map_or(true, |v| v.end_time.is_none())
            })
            .count() as i64)
    }

    async fn find_started(
        &self,
        caregiver_id: &str,
        day: TimeWindow,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<ScheduleBundle>> {
        self.store.check_up()?;
        let visits = self.store.visits.lock().unwrap();
        let mut candidates: Vec<Schedule> = self
            .store
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.caregiver_id == caregiver_id)
            .filter(|s| s.date >= day.start.date_naive() && s.date <= day.end.date_naive())
            .filter(|s| s.start_time <= now && s.end_time >= now)
            .filter(|s| {
                visits
                    .iter()
                    .any(|v| v.schedule_id == s.id && v.end_time.is_none())
            })
            .cloned()
            .collect();
        drop(visits);
        candidates.sort_by_key(|s| s.start_time);

        Ok(candidates.first().and_then(|s| self.store.bundle_for(s)))
    }

    async fn wipe_all(&self) -> DomainResult<()> {
        self.store.check_up()?;
        self.store.visits.lock().unwrap().clear();
        self.store.tasks.lock().unwrap().clear();
        self.store.schedules.lock().unwrap().clear();
        self.store.users.lock().unwrap().clear();
        Ok(())
    }
}

/// `VisitLogRepository` over the shared store.
#[derive(Clone)]
pub struct MockVisitLogRepository {
    store: Arc<InMemoryStore>,
}

impl MockVisitLogRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl VisitLogRepository for MockVisitLogRepository {
    async fn find_by_schedule(&self, schedule_id: &str) -> DomainResult<Option<VisitLog>> {
        self.store.check_up()?;
        Ok(self
            .store
            .visits
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.schedule_id == schedule_id)
            .cloned())
    }

    async fn try_start(&self, visit: &VisitLog) -> DomainResult<()> {
        self.store.check_up()?;
        let mut visits = self.store.visits.lock().unwrap();
        // One record per schedule: the conditional write loses to any
        // existing row, like the unique constraint it models.
        if visits.iter().any(|v| v.schedule_id == visit.schedule_id) {
            return Err(CarelogError::VisitAlreadyStarted);
        }
        visits.push(visit.clone());
        Ok(())
    }

    async fn record_end(
        &self,
        schedule_id: &str,
        end_time: DateTime<Utc>,
        end_point: GeoPoint,
    ) -> DomainResult<()> {
        self.store.check_up()?;
        let mut visits = self.store.visits.lock().unwrap();
        let Some(visit) = visits
            .iter_mut()
            .find(|v| v.schedule_id == schedule_id && v.end_time.is_none())
        else {
            return Err(CarelogError::VisitAlreadyEnded);
        };
        visit.end_time = Some(end_time);
        visit.end_point = Some(end_point);
        Ok(())
    }

    async fn delete_by_schedule(&self, schedule_id: &str) -> DomainResult<()> {
        self.store.check_up()?;
        self.store.visits.lock().unwrap().retain(|v| v.schedule_id != schedule_id);
        Ok(())
    }
}

/// `TaskRepository` over the shared store.
#[derive(Clone)]
pub struct MockTaskRepository {
    store: Arc<InMemoryStore>,
}

impl MockTaskRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn insert(&self, task: &Task) -> DomainResult<()> {
        self.store.check_up()?;
        self.store.tasks.lock().unwrap().push(task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Task>> {
        self.store.check_up()?;
        Ok(self.store.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_schedule(&self, schedule_id: &str) -> DomainResult<Vec<Task>> {
        self.store.check_up()?;
        Ok(self
            .store
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.schedule_id == schedule_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: &str,
        completed: bool,
        reason: Option<&str>,
    ) -> DomainResult<Task> {
        self.store.check_up()?;
        let mut tasks = self.store.tasks.lock().unwrap();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Err(CarelogError::NotFound("task".to_owned()));
        };
        task.completed = Some(completed);
        task.reason = reason.map(str::to_owned);
        Ok(task.clone())
    }
}

/// `UserRepository` over the shared store.
#[derive(Clone)]
pub struct MockUserRepository {
    store: Arc<InMemoryStore>,
}

impl MockUserRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        self.store.check_up()?;
        Ok(self.store.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: &User) -> DomainResult<()> {
        self.store.check_up()?;
        self.store.users.lock().unwrap().push(user.clone());
        Ok(())
    }
}
