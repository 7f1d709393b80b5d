//! Cross-repository integration tests on a real SQLite database
//!
//! Wires the actual repositories into the core `SchedulingService` and
//! drives whole flows: booking with conflict detection, the visit
//! lifecycle against the unique-constraint start write, task gating, and
//! the today list aggregates.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use carelog_core::scheduling::ports::Clock;
use carelog_core::SchedulingService;
use carelog_domain::{
    CarelogError, GeoPoint, ScheduleDraft, ScheduleFilter, ScheduleStatus, ServiceKind,
    TaskDraft, User, UserRole,
};
use carelog_infra::database::{
    DbManager, SqliteScheduleRepository, SqliteTaskRepository, SqliteUserRepository,
    SqliteVisitLogRepository,
};

struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    fn at(instant: &str) -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(instant.parse().unwrap()) })
    }

    fn set(&self, instant: &str) {
        *self.now.lock().unwrap() = instant.parse().unwrap();
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

struct Stack {
    service: SchedulingService,
    users: SqliteUserRepository,
    visits: Arc<SqliteVisitLogRepository>,
    clock: Arc<TestClock>,
    _temp: TempDir,
}

fn stack(now: &str) -> Stack {
    let temp = TempDir::new().unwrap();
    let manager = DbManager::new(temp.path().join("carelog.db"), 8).unwrap();
    manager.run_migrations().unwrap();
    let pool = manager.pool().clone();

    let clock = TestClock::at(now);
    let visits = Arc::new(SqliteVisitLogRepository::new(pool.clone()));
    let service = SchedulingService::new(
        Arc::new(SqliteScheduleRepository::new(pool.clone())),
        visits.clone(),
        Arc::new(SqliteTaskRepository::new(pool.clone())),
        Arc::new(SqliteUserRepository::new(pool.clone())),
        clock.clone(),
    );

    Stack { service, users: SqliteUserRepository::new(pool), visits, clock, _temp: temp }
}

fn person(name: &str, role: UserRole) -> User {
    User {
        id: format!("{}-{}", role.label(), name.to_lowercase()),
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase()),
        address: None,
        phone: None,
        role,
        picture: None,
        created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
    }
}

async fn seed_pair(stack: &Stack) -> (String, String) {
    use carelog_core::UserRepository;
    let caregiver = person("Grace", UserRole::Caregiver);
    let client = person("Henry", UserRole::Client);
    stack.users.insert(&caregiver).await.unwrap();
    stack.users.insert(&client).await.unwrap();
    (caregiver.id, client.id)
}

fn draft(caregiver: &str, client: &str, start: &str, end: &str) -> ScheduleDraft {
    ScheduleDraft {
        date: "2025-03-14".to_owned(),
        start_time: start.to_owned(),
        end_time: end.to_owned(),
        caregiver_id: caregiver.to_owned(),
        client_id: client.to_owned(),
        service: ServiceKind::PersonalCare,
        location: Some(GeoPoint { lat: 52.52, lng: 13.405 }),
        service_notes: "integration coverage visit".to_owned(),
        tasks: vec![TaskDraft {
            title: "Morning medication".to_owned(),
            description: "With breakfast".to_owned(),
        }],
    }
}

fn on_site() -> GeoPoint {
    GeoPoint { lat: 52.52, lng: 13.405 }
}

#[tokio::test]
async fn booking_conflicts_are_enforced_by_real_queries() {
    let s = stack("2025-03-14T08:00:00Z");
    let (caregiver, client) = seed_pair(&s).await;

    s.service.create_schedule(draft(&caregiver, &client, "09:00:00", "10:00:00")).await.unwrap();

    let err = s
        .service
        .create_schedule(draft(&caregiver, &client, "09:30:00", "10:30:00"))
        .await
        .unwrap_err();
    assert_eq!(err, CarelogError::CaregiverUnavailable);

    s.service.create_schedule(draft(&caregiver, &client, "10:00:00", "11:00:00")).await.unwrap();
}

#[tokio::test]
async fn full_visit_lifecycle_runs_against_sqlite() {
    let s = stack("2025-03-14T08:50:00Z");
    let (caregiver, client) = seed_pair(&s).await;

    let bundle = s
        .service
        .create_schedule(draft(&caregiver, &client, "09:00:00", "10:00:00"))
        .await
        .unwrap();
    let schedule_id = bundle.schedule.id.clone();
    let task_id = bundle.tasks[0].id.clone();

    // Start inside the buffer window.
    s.service.start_visit(&schedule_id, on_site()).await.unwrap();

    // Tasks still open: the end is gated.
    s.clock.set("2025-03-14T09:40:00Z");
    assert_eq!(
        s.service.end_visit(&schedule_id, on_site()).await.unwrap_err(),
        CarelogError::IncompleteTasks { outstanding: 1 }
    );

    s.service.update_task_status(&task_id, true, None).await.unwrap();
    let visit = s.service.end_visit(&schedule_id, on_site()).await.unwrap();
    assert!(visit.end_time.is_some());

    let detail = s.service.get_schedule(&schedule_id).await.unwrap();
    assert_eq!(detail.status, ScheduleStatus::Completed);
}

#[tokio::test]
async fn concurrent_starts_resolve_to_one_winner() {
    let s = stack("2025-03-14T09:00:00Z");
    let (caregiver, client) = seed_pair(&s).await;

    let bundle = s
        .service
        .create_schedule(draft(&caregiver, &client, "09:00:00", "10:00:00"))
        .await
        .unwrap();
    let id = bundle.schedule.id;

    // Both requests pass validation against the same pre-insert snapshot;
    // the unique constraint decides the winner.
    let (a, b) = tokio::join!(
        s.service.start_visit(&id, on_site()),
        s.service.start_visit(&id, on_site()),
    );

    let outcomes = [a, b];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent start may succeed");
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(CarelogError::VisitAlreadyStarted))));

    // One record, never overwritten.
    use carelog_core::VisitLogRepository;
    let stored = s.visits.find_by_schedule(&id).await.unwrap().unwrap();
    assert!(stored.end_time.is_none());
}

#[tokio::test]
async fn cancel_reopens_the_schedule_for_a_fresh_start() {
    let s = stack("2025-03-14T09:05:00Z");
    let (caregiver, client) = seed_pair(&s).await;

    let bundle = s
        .service
        .create_schedule(draft(&caregiver, &client, "09:00:00", "10:00:00"))
        .await
        .unwrap();
    let id = bundle.schedule.id;

    s.service.start_visit(&id, on_site()).await.unwrap();
    s.service.cancel_visit(&id).await.unwrap();

    let detail = s.service.get_schedule(&id).await.unwrap();
    assert_eq!(detail.status, ScheduleStatus::Started);

    // The unique slot is free again.
    s.service.start_visit(&id, on_site()).await.unwrap();
}

#[tokio::test]
async fn today_list_aggregates_and_falls_back() {
    let s = stack("2025-03-14T08:00:00Z");
    let (caregiver, client) = seed_pair(&s).await;

    // Completed, missed, and pending schedules on the same day.
    let done = s
        .service
        .create_schedule(draft(&caregiver, &client, "06:00:00", "07:00:00"))
        .await
        .unwrap();
    s.service.create_schedule(draft(&caregiver, &client, "07:00:00", "08:00:00")).await.unwrap();
    s.service.create_schedule(draft(&caregiver, &client, "09:00:00", "10:00:00")).await.unwrap();

    // Drive the first schedule through a full visit.
    s.clock.set("2025-03-14T06:00:00Z");
    s.service.start_visit(&done.schedule.id, on_site()).await.unwrap();
    s.service.update_task_status(&done.tasks[0].id, true, None).await.unwrap();
    s.clock.set("2025-03-14T06:30:00Z");
    s.service.end_visit(&done.schedule.id, on_site()).await.unwrap();

    s.clock.set("2025-03-14T08:30:00Z");
    let filter = ScheduleFilter {
        caregiver_id: Some(caregiver.clone()),
        client_id: None,
        today: true,
    };
    let page = s.service.list_schedules(&filter).await.unwrap();

    let stats = page.stats.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.missed, 1);
    assert_eq!(stats.upcoming, 1);
    assert_eq!(page.list.len(), 3);

    // A day with no schedules falls back to the whole set.
    s.clock.set("2025-03-20T08:30:00Z");
    let page = s.service.list_schedules(&filter).await.unwrap();
    assert_eq!(page.list.len(), 3);
    assert_eq!(page.total_schedules, 3);
}

#[tokio::test]
async fn started_schedule_surfaces_the_running_visit() {
    let s = stack("2025-03-14T09:05:00Z");
    let (caregiver, client) = seed_pair(&s).await;

    let bundle = s
        .service
        .create_schedule(draft(&caregiver, &client, "09:00:00", "10:00:00"))
        .await
        .unwrap();

    assert!(s.service.started_schedule(&caregiver).await.unwrap().is_none());

    s.service.start_visit(&bundle.schedule.id, on_site()).await.unwrap();

    let summary = s.service.started_schedule(&caregiver).await.unwrap().unwrap();
    assert_eq!(summary.id, bundle.schedule.id);
    assert_eq!(summary.status, ScheduleStatus::InProgress);
}

#[tokio::test]
async fn seed_demo_data_builds_a_working_day() {
    let s = stack("2025-03-14T09:00:00Z");
    seed_pair(&s).await;

    s.service.seed_demo_data(on_site()).await.unwrap();

    let page = s.service.list_schedules(&ScheduleFilter::default()).await.unwrap();
    assert_eq!(page.list.len(), 5);
    assert_eq!(page.total_schedules, 5);
    assert!(page.list.iter().all(|row| row.client_name == "Client"));
}
