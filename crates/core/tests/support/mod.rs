//! Shared test fixtures for scheduling service tests

pub mod repositories;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use carelog_core::scheduling::ports::{AddressLookup, Clock, FailureNotifier};
use carelog_core::SchedulingService;
use carelog_domain::{GeoPoint, Schedule, ServiceKind, Task, User, UserRole, VisitLog};

use self::repositories::{
    InMemoryStore, MockScheduleRepository, MockTaskRepository, MockUserRepository,
    MockVisitLogRepository,
};

/// Clock pinned to a settable instant.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(instant: &str) -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(parse(instant)) })
    }

    /// Move the pinned instant.
    pub fn set(&self, instant: &str) {
        *self.now.lock().unwrap() = parse(instant);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Notifier that records every report for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    pub reports: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl FailureNotifier for RecordingNotifier {
    async fn report_failure(&self, operation: &str, message: &str) {
        self.reports.lock().unwrap().push((operation.to_owned(), message.to_owned()));
    }
}

/// Address lookup returning a fixed label for every point.
pub struct StaticAddressLookup;

#[async_trait]
impl AddressLookup for StaticAddressLookup {
    async fn reverse(&self, _point: GeoPoint) -> Option<String> {
        Some("12 Elm Street, Springfield".to_owned())
    }
}

/// Everything a service test needs, wired over one in-memory store.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: SchedulingService,
}

impl Harness {
    /// Build a harness with the clock pinned to `now`.
    pub fn at(now: &str) -> Self {
        let store = InMemoryStore::new();
        let clock = FixedClock::at(now);
        let notifier = Arc::new(RecordingNotifier::default());

        let service = SchedulingService::new(
            Arc::new(MockScheduleRepository::new(store.clone())),
            Arc::new(MockVisitLogRepository::new(store.clone())),
            Arc::new(MockTaskRepository::new(store.clone())),
            Arc::new(MockUserRepository::new(store.clone())),
            clock.clone(),
        )
        .with_notifier(notifier.clone())
        .with_address_lookup(Arc::new(StaticAddressLookup));

        Self { store, clock, notifier, service }
    }

    /// Seed a caregiver and client pair, returning their ids.
    pub fn seed_pair(&self) -> (String, String) {
        let caregiver = user("Grace", UserRole::Caregiver);
        let client = user("Henry", UserRole::Client);
        let ids = (caregiver.id.clone(), client.id.clone());
        self.store.add_user(caregiver);
        self.store.add_user(client);
        ids
    }
}

pub fn parse(instant: &str) -> DateTime<Utc> {
    instant.parse().unwrap_or_else(|_| panic!("bad instant literal {instant}"))
}

pub fn user(name: &str, role: UserRole) -> User {
    User {
        id: Uuid::now_v7().to_string(),
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase()),
        address: None,
        phone: None,
        role,
        picture: Some(format!("https://example.com/{}.jpg", name.to_lowercase())),
        created_at: parse("2025-01-01T00:00:00Z"),
    }
}

/// A schedule on 2025-03-14 with the given clock-time window.
pub fn schedule_on(
    caregiver_id: &str,
    client_id: &str,
    start: &str,
    end: &str,
) -> Schedule {
    Schedule {
        id: Uuid::now_v7().to_string(),
        date: "2025-03-14".parse().unwrap(),
        start_time: parse(&format!("2025-03-14T{start}Z")),
        end_time: parse(&format!("2025-03-14T{end}Z")),
        caregiver_id: caregiver_id.to_owned(),
        client_id: client_id.to_owned(),
        service: ServiceKind::PersonalCare,
        location: Some(GeoPoint { lat: 0.0, lng: 0.0 }),
        service_notes: "routine morning visit".to_owned(),
        created_at: parse("2025-03-01T00:00:00Z"),
    }
}

pub fn task_for(schedule_id: &str, title: &str) -> Task {
    Task {
        id: Uuid::now_v7().to_string(),
        schedule_id: schedule_id.to_owned(),
        title: title.to_owned(),
        description: "as discussed with the family".to_owned(),
        completed: None,
        reason: None,
    }
}

pub fn started_visit(schedule_id: &str, at: &str) -> VisitLog {
    VisitLog {
        id: Uuid::now_v7().to_string(),
        schedule_id: schedule_id.to_owned(),
        start_time: parse(at),
        start_point: GeoPoint { lat: 0.0, lng: 0.0 },
        end_time: None,
        end_point: None,
    }
}
