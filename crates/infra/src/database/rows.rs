//! Raw row shapes shared by the repository implementations.
//!
//! Row structs carry exactly what sqlite returns; conversion into domain
//! types happens outside the `query_map` closures so parsing failures
//! surface as domain errors instead of panics.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;

use carelog_domain::{
    CarelogError, GeoPoint, Result, Schedule, ServiceKind, Task, User, UserRole, VisitLog,
};

pub(crate) fn ts_to_instant(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| CarelogError::Database(format!("timestamp out of range: {ts}")))
}

fn parse_stored_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CarelogError::Database(format!("malformed stored date: {value}")))
}

pub(crate) struct ScheduleRow {
    pub id: String,
    pub date: String,
    pub start_ts: i64,
    pub end_ts: i64,
    pub caregiver_id: String,
    pub client_id: String,
    pub service: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub service_notes: String,
    pub created_at: i64,
}

impl ScheduleRow {
    pub const COLUMNS: &'static str =
        "id, date, start_ts, end_ts, caregiver_id, client_id, service, lat, lng, \
         service_notes, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            start_ts: row.get(2)?,
            end_ts: row.get(3)?,
            caregiver_id: row.get(4)?,
            client_id: row.get(5)?,
            service: row.get(6)?,
            lat: row.get(7)?,
            lng: row.get(8)?,
            service_notes: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    pub fn into_schedule(self) -> Result<Schedule> {
        let location = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Ok(Schedule {
            id: self.id,
            date: parse_stored_date(&self.date)?,
            start_time: ts_to_instant(self.start_ts)?,
            end_time: ts_to_instant(self.end_ts)?,
            caregiver_id: self.caregiver_id,
            client_id: self.client_id,
            service: ServiceKind::parse(&self.service)?,
            location,
            service_notes: self.service_notes,
            created_at: ts_to_instant(self.created_at)?,
        })
    }
}

pub(crate) struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub picture: Option<String>,
    pub created_at: i64,
}

impl UserRow {
    pub const COLUMNS: &'static str =
        "id, name, email, address, phone, role, picture, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            address: row.get(3)?,
            phone: row.get(4)?,
            role: row.get(5)?,
            picture: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            address: self.address,
            phone: self.phone,
            role: UserRole::parse(&self.role)?,
            picture: self.picture,
            created_at: ts_to_instant(self.created_at)?,
        })
    }
}

pub(crate) struct VisitLogRow {
    pub id: String,
    pub schedule_id: String,
    pub start_ts: i64,
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_ts: Option<i64>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
}

impl VisitLogRow {
    pub const COLUMNS: &'static str =
        "id, schedule_id, start_ts, start_lat, start_lng, end_ts, end_lat, end_lng";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            schedule_id: row.get(1)?,
            start_ts: row.get(2)?,
            start_lat: row.get(3)?,
            start_lng: row.get(4)?,
            end_ts: row.get(5)?,
            end_lat: row.get(6)?,
            end_lng: row.get(7)?,
        })
    }

    pub fn into_visit_log(self) -> Result<VisitLog> {
        let end_point = match (self.end_lat, self.end_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Ok(VisitLog {
            id: self.id,
            schedule_id: self.schedule_id,
            start_time: ts_to_instant(self.start_ts)?,
            start_point: GeoPoint { lat: self.start_lat, lng: self.start_lng },
            end_time: self.end_ts.map(ts_to_instant).transpose()?,
            end_point,
        })
    }
}

pub(crate) struct TaskRow {
    pub id: String,
    pub schedule_id: String,
    pub title: String,
    pub description: String,
    pub completed: Option<bool>,
    pub reason: Option<String>,
}

impl TaskRow {
    pub const COLUMNS: &'static str = "id, schedule_id, title, description, completed, reason";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            schedule_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            completed: row.get(4)?,
            reason: row.get(5)?,
        })
    }

    pub fn into_task(self) -> Task {
        Task {
            id: self.id,
            schedule_id: self.schedule_id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            reason: self.reason,
        }
    }
}
