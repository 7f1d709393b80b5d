//! SQLite-backed implementation of the ScheduleRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use tracing::{debug, instrument};
use uuid::Uuid;

use carelog_core::ScheduleRepository;
use carelog_domain::{
    CarelogError, Result, Schedule, ScheduleBundle, ScheduleFilter, Task, TaskReplacement,
    TimeWindow, User, VisitLog,
};

use super::pool::SqlitePool;
use super::rows::{ScheduleRow, TaskRow, UserRow, VisitLogRow};
use crate::errors::InfraError;

/// SQLite implementation of ScheduleRepository
pub struct SqliteScheduleRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteScheduleRepository {
    /// Create a new schedule repository
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<super::pool::PooledSqlite> {
        self.pool.get().map_err(|e| CarelogError::Database(format!("pool error: {e}")))
    }
}

fn load_user(conn: &Connection, id: &str) -> Result<User> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", UserRow::COLUMNS),
            params![id],
            UserRow::from_row,
        )
        .optional()
        .map_err(InfraError::from)?
        .ok_or_else(|| CarelogError::Database(format!("dangling user reference: {id}")))?;
    row.into_user()
}

fn load_visit(conn: &Connection, schedule_id: &str) -> Result<Option<VisitLog>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM visit_logs WHERE schedule_id = ?1", VisitLogRow::COLUMNS),
            params![schedule_id],
            VisitLogRow::from_row,
        )
        .optional()
        .map_err(InfraError::from)?;
    row.map(VisitLogRow::into_visit_log).transpose()
}

fn load_tasks(conn: &Connection, schedule_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM tasks WHERE schedule_id = ?1 ORDER BY rowid ASC",
            TaskRow::COLUMNS
        ))
        .map_err(InfraError::from)?;

    let rows = stmt
        .query_map(params![schedule_id], TaskRow::from_row)
        .map_err(InfraError::from)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(InfraError::from)?;

    Ok(rows.into_iter().map(TaskRow::into_task).collect())
}

fn load_bundle(conn: &Connection, schedule: Schedule) -> Result<ScheduleBundle> {
    let caregiver = load_user(conn, &schedule.caregiver_id)?;
    let client = load_user(conn, &schedule.client_id)?;
    let visit_log = load_visit(conn, &schedule.id)?;
    let tasks = load_tasks(conn, &schedule.id)?;

    Ok(ScheduleBundle { schedule, caregiver, client, visit_log, tasks })
}

fn insert_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (id, schedule_id, title, description, completed, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            task.id,
            task.schedule_id,
            task.title,
            task.description,
            task.completed,
            task.reason
        ],
    )
    .map_err(InfraError::from)?;
    Ok(())
}

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepository {
    #[instrument(skip(self, schedule, tasks), fields(schedule_id = %schedule.id))]
    async fn insert_with_tasks(&self, schedule: &Schedule, tasks: &[Task]) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        tx.execute(
            "INSERT INTO schedules (id, date, start_ts, end_ts, caregiver_id, client_id,
                                    service, lat, lng, service_notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                schedule.id,
                schedule.date.to_string(),
                schedule.start_time.timestamp(),
                schedule.end_time.timestamp(),
                schedule.caregiver_id,
                schedule.client_id,
                schedule.service.as_str(),
                schedule.location.map(|p| p.lat),
                schedule.location.map(|p| p.lng),
                schedule.service_notes,
                schedule.created_at.timestamp(),
            ],
        )
        .map_err(InfraError::from)?;

        for task in tasks {
            insert_task(&tx, task)?;
        }

        tx.commit().map_err(InfraError::from)?;
        debug!(task_count = tasks.len(), "schedule inserted");
        Ok(())
    }

    #[instrument(skip(self, schedule, replacement), fields(schedule_id = %schedule.id))]
    async fn update_with_tasks(
        &self,
        schedule: &Schedule,
        replacement: Option<&[TaskReplacement]>,
    ) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        // Verify every referenced task before any write, so an unknown id
        // leaves the task set untouched.
        if let Some(replacement) = replacement {
            for task in replacement {
                let exists: bool = tx
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
                        params![task.id],
                        |row| row.get(0),
                    )
                    .map_err(InfraError::from)?;
                if !exists {
                    return Err(CarelogError::NotFound(format!("task with the id {}", task.id)));
                }
            }

            tx.execute("DELETE FROM tasks WHERE schedule_id = ?1", params![schedule.id])
                .map_err(InfraError::from)?;
            for task in replacement {
                tx.execute(
                    "INSERT INTO tasks (id, schedule_id, title, description)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        Uuid::now_v7().to_string(),
                        schedule.id,
                        task.title,
                        task.description
                    ],
                )
                .map_err(InfraError::from)?;
            }
        }

        let changed = tx
            .execute(
                "UPDATE schedules
                 SET date = ?2, start_ts = ?3, end_ts = ?4, caregiver_id = ?5, client_id = ?6,
                     service = ?7, lat = ?8, lng = ?9, service_notes = ?10
                 WHERE id = ?1",
                params![
                    schedule.id,
                    schedule.date.to_string(),
                    schedule.start_time.timestamp(),
                    schedule.end_time.timestamp(),
                    schedule.caregiver_id,
                    schedule.client_id,
                    schedule.service.as_str(),
                    schedule.location.map(|p| p.lat),
                    schedule.location.map(|p| p.lng),
                    schedule.service_notes,
                ],
            )
            .map_err(InfraError::from)?;

        if changed == 0 {
            return Err(CarelogError::NotFound("schedule".to_owned()));
        }

        tx.commit().map_err(InfraError::from)?;
        debug!(replaced_tasks = replacement.map(<[TaskReplacement]>::len), "schedule updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_cascade(&self, schedule_id: &str) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        // Dependents first so the foreign keys never dangle.
        tx.execute("DELETE FROM visit_logs WHERE schedule_id = ?1", params![schedule_id])
            .map_err(InfraError::from)?;
        tx.execute("DELETE FROM tasks WHERE schedule_id = ?1", params![schedule_id])
            .map_err(InfraError::from)?;
        tx.execute("DELETE FROM schedules WHERE id = ?1", params![schedule_id])
            .map_err(InfraError::from)?;

        tx.commit().map_err(InfraError::from)?;
        debug!("schedule deleted with dependents");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Schedule>> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM schedules WHERE id = ?1", ScheduleRow::COLUMNS),
                params![id],
                ScheduleRow::from_row,
            )
            .optional()
            .map_err(InfraError::from)?;

        row.map(ScheduleRow::into_schedule).transpose()
    }

    #[instrument(skip(self))]
    async fn find_bundle(&self, id: &str) -> Result<Option<ScheduleBundle>> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM schedules WHERE id = ?1", ScheduleRow::COLUMNS),
                params![id],
                ScheduleRow::from_row,
            )
            .optional()
            .map_err(InfraError::from)?;

        match row {
            Some(row) => Ok(Some(load_bundle(&conn, row.into_schedule()?)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_for_caregiver(&self, caregiver_id: &str) -> Result<Vec<Schedule>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM schedules WHERE caregiver_id = ?1 ORDER BY start_ts ASC",
                ScheduleRow::COLUMNS
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![caregiver_id], ScheduleRow::from_row)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        debug!(count = rows.len(), "loaded caregiver schedules");
        rows.into_iter().map(ScheduleRow::into_schedule).collect()
    }

    #[instrument(skip(self, filter))]
    async fn list_bundles(
        &self,
        filter: &ScheduleFilter,
        day: Option<TimeWindow>,
    ) -> Result<Vec<ScheduleBundle>> {
        let conn = self.connection()?;

        let day_bounds =
            day.map(|d| (d.start.date_naive().to_string(), d.end.date_naive().to_string()));

        let mut sql = format!("SELECT {} FROM schedules WHERE 1=1", ScheduleRow::COLUMNS);
        let mut args: Vec<&dyn ToSql> = Vec::new();
        if let Some(id) = filter.caregiver_id.as_ref() {
            sql.push_str(" AND caregiver_id = ?");
            args.push(id);
        }
        if let Some(id) = filter.client_id.as_ref() {
            sql.push_str(" AND client_id = ?");
            args.push(id);
        }
        if let Some((from, to)) = day_bounds.as_ref() {
            sql.push_str(" AND date >= ? AND date <= ?");
            args.push(from);
            args.push(to);
        }
        sql.push_str(" ORDER BY start_ts ASC");

        let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
        let rows = stmt
            .query_map(args.as_slice(), ScheduleRow::from_row)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        debug!(count = rows.len(), "listed schedules");

        rows.into_iter()
            .map(|row| load_bundle(&conn, row.into_schedule()?))
            .collect()
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &ScheduleFilter) -> Result<i64> {
        let conn = self.connection()?;

        let mut sql = "SELECT COUNT(*) FROM schedules WHERE 1=1".to_owned();
        let mut args: Vec<&dyn ToSql> = Vec::new();
        if let Some(id) = filter.caregiver_id.as_ref() {
            sql.push_str(" AND caregiver_id = ?");
            args.push(id);
        }
        if let Some(id) = filter.client_id.as_ref() {
            sql.push_str(" AND client_id = ?");
            args.push(id);
        }

        conn.query_row(&sql, args.as_slice(), |row| row.get(0))
            .map_err(|e| InfraError::from(e).into())
    }

    #[instrument(skip(self, filter))]
    async fn count_completed(&self, filter: &ScheduleFilter, day: TimeWindow) -> Result<i64> {
        let conn = self.connection()?;

        let from = day.start.date_naive().to_string();
        let to = day.end.date_naive().to_string();

        let mut sql = "SELECT COUNT(*) FROM schedules s
             JOIN visit_logs v ON v.schedule_id = s.id
             WHERE v.end_ts IS NOT NULL AND s.date >= ? AND s.date <= ?"
            .to_owned();
        let mut args: Vec<&dyn ToSql> = vec![&from as &dyn ToSql, &to];
        if let Some(id) = filter.caregiver_id.as_ref() {
            sql.push_str(" AND s.caregiver_id = ?");
            args.push(id);
        }
        if let Some(id) = filter.client_id.as_ref() {
            sql.push_str(" AND s.client_id = ?");
            args.push(id);
        }

        conn.query_row(&sql, args.as_slice(), |row| row.get(0))
            .map_err(|e| InfraError::from(e).into())
    }

    #[instrument(skip(self, filter))]
    async fn count_missed(&self, filter: &ScheduleFilter, now: DateTime<Utc>) -> Result<i64> {
        let conn = self.connection()?;

        let now_ts = now.timestamp();
        let mut sql = "SELECT COUNT(*) FROM schedules s
             WHERE s.end_ts < ?
               AND NOT EXISTS (
                   SELECT 1 FROM visit_logs v
                   WHERE v.schedule_id = s.id AND v.end_ts IS NOT NULL
               )"
        .to_owned();
        let mut args: Vec<&dyn ToSql> = vec![&now_ts as &dyn ToSql];
        if let Some(id) = filter.caregiver_id.as_ref() {
            sql.push_str(" AND s.caregiver_id = ?");
            args.push(id);
        }
        if let Some(id) = filter.client_id.as_ref() {
            sql.push_str(" AND s.client_id = ?");
            args.push(id);
        }

        conn.query_row(&sql, args.as_slice(), |row| row.get(0))
            .map_err(|e| InfraError::from(e).into())
    }

    #[instrument(skip(self))]
    async fn find_started(
        &self,
        caregiver_id: &str,
        day: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduleBundle>> {
        let conn = self.connection()?;

        let row = conn
            .query_row(
                "SELECT s.id, s.date, s.start_ts, s.end_ts, s.caregiver_id, s.client_id,
                        s.service, s.lat, s.lng, s.service_notes, s.created_at
                 FROM schedules s
                 JOIN visit_logs v ON v.schedule_id = s.id AND v.end_ts IS NULL
                 WHERE s.caregiver_id = ?1
                   AND s.date >= ?2 AND s.date <= ?3
                   AND s.start_ts <= ?4 AND s.end_ts >= ?4
                 ORDER BY s.start_ts ASC
                 LIMIT 1",
                params![
                    caregiver_id,
                    day.start.date_naive().to_string(),
                    day.end.date_naive().to_string(),
                    now.timestamp(),
                ],
                ScheduleRow::from_row,
            )
            .optional()
            .map_err(InfraError::from)?;

        match row {
            Some(row) => Ok(Some(load_bundle(&conn, row.into_schedule()?)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn wipe_all(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        tx.execute("DELETE FROM visit_logs", []).map_err(InfraError::from)?;
        tx.execute("DELETE FROM tasks", []).map_err(InfraError::from)?;
        tx.execute("DELETE FROM schedules", []).map_err(InfraError::from)?;
        tx.execute("DELETE FROM users", []).map_err(InfraError::from)?;

        tx.commit().map_err(InfraError::from)?;
        debug!("all scheduling data wiped");
        Ok(())
    }
}
