//! SQLite-backed implementation of the VisitLogRepository port.
//!
//! The start write is a single conditional insert guarded by the
//! `UNIQUE(schedule_id)` constraint, so two concurrent starters cannot both
//! create the record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};

use carelog_core::VisitLogRepository;
use carelog_domain::{CarelogError, GeoPoint, Result, VisitLog};

use super::pool::SqlitePool;
use super::rows::VisitLogRow;
use crate::errors::InfraError;

/// SQLite implementation of VisitLogRepository
pub struct SqliteVisitLogRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteVisitLogRepository {
    /// Create a new visit log repository
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<super::pool::PooledSqlite> {
        self.pool.get().map_err(|e| CarelogError::Database(format!("pool error: {e}")))
    }
}

#[async_trait]
impl VisitLogRepository for SqliteVisitLogRepository {
    #[instrument(skip(self))]
    async fn find_by_schedule(&self, schedule_id: &str) -> Result<Option<VisitLog>> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM visit_logs WHERE schedule_id = ?1",
                    VisitLogRow::COLUMNS
                ),
                params![schedule_id],
                VisitLogRow::from_row,
            )
            .optional()
            .map_err(InfraError::from)?;

        row.map(VisitLogRow::into_visit_log).transpose()
    }

    #[instrument(skip(self, visit), fields(schedule_id = %visit.schedule_id))]
    async fn try_start(&self, visit: &VisitLog) -> Result<()> {
        let conn = self.connection()?;

        // Single-statement conditional write: the loser of a concurrent
        // start changes zero rows instead of overwriting the winner.
        let changed = conn
            .execute(
                "INSERT INTO visit_logs (id, schedule_id, start_ts, start_lat, start_lng)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(schedule_id) DO NOTHING",
                params![
                    visit.id,
                    visit.schedule_id,
                    visit.start_time.timestamp(),
                    visit.start_point.lat,
                    visit.start_point.lng,
                ],
            )
            .map_err(InfraError::from)?;

        if changed == 0 {
            return Err(CarelogError::VisitAlreadyStarted);
        }

        debug!("visit start recorded");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_end(
        &self,
        schedule_id: &str,
        end_time: DateTime<Utc>,
        end_point: GeoPoint,
    ) -> Result<()> {
        let conn = self.connection()?;

        let changed = conn
            .execute(
                "UPDATE visit_logs
                 SET end_ts = ?2, end_lat = ?3, end_lng = ?4
                 WHERE schedule_id = ?1 AND end_ts IS NULL",
                params![schedule_id, end_time.timestamp(), end_point.lat, end_point.lng],
            )
            .map_err(InfraError::from)?;

        if changed == 0 {
            // Either never started or already ended; re-read to tell apart.
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM visit_logs WHERE schedule_id = ?1)",
                    params![schedule_id],
                    |row| row.get(0),
                )
                .map_err(InfraError::from)?;
            return Err(if exists {
                CarelogError::VisitAlreadyEnded
            } else {
                CarelogError::VisitNotStarted
            });
        }

        debug!("visit end recorded");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_schedule(&self, schedule_id: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM visit_logs WHERE schedule_id = ?1", params![schedule_id])
            .map_err(InfraError::from)?;
        debug!("visit log deleted");
        Ok(())
    }
}
