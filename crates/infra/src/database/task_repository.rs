//! SQLite-backed implementation of the TaskRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};

use carelog_core::TaskRepository;
use carelog_domain::{CarelogError, Result, Task};

use super::pool::SqlitePool;
use super::rows::TaskRow;
use crate::errors::InfraError;

/// SQLite implementation of TaskRepository
pub struct SqliteTaskRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteTaskRepository {
    /// Create a new task repository
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<super::pool::PooledSqlite> {
        self.pool.get().map_err(|e| CarelogError::Database(format!("pool error: {e}")))
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn insert(&self, task: &Task) -> Result<()> {
        let conn = self.connection()?;
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
        debug!("task inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TaskRow::COLUMNS),
                params![id],
                TaskRow::from_row,
            )
            .optional()
            .map_err(InfraError::from)?;

        Ok(row.map(TaskRow::into_task))
    }

    #[instrument(skip(self))]
    async fn list_by_schedule(&self, schedule_id: &str) -> Result<Vec<Task>> {
        let conn = self.connection()?;
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

        debug!(count = rows.len(), "listed schedule tasks");
        Ok(rows.into_iter().map(TaskRow::into_task).collect())
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: &str,
        completed: bool,
        reason: Option<&str>,
    ) -> Result<Task> {
        let conn = self.connection()?;

        let changed = conn
            .execute(
                "UPDATE tasks SET completed = ?2, reason = ?3 WHERE id = ?1",
                params![id, completed, reason],
            )
            .map_err(InfraError::from)?;

        if changed == 0 {
            return Err(CarelogError::NotFound("task".to_owned()));
        }

        let row = conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TaskRow::COLUMNS),
                params![id],
                TaskRow::from_row,
            )
            .map_err(InfraError::from)?;

        debug!(completed, "task status updated");
        Ok(row.into_task())
    }
}
