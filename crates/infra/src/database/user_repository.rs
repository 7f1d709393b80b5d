//! SQLite-backed implementation of the UserRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};

use carelog_core::UserRepository;
use carelog_domain::{CarelogError, Result, User};

use super::pool::SqlitePool;
use super::rows::UserRow;
use crate::errors::InfraError;

/// SQLite implementation of UserRepository
pub struct SqliteUserRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteUserRepository {
    /// Create a new user repository
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<super::pool::PooledSqlite> {
        self.pool.get().map_err(|e| CarelogError::Database(format!("pool error: {e}")))
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", UserRow::COLUMNS),
                params![id],
                UserRow::from_row,
            )
            .optional()
            .map_err(InfraError::from)?;

        row.map(UserRow::into_user).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: &User) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO users (id, name, email, address, phone, role, picture, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id,
                user.name,
                user.email,
                user.address,
                user.phone,
                user.role.as_str(),
                user.picture,
                user.created_at.timestamp(),
            ],
        )
        .map_err(InfraError::from)?;
        debug!(role = user.role.as_str(), "user inserted");
        Ok(())
    }
}
