//! SQLite connection pool
//!
//! r2d2-based pooling with the pragmas every connection needs: WAL for
//! concurrent readers, enforced foreign keys, and a busy timeout so writers
//! queue instead of failing immediately.

use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use carelog_domain::{CarelogError, Result};

/// Pool of SQLite connections.
pub type SqlitePool = Pool<SqliteConnectionManager>;

/// A checked-out pooled connection.
pub type PooledSqlite = PooledConnection<SqliteConnectionManager>;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
    PRAGMA synchronous = NORMAL;
";

/// Create a connection pool for the database at `path`.
pub fn create_pool(path: &Path, max_size: u32) -> Result<SqlitePool> {
    let manager = SqliteConnectionManager::file(path)
        .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .connection_timeout(CONNECTION_TIMEOUT)
        .build(manager)
        .map_err(|e| CarelogError::Database(format!("failed to create pool: {e}")))?;

    info!(db_path = %path.display(), max_size = pool.max_size(), "sqlite pool initialised");

    Ok(pool)
}
