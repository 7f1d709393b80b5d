//! Database implementations

pub mod manager;
pub mod pool;
pub(crate) mod rows;
pub mod schedule_repository;
pub mod task_repository;
pub mod user_repository;
pub mod visit_log_repository;

pub use manager::DbManager;
pub use pool::{create_pool, PooledSqlite, SqlitePool};
pub use schedule_repository::SqliteScheduleRepository;
pub use task_repository::SqliteTaskRepository;
pub use user_repository::SqliteUserRepository;
pub use visit_log_repository::SqliteVisitLogRepository;
