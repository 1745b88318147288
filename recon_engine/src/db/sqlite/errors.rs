use thiserror::Error;

use crate::db_types::TaskStatus;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("Cannot create duplicate task {0}")]
    DuplicateTask(String),
    #[error("Task {task_id} cannot transition from {from} to {to}")]
    InvalidStatusTransition { task_id: String, from: TaskStatus, to: TaskStatus },
    #[error("Malformed record details payload: {0}")]
    MalformedPayload(String),
}
