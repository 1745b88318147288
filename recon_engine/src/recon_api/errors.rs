use thiserror::Error;

/// Errors surfaced by [`super::ReconciliationApi`].
///
/// Backend and ledger errors are carried as strings so the error stays `Clone + Send` across the join handle of a
/// spawned run, regardless of which backend or fetcher types the API is instantiated with.
#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Ledger fetch error: {0}")]
    LedgerFetchError(String),
    #[error("Ledger fetch for task {task_id} timed out after {seconds}s")]
    FetchTimeout { task_id: String, seconds: u64 },
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("The reconciliation executor has shut down")]
    ExecutorUnavailable,
}
