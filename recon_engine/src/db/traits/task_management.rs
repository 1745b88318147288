use std::future::Future;

use chrono::NaiveDate;

use crate::{
    db::traits::TaskUpdate,
    db_types::{NewTask, ReconciliationTask},
};

/// Persistence contract for reconciliation task rows.
///
/// The backend enforces the monotonic lifecycle: a [`TaskManagement::update_task`] carrying a status the current
/// status cannot transition to must be rejected with an error, so a buggy caller can never resurrect a terminal
/// task.
pub trait TaskManagement: Clone {
    type Error: std::error::Error + Send;

    /// Persists a new task in `Pending` and returns the stored row.
    fn create_task(&self, task: NewTask) -> impl Future<Output = Result<ReconciliationTask, Self::Error>> + Send;

    /// Applies the given field updates to the task with this business id and returns the updated row.
    fn update_task(
        &self,
        task_id: &str,
        update: TaskUpdate,
    ) -> impl Future<Output = Result<ReconciliationTask, Self::Error>> + Send;

    /// The task with the given business id, if any.
    fn fetch_task_by_task_id(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<Option<ReconciliationTask>, Self::Error>> + Send;

    /// All tasks whose business date falls within `[start, end]`, inclusive.
    fn fetch_tasks_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<ReconciliationTask>, Self::Error>> + Send;

    /// True iff any task is `Pending` or `Running`. Advisory only; see
    /// [`crate::recon_api::ReconciliationApi::has_running_task`].
    fn has_active_task(&self) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
