use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
    db::traits::ResolvedFields,
    db_types::{Discrepancy, NewDiscrepancy},
};

/// Persistence contract for discrepancy rows.
pub trait DiscrepancyManagement: Clone {
    type Error: std::error::Error + Send;

    /// Inserts the whole batch inside one transaction. One call per reconciliation run; an empty batch is a no-op.
    fn insert_discrepancies(
        &self,
        discrepancies: &[NewDiscrepancy],
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// All discrepancies belonging to the given task.
    fn fetch_discrepancies_for_task(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<Vec<Discrepancy>, Self::Error>> + Send;

    /// All discrepancies still awaiting operator action, across all tasks.
    fn fetch_unresolved_discrepancies(&self) -> impl Future<Output = Result<Vec<Discrepancy>, Self::Error>> + Send;

    /// Marks one discrepancy `Resolved`, writing notes, resolver and timestamp together.
    ///
    /// Returns `false` when the id does not exist or the discrepancy is already resolved (the update is guarded on
    /// the `Unresolved` status, so the first resolver wins and a replay is a no-op).
    fn resolve_discrepancy(
        &self,
        id: i64,
        fields: ResolvedFields,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// The discrepancy with this surrogate id, if any.
    fn fetch_discrepancy_by_id(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Discrepancy>, Self::Error>> + Send;

    /// Retention sweep: deletes discrepancies resolved before the cutoff. Returns the number of rows removed.
    fn delete_resolved_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}
