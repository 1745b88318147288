use std::future::Future;

use chrono::{DateTime, Utc};

use crate::db_types::{NewReport, ReconciliationReport};

/// Persistence contract for write-once report rows.
pub trait ReportManagement: Clone {
    type Error: std::error::Error + Send;

    /// Persists a report and returns the stored row. There is no update path; reports are immutable once written.
    fn insert_report(
        &self,
        report: NewReport,
    ) -> impl Future<Output = Result<ReconciliationReport, Self::Error>> + Send;

    /// All reports generated for the given task (at most one summary and one detail).
    fn fetch_reports_for_task(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<Vec<ReconciliationReport>, Self::Error>> + Send;

    /// Retention sweep: deletes reports generated before the cutoff. Returns the number of rows removed.
    fn delete_reports_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}
