use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{db_url, discrepancies, new_pool, reports, tasks, SqliteDatabaseError};
use crate::{
    db::traits::{DiscrepancyManagement, ReportManagement, ResolvedFields, TaskManagement, TaskUpdate},
    db_types::{
        Discrepancy,
        NewDiscrepancy,
        NewReport,
        NewTask,
        ReconciliationReport,
        ReconciliationTask,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the url from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl TaskManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn create_task(&self, task: NewTask) -> Result<ReconciliationTask, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let stored = tasks::insert_task(task, &mut conn).await?;
        debug!("🗃️ Task {} ({}) created for {}", stored.task_id, stored.task_type, stored.task_date);
        Ok(stored)
    }

    async fn update_task(&self, task_id: &str, update: TaskUpdate) -> Result<ReconciliationTask, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let updated = tasks::update_task(task_id, update, &mut conn).await?;
        trace!("🗃️ Task {task_id} updated. Status is now {}", updated.status);
        Ok(updated)
    }

    async fn fetch_task_by_task_id(&self, task_id: &str) -> Result<Option<ReconciliationTask>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tasks::fetch_task_by_task_id(task_id, &mut conn).await
    }

    async fn fetch_tasks_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReconciliationTask>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tasks::fetch_tasks_by_date_range(start, end, &mut conn).await
    }

    async fn has_active_task(&self) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tasks::has_active_task(&mut conn).await
    }
}

impl DiscrepancyManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    /// The whole batch goes in under one transaction, so a half-written discrepancy list can never be observed.
    async fn insert_discrepancies(&self, discrepancies: &[NewDiscrepancy]) -> Result<u64, Self::Error> {
        if discrepancies.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let inserted = discrepancies::insert_batch(discrepancies, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {inserted} discrepancies saved for task {}", discrepancies[0].task_id);
        Ok(inserted)
    }

    async fn fetch_discrepancies_for_task(&self, task_id: &str) -> Result<Vec<Discrepancy>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        discrepancies::fetch_for_task(task_id, &mut conn).await
    }

    async fn fetch_unresolved_discrepancies(&self) -> Result<Vec<Discrepancy>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        discrepancies::fetch_unresolved(&mut conn).await
    }

    async fn resolve_discrepancy(&self, id: i64, fields: ResolvedFields) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        discrepancies::resolve(id, fields, &mut conn).await
    }

    async fn fetch_discrepancy_by_id(&self, id: i64) -> Result<Option<Discrepancy>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        discrepancies::fetch_by_id(id, &mut conn).await
    }

    async fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let removed = discrepancies::delete_resolved_before(cutoff, &mut conn).await?;
        if removed > 0 {
            info!("🗃️ Retention sweep removed {removed} resolved discrepancies older than {cutoff}");
        }
        Ok(removed)
    }
}

impl ReportManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_report(&self, report: NewReport) -> Result<ReconciliationReport, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let stored = reports::insert_report(report, &mut conn).await?;
        debug!("🗃️ {} report saved for task {}", stored.report_type, stored.task_id);
        Ok(stored)
    }

    async fn fetch_reports_for_task(&self, task_id: &str) -> Result<Vec<ReconciliationReport>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reports::fetch_for_task(task_id, &mut conn).await
    }

    async fn delete_reports_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let removed = reports::delete_before(cutoff, &mut conn).await?;
        if removed > 0 {
            info!("🗃️ Retention sweep removed {removed} reports older than {cutoff}");
        }
        Ok(removed)
    }
}
