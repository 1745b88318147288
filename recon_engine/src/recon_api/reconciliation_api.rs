use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::*;
use tokio::{sync::Semaphore, task::JoinHandle, time::timeout};

use crate::{
    config::ReconciliationConfig,
    db::traits::{DiscrepancyManagement, ReportManagement, ResolvedFields, TaskManagement, TaskUpdate},
    db_types::{
        Discrepancy,
        MatchResult,
        NewTask,
        ReconciliationReport,
        ReconciliationTask,
        TaskStatus,
        TaskType,
    },
    events::{
        DiscrepancyResolvedEvent,
        EventProducers,
        ReconciliationCompletedEvent,
        ReconciliationFailedEvent,
        ReconciliationStartedEvent,
    },
    ledgers::{PaymentLedger, SettlementClient},
    matcher,
    recon_api::{report_builder, ReconciliationError},
};

/// `ReconciliationApi` is the primary API for creating, executing and inspecting reconciliation runs, and for the
/// operator actions on their discrepancies.
///
/// It is generic over the persistence backend `B` and the two ledger sources. One run is one asynchronous unit of
/// work submitted to the tokio runtime; admission is bounded by a semaphore so at most
/// [`ReconciliationConfig::max_concurrent_runs`] runs execute at once within this process. Within a run, fetching,
/// matching and persistence are strictly sequential.
pub struct ReconciliationApi<B, L, S> {
    db: B,
    ledger: L,
    provider: S,
    producers: EventProducers,
    config: ReconciliationConfig,
    run_slots: Arc<Semaphore>,
}

impl<B: Clone, L: Clone, S: Clone> Clone for ReconciliationApi<B, L, S> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            ledger: self.ledger.clone(),
            provider: self.provider.clone(),
            producers: self.producers.clone(),
            config: self.config.clone(),
            run_slots: Arc::clone(&self.run_slots),
        }
    }
}

impl<B, L, S> Debug for ReconciliationApi<B, L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, L, S> ReconciliationApi<B, L, S> {
    pub fn new(db: B, ledger: L, provider: S, producers: EventProducers, config: ReconciliationConfig) -> Self {
        let run_slots = Arc::new(Semaphore::new(config.max_concurrent_runs));
        Self { db, ledger, provider, producers, config, run_slots }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }
}

impl<B, L, S> ReconciliationApi<B, L, S>
where
    B: TaskManagement + DiscrepancyManagement + ReportManagement + Clone + Send + Sync + 'static,
    L: PaymentLedger + Send + Sync + 'static,
    S: SettlementClient + Send + Sync + 'static,
{
    //------------------------------------------ Task creation -------------------------------------------------

    /// Creates a `Pending` payment reconciliation task for the given business date.
    pub async fn create_payment_reconciliation_task(
        &self,
        date: NaiveDate,
    ) -> Result<ReconciliationTask, ReconciliationError> {
        info!("🔀️ Creating payment reconciliation task for {date}");
        self.db.create_task(NewTask::payment(date)).await.map_err(db_err)
    }

    /// Creates a `Pending` refund reconciliation task for the given business date.
    pub async fn create_refund_reconciliation_task(
        &self,
        date: NaiveDate,
    ) -> Result<ReconciliationTask, ReconciliationError> {
        info!("🔀️ Creating refund reconciliation task for {date}");
        self.db.create_task(NewTask::refund(date)).await.map_err(db_err)
    }

    /// Creates a `Pending` settlement reconciliation task for the given business date.
    pub async fn create_settlement_reconciliation_task(
        &self,
        date: NaiveDate,
    ) -> Result<ReconciliationTask, ReconciliationError> {
        info!("🔀️ Creating settlement reconciliation task for {date}");
        self.db.create_task(NewTask::settlement(date)).await.map_err(db_err)
    }

    //------------------------------------------ Execution -----------------------------------------------------

    /// Submits the run for the given task to the runtime and returns immediately.
    ///
    /// The spawned unit of work waits for an executor slot, drives the task through
    /// `Running → {Success, Failed}`, persists discrepancies and reports, and publishes lifecycle events. Any
    /// error inside the run is recorded on the task as `Failed` with its message and then re-raised through the
    /// join handle, so a caller awaiting the handle observes the failure.
    pub fn execute_reconciliation(
        &self,
        task: ReconciliationTask,
    ) -> JoinHandle<Result<ReconciliationTask, ReconciliationError>> {
        let api = self.clone();
        tokio::spawn(async move {
            let _permit = Arc::clone(&api.run_slots)
                .acquire_owned()
                .await
                .map_err(|_| ReconciliationError::ExecutorUnavailable)?;
            let task_id = task.task_id.clone();
            match api.run(task).await {
                Ok(finished) => Ok(finished),
                Err(e) => {
                    api.record_failure(&task_id, &e).await;
                    Err(e)
                },
            }
        })
    }

    /// The body of one run. Exactly one caller holds an executor permit while this executes; errors are handled
    /// once, in [`Self::execute_reconciliation`].
    async fn run(&self, task: ReconciliationTask) -> Result<ReconciliationTask, ReconciliationError> {
        info!("🔀️ Starting {} reconciliation task {}", task.task_type, task.task_id);
        let task = self
            .db
            .update_task(
                &task.task_id,
                TaskUpdate::default().with_status(TaskStatus::Running).with_start_time(Utc::now()),
            )
            .await
            .map_err(db_err)?;
        self.call_started_hook(&task).await;

        let result = match task.task_type {
            TaskType::Payment => self.match_payment_ledgers(&task).await?,
            TaskType::Refund => self.match_refund_ledgers(&task).await?,
            TaskType::Settlement => self.tally_settlements(&task).await?,
        };
        self.db.insert_discrepancies(&result.discrepancies).await.map_err(db_err)?;

        let status = if result.discrepancies.is_empty() { TaskStatus::Success } else { TaskStatus::Failed };
        let mut update = TaskUpdate::default()
            .with_status(status)
            .with_end_time(Utc::now())
            .with_counts(result.total_records, result.matched_records, result.unmatched_records);
        if let Some(msg) = &result.error_message {
            update = update.with_error_message(msg.clone());
        }
        let task = self.db.update_task(&task.task_id, update).await.map_err(db_err)?;

        self.generate_reports(&task, &result).await?;
        self.publish_terminal_event(&task).await;
        info!(
            "🔀️ Task {} finished with status {}: {} records, {} matched, {} discrepancies",
            task.task_id, task.status, task.total_records, task.matched_records, task.unmatched_records
        );
        Ok(task)
    }

    /// Fetches both payment ledgers for the task's business date and joins them.
    async fn match_payment_ledgers(&self, task: &ReconciliationTask) -> Result<MatchResult, ReconciliationError> {
        let (start, end) = full_day_window(task.task_date);
        let internal = self
            .with_fetch_timeout(&task.task_id, self.ledger.payments_created_between(start, end))
            .await?
            .map_err(|e| ReconciliationError::LedgerFetchError(e.to_string()))?;
        let external = self
            .with_fetch_timeout(&task.task_id, self.provider.fetch_transactions(task.task_date))
            .await?
            .map_err(|e| ReconciliationError::LedgerFetchError(e.to_string()))?;
        debug!(
            "🔀️ Task {}: fetched {} internal payments and {} provider transactions",
            task.task_id,
            internal.len(),
            external.len()
        );
        Ok(matcher::match_payments(&internal, &external, &task.task_id))
    }

    /// Refund runs fetch the provider's refund feed and currently complete with zero counts.
    // TODO: reconcile against an internal refund ledger once the payment store exposes one.
    async fn match_refund_ledgers(&self, task: &ReconciliationTask) -> Result<MatchResult, ReconciliationError> {
        let refunds = self
            .with_fetch_timeout(&task.task_id, self.provider.fetch_refunds(task.task_date))
            .await?
            .map_err(|e| ReconciliationError::LedgerFetchError(e.to_string()))?;
        debug!("🔀️ Task {}: fetched {} provider refunds", task.task_id, refunds.len());
        Ok(MatchResult::default())
    }

    /// Settlement runs count the provider's daily summaries; every row is recorded as matched.
    async fn tally_settlements(&self, task: &ReconciliationTask) -> Result<MatchResult, ReconciliationError> {
        let settlements = self
            .with_fetch_timeout(&task.task_id, self.provider.fetch_settlements(task.task_date))
            .await?
            .map_err(|e| ReconciliationError::LedgerFetchError(e.to_string()))?;
        let count = settlements.len() as i64;
        Ok(MatchResult { total_records: count, matched_records: count, ..MatchResult::default() })
    }

    async fn with_fetch_timeout<T>(
        &self,
        task_id: &str,
        fut: impl std::future::Future<Output = T> + Send,
    ) -> Result<T, ReconciliationError> {
        timeout(self.config.fetch_timeout, fut).await.map_err(|_| ReconciliationError::FetchTimeout {
            task_id: task_id.to_string(),
            seconds: self.config.fetch_timeout.as_secs(),
        })
    }

    async fn generate_reports(
        &self,
        task: &ReconciliationTask,
        result: &MatchResult,
    ) -> Result<(), ReconciliationError> {
        let summary = report_builder::summary_report(task, result, self.config.report_preview_limit);
        self.db.insert_report(summary).await.map_err(db_err)?;
        if !result.discrepancies.is_empty() {
            // The detail report carries the persisted rows so it records their assigned ids.
            let stored = self.db.fetch_discrepancies_for_task(&task.task_id).await.map_err(db_err)?;
            let detail = report_builder::detail_report(task, &stored);
            self.db.insert_report(detail).await.map_err(db_err)?;
        }
        Ok(())
    }

    /// The single failure path: record `Failed` + message on the task, then tell subscribers. Best-effort; a task
    /// that already reached a terminal state keeps it (transitions are monotonic) and the rejection is only
    /// logged.
    async fn record_failure(&self, task_id: &str, e: &ReconciliationError) {
        error!("🔀️ Reconciliation task {task_id} failed: {e}");
        let update = TaskUpdate::default()
            .with_status(TaskStatus::Failed)
            .with_end_time(Utc::now())
            .with_error_message(e.to_string());
        if let Err(db_e) = self.db.update_task(task_id, update).await {
            error!("🔀️ Could not record failure on task {task_id}: {db_e}");
        }
        self.call_failed_hook(task_id, &e.to_string()).await;
    }

    //------------------------------------------ Queries -------------------------------------------------------

    /// The task with the given business id, if any.
    pub async fn get_reconciliation_task(
        &self,
        task_id: &str,
    ) -> Result<Option<ReconciliationTask>, ReconciliationError> {
        self.db.fetch_task_by_task_id(task_id).await.map_err(db_err)
    }

    /// All tasks whose business date falls within `[start, end]`, inclusive.
    pub async fn get_reconciliation_tasks_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReconciliationTask>, ReconciliationError> {
        self.db.fetch_tasks_by_date_range(start, end).await.map_err(db_err)
    }

    /// True iff any task is `Pending` or `Running`.
    ///
    /// Advisory only: there is a check-then-act gap between this read and a subsequent
    /// [`Self::execute_reconciliation`]. Within one process the executor semaphore serializes runs regardless;
    /// callers needing cross-process single-flight must add their own locking.
    pub async fn has_running_task(&self) -> Result<bool, ReconciliationError> {
        self.db.has_active_task().await.map_err(db_err)
    }

    pub async fn get_discrepancies(&self, task_id: &str) -> Result<Vec<Discrepancy>, ReconciliationError> {
        self.db.fetch_discrepancies_for_task(task_id).await.map_err(db_err)
    }

    pub async fn get_unresolved_discrepancies(&self) -> Result<Vec<Discrepancy>, ReconciliationError> {
        self.db.fetch_unresolved_discrepancies().await.map_err(db_err)
    }

    pub async fn get_reports(&self, task_id: &str) -> Result<Vec<ReconciliationReport>, ReconciliationError> {
        self.db.fetch_reports_for_task(task_id).await.map_err(db_err)
    }

    //------------------------------------------ Operator actions ----------------------------------------------

    /// Marks one discrepancy resolved, recording notes, resolver and timestamp together.
    ///
    /// Never fails: an unknown id, an already-resolved discrepancy or a storage error all return `false` (errors
    /// are logged). Resolving is a low-stakes operator action and must not crash a caller.
    pub async fn resolve_discrepancy(&self, id: i64, notes: &str, resolved_by: &str) -> bool {
        match self.try_resolve_discrepancy(id, notes, resolved_by).await {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("🔀️ Failed to resolve discrepancy {id}: {e}");
                false
            },
        }
    }

    async fn try_resolve_discrepancy(
        &self,
        id: i64,
        notes: &str,
        resolved_by: &str,
    ) -> Result<bool, ReconciliationError> {
        let fields = ResolvedFields::new(notes, resolved_by);
        let resolved = self.db.resolve_discrepancy(id, fields).await.map_err(db_err)?;
        if !resolved {
            debug!("🔀️ Discrepancy {id} was not resolved (unknown id or already resolved)");
            return Ok(false);
        }
        if let Some(discrepancy) = self.db.fetch_discrepancy_by_id(id).await.map_err(db_err)? {
            info!("🔀️ Discrepancy {id} resolved by {resolved_by}");
            self.call_resolved_hook(discrepancy).await;
        }
        Ok(true)
    }

    /// Retention sweep: removes discrepancies resolved, and reports generated, more than
    /// [`ReconciliationConfig::retention_days`] before `now`. Returns `(discrepancies, reports)` counts.
    pub async fn purge_expired_records(&self, now: DateTime<Utc>) -> Result<(u64, u64), ReconciliationError> {
        let cutoff = now - Duration::days(self.config.retention_days);
        info!("🔀️ Retention sweep: removing resolved discrepancies and reports older than {cutoff}");
        let discrepancies = self.db.delete_resolved_before(cutoff).await.map_err(db_err)?;
        let reports = self.db.delete_reports_before(cutoff).await.map_err(db_err)?;
        Ok((discrepancies, reports))
    }

    //------------------------------------------ Event hooks ---------------------------------------------------

    async fn call_started_hook(&self, task: &ReconciliationTask) {
        for emitter in &self.producers.started_producer {
            emitter.publish_event(ReconciliationStartedEvent::new(task.clone())).await;
        }
    }

    async fn publish_terminal_event(&self, task: &ReconciliationTask) {
        if task.status == TaskStatus::Success {
            for emitter in &self.producers.completed_producer {
                emitter.publish_event(ReconciliationCompletedEvent::new(task.clone())).await;
            }
        } else {
            let error = task.error_message.clone().unwrap_or_else(|| "reconciliation failed".to_string());
            self.call_failed_hook(&task.task_id, &error).await;
        }
    }

    async fn call_failed_hook(&self, task_id: &str, error: &str) {
        for emitter in &self.producers.failed_producer {
            emitter.publish_event(ReconciliationFailedEvent::new(task_id.to_string(), error.to_string())).await;
        }
    }

    async fn call_resolved_hook(&self, discrepancy: Discrepancy) {
        for emitter in &self.producers.resolved_producer {
            emitter.publish_event(DiscrepancyResolvedEvent::new(discrepancy.clone())).await;
        }
    }
}

/// The full-day window `[00:00:00, 23:59:59.999999999]` for a business date, in UTC.
fn full_day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = date.and_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or_default().and_utc();
    (start, end)
}

fn db_err<E: std::error::Error>(e: E) -> ReconciliationError {
    ReconciliationError::DatabaseError(e.to_string())
}
