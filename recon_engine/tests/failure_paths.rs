use std::time::Duration;

use log::*;
use recon_engine::{config::ReconciliationConfig, db_types::TaskStatus, ReconciliationError};
use tokio::runtime::Runtime;

mod support;

use support::{business_date, new_test_api, new_test_api_with_config, tear_down, MemoryLedger, MemoryProvider};

#[test]
fn fetch_failure_marks_the_task_failed() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let api = new_test_api(MemoryLedger::failing(), MemoryProvider::default()).await;
        let task = api.create_payment_reconciliation_task(business_date()).await.unwrap();
        let task_id = task.task_id.clone();

        let result = api.execute_reconciliation(task).await.unwrap();
        let err = result.expect_err("Run should have failed");
        assert!(matches!(err, ReconciliationError::LedgerFetchError(_)), "Unexpected error: {err}");

        // The failure is recorded on the task so an operator can see what happened.
        let task = api.get_reconciliation_task(&task_id).await.unwrap().expect("Task not found");
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.end_time.is_some());
        assert!(task.error_message.as_deref().unwrap_or_default().contains("offline"));

        // No partial artifacts.
        assert!(api.get_discrepancies(&task_id).await.unwrap().is_empty());
        assert!(api.get_reports(&task_id).await.unwrap().is_empty());
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn provider_failure_marks_the_task_failed() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let api = new_test_api(MemoryLedger::default(), MemoryProvider::failing()).await;
        let task = api.create_settlement_reconciliation_task(business_date()).await.unwrap();
        let task_id = task.task_id.clone();
        let err = api.execute_reconciliation(task).await.unwrap().expect_err("Run should have failed");
        assert!(matches!(err, ReconciliationError::LedgerFetchError(_)));
        let task = api.get_reconciliation_task(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn slow_ledger_times_out() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let config = ReconciliationConfig { fetch_timeout: Duration::from_millis(50), ..Default::default() };
        let api = new_test_api_with_config(
            MemoryLedger::stalled(Duration::from_secs(30)),
            MemoryProvider::default(),
            config,
        )
        .await;
        let task = api.create_payment_reconciliation_task(business_date()).await.unwrap();
        let task_id = task.task_id.clone();

        let err = api.execute_reconciliation(task).await.unwrap().expect_err("Run should have timed out");
        assert!(matches!(err, ReconciliationError::FetchTimeout { .. }), "Unexpected error: {err}");

        let task = api.get_reconciliation_task(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error_message.as_deref().unwrap_or_default().contains("timed out"));
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}
