use log::*;
use recon_engine::db_types::{DiscrepancyType, ReportType, SourceSystem, TaskStatus, TaskType};
use tokio::runtime::Runtime;

mod support;

use support::{
    business_date,
    internal_payment,
    new_test_api,
    provider_transaction,
    tear_down,
    MemoryLedger,
    MemoryProvider,
};

#[test]
fn clean_run_succeeds_with_counts_and_summary() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let date = business_date();
        let ledger = MemoryLedger::with_payments(vec![
            internal_payment(date, "tx-1", "order-1", 10_000),
            internal_payment(date, "tx-2", "order-2", 2_500),
        ]);
        let provider = MemoryProvider::with_transactions(vec![
            provider_transaction(date, "tx-1", "order-1", 10_000),
            provider_transaction(date, "tx-2", "order-2", 2_500),
        ]);
        let api = new_test_api(ledger, provider).await;

        let task = api.create_payment_reconciliation_task(date).await.expect("Error creating task");
        assert_eq!(task.task_type, TaskType::Payment);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.task_id.starts_with("PAY-20260314-"));

        let finished = api.execute_reconciliation(task).await.unwrap().expect("Run failed");
        assert_eq!(finished.status, TaskStatus::Success);
        assert_eq!(finished.total_records, 4);
        assert_eq!(finished.matched_records, 2);
        assert_eq!(finished.unmatched_records, 0);
        assert!(finished.start_time.is_some());
        assert!(finished.end_time.is_some());
        assert!(finished.error_message.is_none());

        let discrepancies = api.get_discrepancies(&finished.task_id).await.unwrap();
        assert!(discrepancies.is_empty());
        let reports = api.get_reports(&finished.task_id).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].report_type, ReportType::Summary);
        let data = &reports[0].report_data;
        assert_eq!(data["totalRecords"], 4);
        assert_eq!(data["matchedRecords"], 2);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn discrepancies_fail_the_run_and_are_persisted() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let date = business_date();
        // tx-1 matches, tx-2 differs by 100 cents, tx-3 never settled, tx-4 is provider-only.
        let ledger = MemoryLedger::with_payments(vec![
            internal_payment(date, "tx-1", "order-1", 10_000),
            internal_payment(date, "tx-2", "order-2", 2_500),
            internal_payment(date, "tx-3", "order-3", 999),
        ]);
        let provider = MemoryProvider::with_transactions(vec![
            provider_transaction(date, "tx-1", "order-1", 10_000),
            provider_transaction(date, "tx-2", "order-2", 2_600),
            provider_transaction(date, "tx-4", "order-4", 4_200),
        ]);
        let api = new_test_api(ledger, provider).await;

        let task = api.create_payment_reconciliation_task(date).await.unwrap();
        let finished = api.execute_reconciliation(task).await.unwrap().expect("Run failed");
        assert_eq!(finished.status, TaskStatus::Failed);
        assert_eq!(finished.total_records, 6);
        assert_eq!(finished.matched_records, 1);
        assert_eq!(finished.unmatched_records, 3);
        assert_eq!(finished.error_message.as_deref(), Some("3 reconciliation discrepancies found"));

        let discrepancies = api.get_discrepancies(&finished.task_id).await.unwrap();
        assert_eq!(discrepancies.len(), 3);
        let mismatch = discrepancies.iter().find(|d| d.record_id == "tx-2").unwrap();
        assert_eq!(mismatch.discrepancy_type, DiscrepancyType::Mismatch);
        assert_eq!(mismatch.source_system, SourceSystem::Internal);
        assert_eq!(mismatch.record_details["internal"]["amountCents"], 2_500);
        assert_eq!(mismatch.record_details["provider"]["amountCents"], 2_600);
        assert_eq!(mismatch.record_details["amountDifferenceCents"], 100);
        let missing = discrepancies.iter().find(|d| d.record_id == "tx-3").unwrap();
        assert_eq!(missing.discrepancy_type, DiscrepancyType::Missing);
        assert_eq!(missing.source_system, SourceSystem::Provider);
        let extra = discrepancies.iter().find(|d| d.record_id == "tx-4").unwrap();
        assert_eq!(extra.discrepancy_type, DiscrepancyType::Missing);
        assert_eq!(extra.source_system, SourceSystem::Internal);

        let reports = api.get_reports(&finished.task_id).await.unwrap();
        assert_eq!(reports.len(), 2);
        let detail = reports.iter().find(|r| r.report_type == ReportType::Detail).unwrap();
        assert_eq!(detail.report_data["discrepancies"].as_array().unwrap().len(), 3);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn task_queries_and_running_flag() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let date = business_date();
        let api = new_test_api(MemoryLedger::default(), MemoryProvider::default()).await;

        assert!(!api.has_running_task().await.unwrap());
        let task = api.create_payment_reconciliation_task(date).await.unwrap();
        assert!(api.has_running_task().await.unwrap(), "A pending task counts as active");

        let fetched = api.get_reconciliation_task(&task.task_id).await.unwrap().expect("Task not found");
        assert_eq!(fetched.id, task.id);
        assert!(api.get_reconciliation_task("PAY-20260314-does-not-exist").await.unwrap().is_none());

        let finished = api.execute_reconciliation(task).await.unwrap().unwrap();
        assert!(!api.has_running_task().await.unwrap());

        let in_range = api
            .get_reconciliation_tasks_by_date_range(date, date)
            .await
            .unwrap();
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].task_id, finished.task_id);
        let out_of_range = api
            .get_reconciliation_tasks_by_date_range(
                date.succ_opt().unwrap(),
                date.succ_opt().unwrap(),
            )
            .await
            .unwrap();
        assert!(out_of_range.is_empty());
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn refund_run_completes_with_zero_counts() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let date = business_date();
        let api = new_test_api(MemoryLedger::default(), MemoryProvider::default()).await;
        let task = api.create_refund_reconciliation_task(date).await.unwrap();
        assert_eq!(task.task_type, TaskType::Refund);
        assert!(task.task_id.starts_with("RFD-"));
        let finished = api.execute_reconciliation(task).await.unwrap().unwrap();
        assert_eq!(finished.status, TaskStatus::Success);
        assert_eq!(finished.total_records, 0);
        assert_eq!(finished.matched_records, 0);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn settlement_run_counts_every_summary_row_as_matched() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        use chrono::NaiveDate;
        use recon_common::MoneyCents;
        use recon_engine::ledgers::ExternalSettlementRecord;

        let date = business_date();
        let settlement = ExternalSettlementRecord {
            settlement_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            total_transactions: 42,
            total_amount: MoneyCents::from(100_000),
            fee_amount: MoneyCents::from(600),
            net_amount: MoneyCents::from(99_400),
        };
        let api = new_test_api(MemoryLedger::default(), MemoryProvider::with_settlements(vec![settlement])).await;
        let task = api.create_settlement_reconciliation_task(date).await.unwrap();
        assert!(task.task_id.starts_with("STL-"));
        let finished = api.execute_reconciliation(task).await.unwrap().unwrap();
        assert_eq!(finished.status, TaskStatus::Success);
        assert_eq!(finished.total_records, 1);
        assert_eq!(finished.matched_records, 1);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}
