use log::*;
use recon_engine::db_types::DiscrepancyStatus;
use tokio::runtime::Runtime;

mod support;

use support::{business_date, internal_payment, new_test_api, tear_down, MemoryLedger, MemoryProvider, TestApi};

/// Runs a reconciliation that produces exactly two missing-settlement discrepancies.
async fn api_with_discrepancies() -> (TestApi, String) {
    let date = business_date();
    let ledger = MemoryLedger::with_payments(vec![
        internal_payment(date, "tx-1", "order-1", 1_000),
        internal_payment(date, "tx-2", "order-2", 2_000),
    ]);
    let api = new_test_api(ledger, MemoryProvider::default()).await;
    let task = api.create_payment_reconciliation_task(date).await.unwrap();
    let finished = api.execute_reconciliation(task).await.unwrap().unwrap();
    (api, finished.task_id)
}

#[test]
fn resolving_records_notes_resolver_and_timestamp() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let (api, task_id) = api_with_discrepancies().await;
        let unresolved = api.get_unresolved_discrepancies().await.unwrap();
        assert_eq!(unresolved.len(), 2);

        let id = unresolved[0].id;
        assert!(api.resolve_discrepancy(id, "Provider settled next day", "alice").await);

        let remaining = api.get_unresolved_discrepancies().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_ne!(remaining[0].id, id);

        let resolved =
            api.get_discrepancies(&task_id).await.unwrap().into_iter().find(|d| d.id == id).unwrap();
        assert_eq!(resolved.status, DiscrepancyStatus::Resolved);
        assert_eq!(resolved.resolution_notes.as_deref(), Some("Provider settled next day"));
        assert_eq!(resolved.resolved_by.as_deref(), Some("alice"));
        assert!(resolved.resolved_at.is_some());
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn resolving_twice_is_a_no_op() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let (api, task_id) = api_with_discrepancies().await;
        let id = api.get_unresolved_discrepancies().await.unwrap()[0].id;
        assert!(api.resolve_discrepancy(id, "first", "alice").await);
        assert!(!api.resolve_discrepancy(id, "second", "bob").await);

        // The first resolution is untouched.
        let resolved =
            api.get_discrepancies(&task_id).await.unwrap().into_iter().find(|d| d.id == id).unwrap();
        assert_eq!(resolved.resolution_notes.as_deref(), Some("first"));
        assert_eq!(resolved.resolved_by.as_deref(), Some("alice"));
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn resolving_an_unknown_id_returns_false() {
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let (api, _task_id) = api_with_discrepancies().await;
        assert!(!api.resolve_discrepancy(999_999, "ghost", "alice").await);
        assert_eq!(api.get_unresolved_discrepancies().await.unwrap().len(), 2);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}
