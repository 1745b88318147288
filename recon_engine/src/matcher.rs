//! The matching core.
//!
//! [`match_payments`] joins the internal payment ledger against the provider's transaction feed for one business
//! date and classifies every record as matched, amount-mismatched or missing on one side. It is a pure function:
//! the orchestrator persists the resulting discrepancy list in a single bulk write afterwards.
//!
//! All amount comparisons are on integer cents ([`MoneyCents`]). Major-unit values appear only inside the detail
//! snapshots, for humans reading audit reports.
use std::collections::HashMap;

use log::debug;
use recon_common::MoneyCents;
use serde_json::{json, Value};

use crate::{
    db_types::{MatchResult, NewDiscrepancy, SourceSystem},
    ledgers::{ExternalTransactionRecord, InternalPaymentRecord},
};

/// Join both record sets by transaction id and emit a discrepancy for every inconsistency.
///
/// Classification rules:
/// * internal record with no provider counterpart → `Missing`, attributed to [`SourceSystem::Provider`];
/// * provider record with no internal counterpart → `Missing`, attributed to [`SourceSystem::Internal`];
/// * present on both sides with different amounts → `Mismatch`, attributed to [`SourceSystem::Internal`],
///   carrying the absolute cent delta;
/// * duplicate transaction id within one side → `Extra` for each displaced earlier record (the last record wins
///   the join slot).
///
/// `total_records` counts both input lists before deduplication. `unmatched_records` equals the number of
/// discrepancies. No ordering is guaranteed on the discrepancy list.
pub fn match_payments(
    internal: &[InternalPaymentRecord],
    external: &[ExternalTransactionRecord],
    task_id: &str,
) -> MatchResult {
    let mut discrepancies = Vec::new();

    let mut internal_map: HashMap<&str, &InternalPaymentRecord> = HashMap::with_capacity(internal.len());
    for payment in internal {
        if let Some(displaced) = internal_map.insert(payment.transaction_id.as_str(), payment) {
            discrepancies.push(duplicate_internal(task_id, displaced));
        }
    }
    let mut external_map: HashMap<&str, &ExternalTransactionRecord> = HashMap::with_capacity(external.len());
    for tx in external {
        if let Some(displaced) = external_map.insert(tx.transaction_id.as_str(), tx) {
            discrepancies.push(duplicate_external(task_id, displaced));
        }
    }

    let mut matched_count = 0i64;

    // Pass 1: every internal record either matches, mismatches on amount, or is missing from the provider feed.
    for payment in internal_map.values() {
        match external_map.get(payment.transaction_id.as_str()) {
            None => discrepancies.push(missing_on_provider(task_id, payment)),
            Some(tx) if payment.amount != tx.amount => {
                discrepancies.push(amount_mismatch(task_id, payment, tx));
            },
            Some(_) => matched_count += 1,
        }
    }

    // Pass 2: provider records with no internal counterpart. Records on both sides were handled in pass 1.
    for tx in external_map.values() {
        if !internal_map.contains_key(tx.transaction_id.as_str()) {
            discrepancies.push(missing_on_internal(task_id, tx));
        }
    }

    let total_records = (internal.len() + external.len()) as i64;
    let unmatched_records = discrepancies.len() as i64;
    let error_message =
        (!discrepancies.is_empty()).then(|| format!("{} reconciliation discrepancies found", discrepancies.len()));
    debug!(
        "🔀️ Task {task_id}: {total_records} records, {matched_count} matched, {unmatched_records} discrepancies"
    );

    MatchResult {
        total_records,
        matched_records: matched_count,
        unmatched_records,
        discrepancies,
        error_message,
    }
}

fn internal_snapshot(payment: &InternalPaymentRecord) -> Value {
    json!({
        "transactionId": payment.transaction_id,
        "orderId": payment.order_id,
        "amount": payment.amount.to_major_units(),
        "amountCents": payment.amount.value(),
        "status": payment.status.to_string(),
        "createdAt": payment.created_at,
    })
}

fn external_snapshot(tx: &ExternalTransactionRecord) -> Value {
    json!({
        "transactionId": tx.transaction_id,
        "outTradeNo": tx.out_trade_no,
        "amount": tx.amount.to_major_units(),
        "amountCents": tx.amount.value(),
        "tradeState": tx.trade_state,
        "timeEnd": tx.time_end,
    })
}

fn missing_on_provider(task_id: &str, payment: &InternalPaymentRecord) -> NewDiscrepancy {
    let details = json!({
        "internal": internal_snapshot(payment),
        "amount": payment.amount.to_major_units(),
        "amountCents": payment.amount.value(),
        "createdAt": payment.created_at,
    });
    NewDiscrepancy::missing(task_id, SourceSystem::Provider, &payment.transaction_id, details)
}

fn missing_on_internal(task_id: &str, tx: &ExternalTransactionRecord) -> NewDiscrepancy {
    let details = json!({
        "provider": external_snapshot(tx),
        "amount": tx.amount.to_major_units(),
        "amountCents": tx.amount.value(),
    });
    NewDiscrepancy::missing(task_id, SourceSystem::Internal, &tx.transaction_id, details)
}

fn amount_mismatch(task_id: &str, payment: &InternalPaymentRecord, tx: &ExternalTransactionRecord) -> NewDiscrepancy {
    let delta: MoneyCents = payment.amount.abs_difference(tx.amount);
    let details = json!({
        "internal": internal_snapshot(payment),
        "provider": external_snapshot(tx),
        "amountDifference": delta.to_major_units(),
        "amountDifferenceCents": delta.value(),
    });
    NewDiscrepancy::mismatch(task_id, SourceSystem::Internal, &payment.transaction_id, details)
}

fn duplicate_internal(task_id: &str, displaced: &InternalPaymentRecord) -> NewDiscrepancy {
    let details = json!({
        "internal": internal_snapshot(displaced),
        "reason": "duplicate transaction id in internal ledger",
    });
    NewDiscrepancy::extra(task_id, SourceSystem::Internal, &displaced.transaction_id, details)
}

fn duplicate_external(task_id: &str, displaced: &ExternalTransactionRecord) -> NewDiscrepancy {
    let details = json!({
        "provider": external_snapshot(displaced),
        "reason": "duplicate transaction id in provider feed",
    });
    NewDiscrepancy::extra(task_id, SourceSystem::Provider, &displaced.transaction_id, details)
}
