//! Builds the persisted audit artifacts for a terminal task.
//!
//! The summary report is always generated; the detail report only when the run produced discrepancies. Payload
//! shapes are plain JSON so downstream audit tooling never needs this crate's types to read them.
use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::db_types::{Discrepancy, MatchResult, NewReport, ReconciliationTask};

/// The summary payload: counts, a per-type histogram, a bounded preview of discrepancies and the execution
/// duration. `preview_limit` bounds the preview (default 50).
pub fn summary_report(task: &ReconciliationTask, result: &MatchResult, preview_limit: usize) -> NewReport {
    // BTreeMap keeps the histogram deterministically ordered for byte-stable payloads.
    let mut histogram: BTreeMap<String, i64> = BTreeMap::new();
    for d in &result.discrepancies {
        *histogram.entry(d.discrepancy_type.to_string()).or_insert(0) += 1;
    }
    let previews: Vec<Value> = result
        .discrepancies
        .iter()
        .take(preview_limit)
        .map(|d| {
            json!({
                "type": d.discrepancy_type.to_string(),
                "sourceSystem": d.source_system.to_string(),
                "recordId": d.record_id,
            })
        })
        .collect();
    let data = json!({
        "taskType": task.task_type.to_string(),
        "taskDate": task.task_date,
        "totalRecords": result.total_records,
        "matchedRecords": result.matched_records,
        "unmatchedRecords": result.unmatched_records,
        "discrepancyHistogram": histogram,
        "discrepancyPreviews": previews,
        "executionTimeMs": task.execution_time_ms(),
    });
    NewReport::summary(&task.task_id, data)
}

/// The detail payload: every stored field of every discrepancy, for compliance trails. Callers pass the persisted
/// rows so the payload carries their assigned ids.
pub fn detail_report(task: &ReconciliationTask, discrepancies: &[Discrepancy]) -> NewReport {
    let rows: Vec<Value> = discrepancies
        .iter()
        .map(|d| {
            json!({
                "id": d.id,
                "discrepancyType": d.discrepancy_type.to_string(),
                "sourceSystem": d.source_system.to_string(),
                "recordId": d.record_id,
                "recordDetails": d.record_details,
                "status": d.status.to_string(),
                "resolutionNotes": d.resolution_notes,
                "resolvedBy": d.resolved_by,
                "resolvedAt": d.resolved_at,
                "createdAt": d.created_at,
            })
        })
        .collect();
    let data = json!({
        "taskType": task.task_type.to_string(),
        "discrepancies": rows,
    });
    NewReport::detail(&task.task_id, data)
}
