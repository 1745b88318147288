use serde::{Deserialize, Serialize};

use crate::db_types::{Discrepancy, ReconciliationTask};

/// Emitted when a run has been marked `Running` and is about to fetch its ledgers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationStartedEvent {
    pub task: ReconciliationTask,
}

impl ReconciliationStartedEvent {
    pub fn new(task: ReconciliationTask) -> Self {
        Self { task }
    }
}

/// Emitted when a run reaches `Success`, or `Failed` because discrepancies were found. The task carries the final
/// counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationCompletedEvent {
    pub task: ReconciliationTask,
    pub discrepancy_count: i64,
}

impl ReconciliationCompletedEvent {
    pub fn new(task: ReconciliationTask) -> Self {
        let discrepancy_count = task.unmatched_records;
        Self { task, discrepancy_count }
    }
}

/// Emitted when a run aborts with an error (fetch, matcher or persistence failure, or timeout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationFailedEvent {
    pub task_id: String,
    pub error: String,
}

impl ReconciliationFailedEvent {
    pub fn new(task_id: String, error: String) -> Self {
        Self { task_id, error }
    }
}

/// Emitted when an operator resolves a discrepancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyResolvedEvent {
    pub discrepancy: Discrepancy,
}

impl DiscrepancyResolvedEvent {
    pub fn new(discrepancy: Discrepancy) -> Self {
        Self { discrepancy }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    ReconciliationStarted(ReconciliationStartedEvent),
    ReconciliationCompleted(ReconciliationCompletedEvent),
    ReconciliationFailed(ReconciliationFailedEvent),
    DiscrepancyResolved(DiscrepancyResolvedEvent),
}
