use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use log::error;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Type;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------      TaskType        --------------------------------------------------------
/// The kind of ledger comparison a reconciliation task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TaskType {
    /// Internal payments vs the provider's transaction feed.
    Payment,
    /// Internal refunds vs the provider's refund feed.
    Refund,
    /// The provider's daily settlement summaries.
    Settlement,
}

impl Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::Payment => write!(f, "Payment"),
            TaskType::Refund => write!(f, "Refund"),
            TaskType::Settlement => write!(f, "Settlement"),
        }
    }
}

impl FromStr for TaskType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Payment" => Ok(Self::Payment),
            "Refund" => Ok(Self::Refund),
            "Settlement" => Ok(Self::Settlement),
            s => Err(ConversionError(format!("Invalid task type: {s}"))),
        }
    }
}

//--------------------------------------     TaskStatus       --------------------------------------------------------
/// Reconciliation task lifecycle state. Transitions are monotonic:
/// `Pending → Running → {Success, Failed}`. `Success` and `Failed` are terminal; a re-run is a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }

    /// Whether the monotonic lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running) |
                (TaskStatus::Running, TaskStatus::Success) |
                (TaskStatus::Running, TaskStatus::Failed) |
                // A run that dies before reaching Running is still recorded as failed.
                (TaskStatus::Pending, TaskStatus::Failed)
        )
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Running => write!(f, "Running"),
            TaskStatus::Success => write!(f, "Success"),
            TaskStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Running" => Ok(Self::Running),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid task status: {s}"))),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid task status: {value}. But this conversion cannot fail. Defaulting to Pending");
            TaskStatus::Pending
        })
    }
}

//--------------------------------------  ReconciliationTask  --------------------------------------------------------
/// One reconciliation run: a comparison of two ledgers for a single business date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationTask {
    pub id: i64,
    /// Business identifier, unique across all tasks. Discrepancies and reports reference this.
    pub task_id: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    /// The business date being reconciled.
    pub task_date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_records: i64,
    pub matched_records: i64,
    pub unmatched_records: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReconciliationTask {
    /// Execution duration in milliseconds, or 0 if either timestamp is missing.
    pub fn execution_time_ms(&self) -> i64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).num_milliseconds(),
            _ => 0,
        }
    }
}

//--------------------------------------       NewTask        --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTask {
    pub task_id: String,
    pub task_type: TaskType,
    pub task_date: NaiveDate,
}

impl NewTask {
    pub fn payment(date: NaiveDate) -> Self {
        Self::new(TaskType::Payment, date)
    }

    pub fn refund(date: NaiveDate) -> Self {
        Self::new(TaskType::Refund, date)
    }

    pub fn settlement(date: NaiveDate) -> Self {
        Self::new(TaskType::Settlement, date)
    }

    fn new(task_type: TaskType, date: NaiveDate) -> Self {
        let prefix = match task_type {
            TaskType::Payment => "PAY",
            TaskType::Refund => "RFD",
            TaskType::Settlement => "STL",
        };
        let nonce = rand::thread_rng().gen::<u64>();
        let task_id = format!("{prefix}-{}-{nonce:016x}", date.format("%Y%m%d"));
        Self { task_id, task_type, task_date: date }
    }
}

//--------------------------------------   DiscrepancyType    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
pub enum DiscrepancyType {
    /// The transaction exists on one side only.
    Missing,
    /// The transaction exists on both sides with different amounts.
    Mismatch,
    /// A duplicate transaction id was seen on one side; the earlier record was displaced from the join.
    Extra,
}

impl Display for DiscrepancyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscrepancyType::Missing => write!(f, "Missing"),
            DiscrepancyType::Mismatch => write!(f, "Mismatch"),
            DiscrepancyType::Extra => write!(f, "Extra"),
        }
    }
}

//--------------------------------------     SourceSystem     --------------------------------------------------------
/// Which ledger a discrepancy is attributed to. For `Missing`, the side the record is absent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SourceSystem {
    /// Our own payment store.
    Internal,
    /// The third-party payment processor's feed.
    Provider,
}

impl Display for SourceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSystem::Internal => write!(f, "Internal"),
            SourceSystem::Provider => write!(f, "Provider"),
        }
    }
}

//--------------------------------------  DiscrepancyStatus   --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DiscrepancyStatus {
    Unresolved,
    Resolved,
}

impl Display for DiscrepancyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscrepancyStatus::Unresolved => write!(f, "Unresolved"),
            DiscrepancyStatus::Resolved => write!(f, "Resolved"),
        }
    }
}

//--------------------------------------     Discrepancy      --------------------------------------------------------
/// A single detected inconsistency between the internal ledger and the provider feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub id: i64,
    pub task_id: String,
    pub discrepancy_type: DiscrepancyType,
    pub source_system: SourceSystem,
    /// The transaction id of the record in question.
    pub record_id: String,
    /// Free-form snapshot of both sides plus computed deltas, for audit.
    pub record_details: Value,
    pub status: DiscrepancyStatus,
    pub resolution_notes: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    NewDiscrepancy    --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDiscrepancy {
    pub task_id: String,
    pub discrepancy_type: DiscrepancyType,
    pub source_system: SourceSystem,
    pub record_id: String,
    pub record_details: Value,
}

impl NewDiscrepancy {
    pub fn missing(task_id: &str, source_system: SourceSystem, record_id: &str, record_details: Value) -> Self {
        Self::new(task_id, DiscrepancyType::Missing, source_system, record_id, record_details)
    }

    pub fn mismatch(task_id: &str, source_system: SourceSystem, record_id: &str, record_details: Value) -> Self {
        Self::new(task_id, DiscrepancyType::Mismatch, source_system, record_id, record_details)
    }

    pub fn extra(task_id: &str, source_system: SourceSystem, record_id: &str, record_details: Value) -> Self {
        Self::new(task_id, DiscrepancyType::Extra, source_system, record_id, record_details)
    }

    fn new(
        task_id: &str,
        discrepancy_type: DiscrepancyType,
        source_system: SourceSystem,
        record_id: &str,
        record_details: Value,
    ) -> Self {
        Self {
            task_id: task_id.to_string(),
            discrepancy_type,
            source_system,
            record_id: record_id.to_string(),
            record_details,
        }
    }
}

//--------------------------------------      ReportType      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ReportType {
    Summary,
    Detail,
}

impl Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportType::Summary => write!(f, "Summary"),
            ReportType::Detail => write!(f, "Detail"),
        }
    }
}

//-------------------------------------- ReconciliationReport --------------------------------------------------------
/// Persisted audit artifact of a completed task. Write-once; removed only by the retention sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub id: i64,
    pub task_id: String,
    pub report_type: ReportType,
    pub report_data: Value,
    pub generated_at: DateTime<Utc>,
}

//--------------------------------------      NewReport       --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewReport {
    pub task_id: String,
    pub report_type: ReportType,
    pub report_data: Value,
}

impl NewReport {
    pub fn summary(task_id: &str, report_data: Value) -> Self {
        Self { task_id: task_id.to_string(), report_type: ReportType::Summary, report_data }
    }

    pub fn detail(task_id: &str, report_data: Value) -> Self {
        Self { task_id: task_id.to_string(), report_type: ReportType::Detail, report_data }
    }
}

//--------------------------------------     MatchResult      --------------------------------------------------------
/// The outcome of one matching pass over two ledgers. Produced by [`crate::matcher`]; persisted by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// `|internal| + |external|`, counted before deduplication.
    pub total_records: i64,
    pub matched_records: i64,
    pub unmatched_records: i64,
    pub discrepancies: Vec<NewDiscrepancy>,
    /// Human-readable discrepancy count, present iff `discrepancies` is non-empty.
    pub error_message: Option<String>,
}
