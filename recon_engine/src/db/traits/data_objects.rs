use chrono::{DateTime, Utc};

use crate::db_types::TaskStatus;

/// The mutable subset of a task row. Only the fields the lifecycle is allowed to touch are exposed here; identity
/// fields (task id, type, business date) are immutable after creation.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_records: Option<i64>,
    pub matched_records: Option<i64>,
    pub unmatched_records: Option<i64>,
    pub error_message: Option<String>,
}

impl TaskUpdate {
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_start_time(mut self, t: DateTime<Utc>) -> Self {
        self.start_time = Some(t);
        self
    }

    pub fn with_end_time(mut self, t: DateTime<Utc>) -> Self {
        self.end_time = Some(t);
        self
    }

    pub fn with_counts(mut self, total: i64, matched: i64, unmatched: i64) -> Self {
        self.total_records = Some(total);
        self.matched_records = Some(matched);
        self.unmatched_records = Some(unmatched);
        self
    }

    pub fn with_error_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.error_message = Some(msg.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.total_records.is_none()
            && self.matched_records.is_none()
            && self.unmatched_records.is_none()
            && self.error_message.is_none()
    }
}

/// The fields a successful resolve writes, atomically and exactly once.
#[derive(Debug, Clone)]
pub struct ResolvedFields {
    pub resolution_notes: String,
    pub resolved_by: String,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedFields {
    pub fn new<S1: Into<String>, S2: Into<String>>(notes: S1, resolved_by: S2) -> Self {
        Self { resolution_notes: notes.into(), resolved_by: resolved_by.into(), resolved_at: Utc::now() }
    }
}
