//! Database backend contracts.
//!
//! This module defines the interface contracts that a persistence backend must expose to act as the store for the
//! reconciliation engine. The engine itself never touches the database directly; the orchestrator in
//! [`crate::recon_api`] is generic over these traits and the SQLite implementation lives in [`crate::db::sqlite`].
//!
//! ## Traits
//! * [`TaskManagement`] owns the task rows: creation, guarded status transitions, lookups by business id and date
//!   range, and the advisory "is anything running" query.
//! * [`DiscrepancyManagement`] owns the discrepancy rows: the single bulk insert per run, queries, the
//!   first-writer-wins resolve update, and the retention delete.
//! * [`ReportManagement`] owns the write-once report rows and their retention delete.
//!
//! All methods return `Send` futures so a whole reconciliation run can be submitted to the tokio worker pool.
mod data_objects;
mod discrepancy_management;
mod report_management;
mod task_management;

pub use data_objects::{ResolvedFields, TaskUpdate};
pub use discrepancy_management::DiscrepancyManagement;
pub use report_management::ReportManagement;
pub use task_management::TaskManagement;
