//! Payment Reconciliation Engine
//!
//! The reconciliation engine compares the merchant's internal payment ledger against the settlement provider's
//! records for a business date, persists every discrepancy it finds, and produces summary and detail reports for
//! finance review. This library contains the core logic and is deployment-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). Currently, Sqlite is the supported backend. You should never
//!    need to access the database directly. Instead, use the public API provided by the engine. The exception is
//!    the data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The ledger sources ([`mod@ledgers`]). These are the two sides of every reconciliation: the internal payment
//!    store and the external settlement provider. Implement [`PaymentLedger`] and [`SettlementClient`] to plug in
//!    real data sources.
//! 3. The engine public API ([`mod@recon_api`]). This provides the public-facing functionality: creating and
//!    executing reconciliation tasks, querying their results, resolving discrepancies and purging expired records.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when a run starts,
//! completes or fails, and when an operator resolves a discrepancy. A simple Actor framework is used so that you
//! can easily hook into these events and perform custom actions.
mod db;

pub mod config;
pub mod db_types;
pub mod events;
pub mod ledgers;
pub mod matcher;
mod recon_api;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{self, SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{DiscrepancyManagement, ReportManagement, ResolvedFields, TaskManagement, TaskUpdate};
pub use ledgers::{PaymentLedger, SettlementClient};
pub use recon_api::{report_builder, ReconciliationApi, ReconciliationError};
