//! # Reconciliation engine public API
//!
//! The `recon_api` module exposes the programmatic API for the reconciliation engine. An API instance is created by
//! supplying a persistence backend that implements the traits in [`crate::db::traits`], plus the two ledger
//! fetchers from [`crate::ledgers`]:
//!
//! ```rust,ignore
//! use recon_engine::{config::ReconciliationConfig, ReconciliationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/reconciliation.db", 5).await?;
//! let api = ReconciliationApi::new(db, payment_ledger, settlement_client, producers, ReconciliationConfig::default());
//! let task = api.create_payment_reconciliation_task(business_date).await?;
//! let handle = api.execute_reconciliation(task);
//! let finished = handle.await??;
//! ```
//!
//! Execution is submitted to the tokio runtime and bounded by a semaphore sized from
//! [`crate::config::ReconciliationConfig::max_concurrent_runs`]; the caller gets a join handle back immediately.
mod errors;
mod reconciliation_api;
pub mod report_builder;

pub use errors::ReconciliationError;
pub use reconciliation_api::ReconciliationApi;
