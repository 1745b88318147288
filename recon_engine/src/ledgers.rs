//! Ledger fetch contracts.
//!
//! The reconciliation engine compares two independently sourced ledgers. It does not own either of them; it only
//! consumes them through the traits in this module:
//!
//! * [`PaymentLedger`] is the internal payment store (typically the platform's order/payment database).
//! * [`SettlementClient`] is the third-party payment processor's reconciliation feed.
//!
//! Implementations are expected to perform I/O; the orchestrator wraps every call in a timeout and treats fetch
//! failures as a failed run. The record types here are flat snapshots keyed by transaction id, which is all the
//! matcher needs.
use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use recon_common::MoneyCents;
use serde::{Deserialize, Serialize};

//--------------------------------------  InternalPaymentRecord  -----------------------------------------------------
/// A payment row from the internal store, reduced to the fields reconciliation cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalPaymentRecord {
    /// The provider-assigned transaction id. The join key.
    pub transaction_id: String,
    pub order_id: String,
    pub amount: MoneyCents,
    pub status: InternalPaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InternalPaymentStatus {
    Created,
    Success,
    Failed,
    Refunded,
}

impl std::fmt::Display for InternalPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternalPaymentStatus::Created => write!(f, "Created"),
            InternalPaymentStatus::Success => write!(f, "Success"),
            InternalPaymentStatus::Failed => write!(f, "Failed"),
            InternalPaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

//-------------------------------------- ExternalTransactionRecord ---------------------------------------------------
/// One transaction from the provider's settlement feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTransactionRecord {
    /// The provider's transaction id. The join key.
    pub transaction_id: String,
    /// The merchant-side order number the provider echoes back.
    pub out_trade_no: String,
    pub amount: MoneyCents,
    /// The provider's own state string (e.g. "SUCCESS", "REFUND"). Opaque to the matcher.
    pub trade_state: String,
    pub time_end: DateTime<Utc>,
}

//--------------------------------------  ExternalRefundRecord  ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRefundRecord {
    pub transaction_id: String,
    pub out_refund_no: String,
    pub amount: MoneyCents,
    pub refund_status: String,
    pub success_time: Option<DateTime<Utc>>,
}

//-------------------------------------- ExternalSettlementRecord ----------------------------------------------------
/// A daily settlement summary row from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSettlementRecord {
    pub settlement_date: NaiveDate,
    pub total_transactions: i64,
    pub total_amount: MoneyCents,
    pub fee_amount: MoneyCents,
    pub net_amount: MoneyCents,
}

//--------------------------------------     PaymentLedger     -------------------------------------------------------
/// Read access to the internal payment store.
///
/// The futures are `Send` because reconciliation runs execute on the runtime's worker pool.
pub trait PaymentLedger: Clone {
    type Error: std::error::Error + Send;

    /// All payments created within `[start, end]`, inclusive. The orchestrator passes a full-day window for the
    /// task's business date.
    fn payments_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<InternalPaymentRecord>, Self::Error>> + Send;
}

//--------------------------------------    SettlementClient    ------------------------------------------------------
/// Read access to the provider's reconciliation feeds.
pub trait SettlementClient: Clone {
    type Error: std::error::Error + Send;

    /// The provider's transaction records for the given business date.
    fn fetch_transactions(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<ExternalTransactionRecord>, Self::Error>> + Send;

    /// The provider's refund records for the given business date.
    fn fetch_refunds(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<ExternalRefundRecord>, Self::Error>> + Send;

    /// The provider's settlement summaries for the given business date.
    fn fetch_settlements(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<ExternalSettlementRecord>, Self::Error>> + Send;
}
