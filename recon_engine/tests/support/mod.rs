#![allow(dead_code)]
//! Shared scaffolding for the integration tests: a throwaway Sqlite database per test, plus in-memory ledger
//! implementations whose contents (and failure modes) each test controls.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use log::*;
use recon_common::MoneyCents;
use recon_engine::{
    config::ReconciliationConfig,
    events::EventProducers,
    ledgers::{
        ExternalRefundRecord,
        ExternalSettlementRecord,
        ExternalTransactionRecord,
        InternalPaymentRecord,
        InternalPaymentStatus,
        PaymentLedger,
        SettlementClient,
    },
    sqlite,
    ReconciliationApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use thiserror::Error;

pub async fn prepare_test_env(url: &str) {
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    // Sqlite needs the parent directory to exist before it can create the file.
    std::fs::create_dir_all("../data").expect("Error creating data directory");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_recon_{}", rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    sqlite::run_migrations(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub type TestApi = ReconciliationApi<SqliteDatabase, MemoryLedger, MemoryProvider>;

pub async fn new_test_api(ledger: MemoryLedger, provider: MemoryProvider) -> TestApi {
    new_test_api_with_config(ledger, provider, ReconciliationConfig::default()).await
}

pub async fn new_test_api_with_config(
    ledger: MemoryLedger,
    provider: MemoryProvider,
    config: ReconciliationConfig,
) -> TestApi {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database");
    ReconciliationApi::new(db, ledger, provider, EventProducers::default(), config)
}

pub async fn tear_down(api: TestApi) {
    let mut db = api.db().clone();
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        error!("🚀️ Failed to drop test database {url}: {e}");
    }
}

pub fn business_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

pub fn mid_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0).unwrap().and_utc()
}

pub fn internal_payment(date: NaiveDate, tx_id: &str, order_id: &str, cents: i64) -> InternalPaymentRecord {
    InternalPaymentRecord {
        transaction_id: tx_id.to_string(),
        order_id: order_id.to_string(),
        amount: MoneyCents::from(cents),
        status: InternalPaymentStatus::Success,
        created_at: mid_day(date),
    }
}

pub fn provider_transaction(date: NaiveDate, tx_id: &str, order_id: &str, cents: i64) -> ExternalTransactionRecord {
    ExternalTransactionRecord {
        transaction_id: tx_id.to_string(),
        out_trade_no: order_id.to_string(),
        amount: MoneyCents::from(cents),
        trade_state: "SUCCESS".to_string(),
        time_end: mid_day(date),
    }
}

#[derive(Debug, Clone, Error)]
#[error("ledger source is offline")]
pub struct LedgerOffline;

//--------------------------------------      MemoryLedger      ------------------------------------------------------

/// An internal payment store backed by a fixed vector. `fail` makes every fetch return an error; `delay` stalls
/// fetches so timeout behaviour can be tested.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    payments: Arc<Vec<InternalPaymentRecord>>,
    fail: bool,
    delay: Option<Duration>,
}

impl MemoryLedger {
    pub fn with_payments(payments: Vec<InternalPaymentRecord>) -> Self {
        Self { payments: Arc::new(payments), fail: false, delay: None }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn stalled(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }
}

impl PaymentLedger for MemoryLedger {
    type Error = LedgerOffline;

    async fn payments_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InternalPaymentRecord>, Self::Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(LedgerOffline);
        }
        let result =
            self.payments.iter().filter(|p| p.created_at >= start && p.created_at <= end).cloned().collect();
        Ok(result)
    }
}

//--------------------------------------     MemoryProvider     ------------------------------------------------------

/// A provider feed backed by fixed vectors.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    transactions: Arc<Vec<ExternalTransactionRecord>>,
    refunds: Arc<Vec<ExternalRefundRecord>>,
    settlements: Arc<Vec<ExternalSettlementRecord>>,
    fail: bool,
}

impl MemoryProvider {
    pub fn with_transactions(transactions: Vec<ExternalTransactionRecord>) -> Self {
        Self { transactions: Arc::new(transactions), ..Self::default() }
    }

    pub fn with_refunds(refunds: Vec<ExternalRefundRecord>) -> Self {
        Self { refunds: Arc::new(refunds), ..Self::default() }
    }

    pub fn with_settlements(settlements: Vec<ExternalSettlementRecord>) -> Self {
        Self { settlements: Arc::new(settlements), ..Self::default() }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }
}

impl SettlementClient for MemoryProvider {
    type Error = LedgerOffline;

    async fn fetch_transactions(&self, _date: NaiveDate) -> Result<Vec<ExternalTransactionRecord>, Self::Error> {
        if self.fail {
            return Err(LedgerOffline);
        }
        Ok(self.transactions.as_ref().clone())
    }

    async fn fetch_refunds(&self, _date: NaiveDate) -> Result<Vec<ExternalRefundRecord>, Self::Error> {
        if self.fail {
            return Err(LedgerOffline);
        }
        Ok(self.refunds.as_ref().clone())
    }

    async fn fetch_settlements(&self, _date: NaiveDate) -> Result<Vec<ExternalSettlementRecord>, Self::Error> {
        if self.fail {
            return Err(LedgerOffline);
        }
        Ok(self.settlements.as_ref().clone())
    }
}
