//! Data access for campaigns, donations and health packages.
//!
//! Handlers only see [`FundingStore`]. [`PostgresStore`] talks to the hosted
//! database through sea-orm; [`MemoryStore`] keeps everything in process and
//! backs the test suite and local runs without `DATABASE_URL`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DbErr, FromQueryResult};
use std::fmt;
use uuid::Uuid;

use crate::entities::{campaign, donation, health_package};

/// Upper bound for any `limit` query parameter.
pub const MAX_PAGE_LIMIT: u64 = 200;
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Money columns are `NUMERIC(14, 2)`.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest value a money column can hold.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, AMOUNT_SCALE)
}

#[derive(Debug)]
pub enum StoreError {
    Database(DbErr),
    /// The campaign vanished between lookup and aggregate update
    MissingCampaign(String),
    /// Applying the donation would push a campaign total past the column range
    Overflow(String),
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "{}", err),
            StoreError::MissingCampaign(id) => write!(f, "campaign {} does not exist", id),
            StoreError::Overflow(id) => write!(f, "campaign {} total is out of range", id),
            StoreError::Unavailable(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        StoreError::Database(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    /// Applies defaults and clamps `limit` to `1..=MAX_PAGE_LIMIT`.
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

/// Campaign listing filter. `approved = true` is always applied.
#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    pub status: Option<String>,
    pub page: Page,
}

#[derive(Debug, Clone)]
pub struct PackageFilter {
    pub active: bool,
    pub category: Option<String>,
}

/// A fully defaulted donation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    pub id: Uuid,
    pub campaign_id: String,
    pub donor_id: Option<String>,
    pub donor_email: String,
    pub donor_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub tx_id: Option<String>,
    pub tx_verified: bool,
    pub status: String,
    pub message: Option<String>,
    pub donor_wallet: String,
    pub created_at: DateTime<Utc>,
}

impl NewDonation {
    pub fn into_model(self) -> donation::Model {
        donation::Model {
            id: self.id,
            campaign_id: self.campaign_id,
            donor_id: self.donor_id,
            donor_email: self.donor_email,
            donor_name: self.donor_name,
            amount: self.amount,
            currency: self.currency,
            method: self.method,
            tx_id: self.tx_id,
            tx_verified: self.tx_verified,
            status: self.status,
            message: self.message,
            donor_wallet: self.donor_wallet,
            created_at: self.created_at,
        }
    }
}

/// Sum and count of completed donations for one campaign.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct LedgerTotals {
    pub campaign_id: String,
    pub total: Option<Decimal>,
    pub donations: i64,
}

#[async_trait]
pub trait FundingStore: Send + Sync {
    /// Short name used in logs and the health payload.
    fn backend_tag(&self) -> &'static str;

    async fn list_campaigns(&self, filter: &CampaignFilter) -> Result<Vec<campaign::Model>, StoreError>;

    async fn find_campaign(&self, id: &str) -> Result<Option<campaign::Model>, StoreError>;

    async fn list_packages(&self, filter: &PackageFilter) -> Result<Vec<health_package::Model>, StoreError>;

    /// Donations for one campaign, newest first.
    async fn list_donations(&self, campaign_id: &str, page: Page) -> Result<Vec<donation::Model>, StoreError>;

    /// Inserts the donation and applies it to the campaign totals as one
    /// atomic unit. Either both writes land or neither does.
    async fn record_donation(&self, donation: NewDonation) -> Result<donation::Model, StoreError>;

    /// Per-campaign totals of completed donations.
    async fn ledger_totals(&self) -> Result<Vec<LedgerTotals>, StoreError>;

    /// Raises `raised_amount`/`current_amount` and `donor_count` to at least
    /// the ledger values. Never lowers either. Returns whether a row changed.
    async fn lift_campaign_totals(&self, ledger: &LedgerTotals) -> Result<bool, StoreError>;

    /// Copies `raised_amount` into `current_amount` wherever they differ.
    async fn sync_current_amounts(&self) -> Result<u64, StoreError>;
}
