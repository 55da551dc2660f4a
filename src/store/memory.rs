use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

use super::{
    max_amount, CampaignFilter, FundingStore, LedgerTotals, NewDonation, PackageFilter, Page,
    StoreError,
};
use crate::entities::{campaign, donation, health_package};

#[derive(Default)]
struct Tables {
    campaigns: Vec<campaign::Model>,
    donations: Vec<donation::Model>,
    packages: Vec<health_package::Model>,
}

/// In-process store. One mutex guards every table, so `record_donation`
/// is atomic with respect to every other call.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_calls: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_campaigns(mut self, campaigns: Vec<campaign::Model>) -> Self {
        self.tables.get_mut().campaigns.extend(campaigns);
        self
    }

    pub fn with_packages(mut self, packages: Vec<health_package::Model>) -> Self {
        self.tables.get_mut().packages.extend(packages);
        self
    }

    pub fn with_donations(mut self, donations: Vec<donation::Model>) -> Self {
        self.tables.get_mut().donations.extend(donations);
        self
    }

    /// Makes every subsequent read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent write fail, as if the database were down.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of write operations attempted so far, failed ones included.
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub async fn donations(&self) -> Vec<donation::Model> {
        self.tables.lock().await.donations.clone()
    }

    /// Overwrites a campaign row in place. Used to simulate drift.
    pub async fn put_campaign(&self, model: campaign::Model) {
        let mut tables = self.tables.lock().await;
        match tables.campaigns.iter_mut().find(|c| c.id == model.id) {
            Some(existing) => *existing = model,
            None => tables.campaigns.push(model),
        }
    }

    fn begin_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused: store is not accepting reads".to_string()));
        }
        Ok(())
    }

    fn begin_write(&self) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused: store is not accepting writes".to_string()));
        }
        Ok(())
    }
}

fn page_of<T: Clone>(rows: Vec<T>, page: Page) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl FundingStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list_campaigns(&self, filter: &CampaignFilter) -> Result<Vec<campaign::Model>, StoreError> {
        let tables = self.tables.lock().await;
        self.begin_read()?;
        let mut rows: Vec<campaign::Model> = tables
            .campaigns
            .iter()
            .filter(|c| c.approved)
            .filter(|c| filter.status.as_deref().map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(rows, filter.page))
    }

    async fn find_campaign(&self, id: &str) -> Result<Option<campaign::Model>, StoreError> {
        let tables = self.tables.lock().await;
        self.begin_read()?;
        Ok(tables.campaigns.iter().find(|c| c.id == id).cloned())
    }

    async fn list_packages(&self, filter: &PackageFilter) -> Result<Vec<health_package::Model>, StoreError> {
        let tables = self.tables.lock().await;
        self.begin_read()?;
        let mut rows: Vec<health_package::Model> = tables
            .packages
            .iter()
            .filter(|p| p.active == filter.active)
            .filter(|p| filter.category.as_deref().map_or(true, |c| p.category == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.price.cmp(&b.price));
        Ok(rows)
    }

    async fn list_donations(&self, campaign_id: &str, page: Page) -> Result<Vec<donation::Model>, StoreError> {
        let tables = self.tables.lock().await;
        self.begin_read()?;
        let mut rows: Vec<donation::Model> = tables
            .donations
            .iter()
            .filter(|d| d.campaign_id == campaign_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(rows, page))
    }

    async fn record_donation(&self, donation: NewDonation) -> Result<donation::Model, StoreError> {
        let mut tables = self.tables.lock().await;
        self.begin_write()?;

        let Some(campaign) = tables.campaigns.iter_mut().find(|c| c.id == donation.campaign_id) else {
            return Err(StoreError::MissingCampaign(donation.campaign_id));
        };

        // Same outcome as a NUMERIC(14, 2) overflow in Postgres: nothing is written.
        let raised = campaign
            .raised()
            .checked_add(donation.amount)
            .filter(|total| *total <= max_amount());
        let donors = campaign.donors().checked_add(1);
        let (Some(raised), Some(donors)) = (raised, donors) else {
            return Err(StoreError::Overflow(donation.campaign_id));
        };
        campaign.raised_amount = Some(raised);
        campaign.current_amount = Some(raised);
        campaign.donor_count = Some(donors);

        let model = donation.into_model();
        tables.donations.push(model.clone());
        Ok(model)
    }

    async fn ledger_totals(&self) -> Result<Vec<LedgerTotals>, StoreError> {
        let tables = self.tables.lock().await;
        self.begin_read()?;
        let mut totals: BTreeMap<&str, (Decimal, i64)> = BTreeMap::new();
        for d in tables.donations.iter().filter(|d| d.status == donation::STATUS_COMPLETED) {
            let entry = totals.entry(d.campaign_id.as_str()).or_insert((Decimal::ZERO, 0));
            entry.0 = entry
                .0
                .checked_add(d.amount)
                .ok_or_else(|| StoreError::Overflow(d.campaign_id.clone()))?;
            entry.1 += 1;
        }

        Ok(totals
            .into_iter()
            .map(|(campaign_id, (total, donations))| LedgerTotals {
                campaign_id: campaign_id.to_string(),
                total: Some(total),
                donations,
            })
            .collect())
    }

    async fn lift_campaign_totals(&self, ledger: &LedgerTotals) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        self.begin_write()?;

        let Some(campaign) = tables.campaigns.iter_mut().find(|c| c.id == ledger.campaign_id) else {
            return Ok(false);
        };

        let mut changed = false;
        if let Some(total) = ledger.total {
            if campaign.raised() < total {
                campaign.raised_amount = Some(total);
                campaign.current_amount = Some(total);
                changed = true;
            }
        }
        let donors = i32::try_from(ledger.donations).unwrap_or(i32::MAX);
        if campaign.donors() < donors {
            campaign.donor_count = Some(donors);
            changed = true;
        }
        Ok(changed)
    }

    async fn sync_current_amounts(&self) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        self.begin_write()?;

        let mut synced = 0;
        for campaign in tables.campaigns.iter_mut() {
            if campaign.raised_amount.is_some() && campaign.current_amount != campaign.raised_amount {
                campaign.current_amount = campaign.raised_amount;
                synced += 1;
            }
        }
        Ok(synced)
    }
}
