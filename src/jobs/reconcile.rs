//! Repairs campaign totals that fell behind the donation ledger.
//!
//! A campaign whose `raised_amount` or `donor_count` is below the sum/count
//! of its completed donations lost an aggregate update somewhere (an insert
//! that committed without its increment, or two increments racing). Such
//! rows are lifted to the ledger values. Values above the ledger are left
//! alone: campaigns can carry totals from before donations were recorded.

use serde::Serialize;

use crate::store::{FundingStore, StoreError};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub campaigns_checked: usize,
    pub campaigns_lifted: usize,
    pub mirrors_synced: u64,
}

/// One reconciliation pass. Safe to run while fundings are in flight.
#[tracing::instrument(skip(store), fields(backend = store.backend_tag()))]
pub async fn run_reconciliation(store: &dyn FundingStore) -> Result<ReconcileReport, StoreError> {
    let mut report = ReconcileReport::default();

    for ledger in store.ledger_totals().await? {
        report.campaigns_checked += 1;
        if store.lift_campaign_totals(&ledger).await? {
            tracing::warn!(
                campaign_id = %ledger.campaign_id,
                ledger_total = ?ledger.total,
                ledger_donations = ledger.donations,
                "campaign totals were behind the donation ledger"
            );
            report.campaigns_lifted += 1;
        }
    }

    report.mirrors_synced = store.sync_current_amounts().await?;

    tracing::info!(
        checked = report.campaigns_checked,
        lifted = report.campaigns_lifted,
        synced = report.mirrors_synced,
        "reconciliation finished"
    );
    Ok(report)
}
