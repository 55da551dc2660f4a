//! The campaign funding flow: validate, look up the campaign, record the
//! donation and apply it to the campaign totals.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::donation;
use crate::error::AppError;
use crate::store::{max_amount, FundingStore, NewDonation, AMOUNT_SCALE};

pub const ANONYMOUS_EMAIL: &str = "anonymous@medfi.net";
pub const ANONYMOUS_NAME: &str = "Anonymous";
pub const ANONYMOUS_WALLET: &str = "anonymous";
pub const DEFAULT_CURRENCY: &str = "ALGO";
pub const DEFAULT_METHOD: &str = "simulated";

/// Body of `POST /api/campaigns/{id}/fund`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FundRequest {
    /// Donation amount; greater than zero, at most two decimal places. Numbers and numeric strings are accepted
    #[schema(value_type = Option<f64>)]
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Currency symbol (default: ALGO)
    pub currency: Option<String>,
    /// Payment method (default: simulated)
    pub method: Option<String>,
    /// External transaction reference. Presence marks the donation as verified
    pub tx_id: Option<String>,
    pub donor_id: Option<String>,
    pub donor_email: Option<String>,
    pub donor_name: Option<String>,
    pub message: Option<String>,
}

/// Blank strings count as absent, same as a missing field.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FundRequest {
    /// Checks the amount and returns it. It has to be positive and fit a
    /// money column exactly, so nothing is rounded on the way to storage.
    pub fn validated_amount(&self) -> Result<Decimal, AppError> {
        let amount = match self.amount {
            Some(amount) if amount > Decimal::ZERO => amount.normalize(),
            _ => return Err(AppError::Validation("Valid amount is required".to_string())),
        };
        if amount.scale() > AMOUNT_SCALE {
            return Err(AppError::Validation(format!(
                "Amount must have at most {} decimal places",
                AMOUNT_SCALE
            )));
        }
        if amount > max_amount() {
            return Err(AppError::Validation(format!(
                "Amount must not exceed {}",
                max_amount()
            )));
        }
        Ok(amount)
    }

    /// Fills every optional field with its sentinel default.
    pub fn into_new_donation(self, campaign_id: &str, amount: Decimal) -> NewDonation {
        let tx_id = present(self.tx_id);
        let donor_email = present(self.donor_email);
        let donor_wallet = donor_email
            .clone()
            .unwrap_or_else(|| ANONYMOUS_WALLET.to_string());

        NewDonation {
            id: Uuid::new_v4(),
            campaign_id: campaign_id.to_string(),
            donor_id: present(self.donor_id),
            donor_email: donor_email.unwrap_or_else(|| ANONYMOUS_EMAIL.to_string()),
            donor_name: present(self.donor_name).unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
            amount,
            currency: present(self.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            method: present(self.method).unwrap_or_else(|| DEFAULT_METHOD.to_string()),
            tx_verified: tx_id.is_some(),
            tx_id,
            // No pending/failed path exists yet; every recorded donation is final.
            status: donation::STATUS_COMPLETED.to_string(),
            message: present(self.message),
            donor_wallet,
            created_at: Utc::now(),
        }
    }
}

/// Runs the funding flow against `store`. Steps run strictly in order and
/// stop at the first failure:
///
/// 1. amount must be > 0 (`Validation`)
/// 2. the campaign must exist; a failing lookup is reported the same way (`NotFound`)
/// 3. the donation insert and the aggregate increment commit together (`Persistence`)
#[tracing::instrument(skip(store, request), fields(backend = store.backend_tag()))]
pub async fn fund_campaign(
    store: &dyn FundingStore,
    campaign_id: &str,
    request: FundRequest,
) -> Result<donation::Model, AppError> {
    let amount = request.validated_amount()?;

    match store.find_campaign(campaign_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(AppError::NotFound("Campaign not found".to_string())),
        Err(e) => {
            tracing::warn!(error = %e, "campaign lookup failed");
            return Err(AppError::NotFound("Campaign not found".to_string()));
        }
    }

    let new_donation = request.into_new_donation(campaign_id, amount);
    let recorded = store.record_donation(new_donation).await?;

    tracing::info!(
        donation_id = %recorded.id,
        amount = %recorded.amount,
        tx_verified = recorded.tx_verified,
        "donation recorded"
    );
    Ok(recorded)
}
