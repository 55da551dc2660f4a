use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::{
    CampaignFilter, FundingStore, LedgerTotals, NewDonation, PackageFilter, Page, StoreError,
};
use crate::entities::{campaign, donation, health_package};

/// `COALESCE(col, zero)`, so NULL totals read as zero inside SQL.
fn coalesce_zero(col: campaign::Column, zero: SimpleExpr) -> Expr {
    Expr::expr(Func::coalesce([SimpleExpr::from(Expr::col(col)), zero]))
}

pub struct PostgresStore {
    db: DatabaseConnection,
}

impl PostgresStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl FundingStore for PostgresStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    #[tracing::instrument(skip(self))]
    async fn list_campaigns(&self, filter: &CampaignFilter) -> Result<Vec<campaign::Model>, StoreError> {
        let mut query = campaign::Entity::find().filter(campaign::Column::Approved.eq(true));
        if let Some(status) = &filter.status {
            query = query.filter(campaign::Column::Status.eq(status.as_str()));
        }

        let rows = query
            .order_by_desc(campaign::Column::CreatedAt)
            .limit(filter.page.limit)
            .offset(filter.page.offset)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn find_campaign(&self, id: &str) -> Result<Option<campaign::Model>, StoreError> {
        Ok(campaign::Entity::find_by_id(id.to_string()).one(&self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn list_packages(&self, filter: &PackageFilter) -> Result<Vec<health_package::Model>, StoreError> {
        let mut query = health_package::Entity::find()
            .filter(health_package::Column::Active.eq(filter.active));
        if let Some(category) = &filter.category {
            query = query.filter(health_package::Column::Category.eq(category.as_str()));
        }

        let rows = query
            .order_by_asc(health_package::Column::Price)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn list_donations(&self, campaign_id: &str, page: Page) -> Result<Vec<donation::Model>, StoreError> {
        let rows = donation::Entity::find()
            .filter(donation::Column::CampaignId.eq(campaign_id))
            .order_by_desc(donation::Column::CreatedAt)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self, donation), fields(campaign_id = %donation.campaign_id, amount = %donation.amount))]
    async fn record_donation(&self, donation: NewDonation) -> Result<donation::Model, StoreError> {
        let campaign_id = donation.campaign_id.clone();
        let amount = donation.amount;

        // Dropping `txn` on any early return rolls both writes back.
        let txn = self.db.begin().await?;

        let inserted = donation::ActiveModel {
            id: Set(donation.id),
            campaign_id: Set(donation.campaign_id),
            donor_id: Set(donation.donor_id),
            donor_email: Set(donation.donor_email),
            donor_name: Set(donation.donor_name),
            amount: Set(donation.amount),
            currency: Set(donation.currency),
            method: Set(donation.method),
            tx_id: Set(donation.tx_id),
            tx_verified: Set(donation.tx_verified),
            status: Set(donation.status),
            message: Set(donation.message),
            donor_wallet: Set(donation.donor_wallet),
            created_at: Set(donation.created_at),
        }
        .insert(&txn)
        .await?;

        // Arithmetic update evaluated by Postgres under the row lock; no
        // read-modify-write from this process.
        let raised = coalesce_zero(campaign::Column::RaisedAmount, Expr::val(Decimal::ZERO).into())
            .add(Expr::val(amount));
        let donors = coalesce_zero(campaign::Column::DonorCount, Expr::val(0).into()).add(Expr::val(1));

        let result = campaign::Entity::update_many()
            .col_expr(campaign::Column::RaisedAmount, raised.clone())
            .col_expr(campaign::Column::CurrentAmount, raised)
            .col_expr(campaign::Column::DonorCount, donors)
            .filter(campaign::Column::Id.eq(campaign_id.as_str()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::MissingCampaign(campaign_id));
        }

        txn.commit().await?;
        tracing::debug!(donation_id = %inserted.id, "donation committed");
        Ok(inserted)
    }

    async fn ledger_totals(&self) -> Result<Vec<LedgerTotals>, StoreError> {
        let rows = donation::Entity::find()
            .select_only()
            .column(donation::Column::CampaignId)
            .column_as(Expr::col(donation::Column::Amount).sum(), "total")
            .column_as(Expr::col(donation::Column::Id).count(), "donations")
            .filter(donation::Column::Status.eq(donation::STATUS_COMPLETED))
            .group_by(donation::Column::CampaignId)
            .into_model::<LedgerTotals>()
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self, ledger), fields(campaign_id = %ledger.campaign_id))]
    async fn lift_campaign_totals(&self, ledger: &LedgerTotals) -> Result<bool, StoreError> {
        let mut changed = false;

        // Conditional updates: a funding that commits in between only ever
        // pushes the stored value further above the floor.
        if let Some(total) = ledger.total {
            let result = campaign::Entity::update_many()
                .col_expr(campaign::Column::RaisedAmount, Expr::val(total).into())
                .col_expr(campaign::Column::CurrentAmount, Expr::val(total).into())
                .filter(campaign::Column::Id.eq(ledger.campaign_id.as_str()))
                .filter(
                    coalesce_zero(campaign::Column::RaisedAmount, Expr::val(Decimal::ZERO).into())
                        .lt(Expr::val(total)),
                )
                .exec(&self.db)
                .await?;
            changed |= result.rows_affected > 0;
        }

        let donors = i32::try_from(ledger.donations).unwrap_or(i32::MAX);
        let result = campaign::Entity::update_many()
            .col_expr(campaign::Column::DonorCount, Expr::val(donors).into())
            .filter(campaign::Column::Id.eq(ledger.campaign_id.as_str()))
            .filter(coalesce_zero(campaign::Column::DonorCount, Expr::val(0).into()).lt(Expr::val(donors)))
            .exec(&self.db)
            .await?;
        changed |= result.rows_affected > 0;

        Ok(changed)
    }

    async fn sync_current_amounts(&self) -> Result<u64, StoreError> {
        let result = campaign::Entity::update_many()
            .col_expr(
                campaign::Column::CurrentAmount,
                Expr::col(campaign::Column::RaisedAmount).into(),
            )
            .filter(
                Condition::any()
                    .add(
                        Expr::col(campaign::Column::CurrentAmount)
                            .ne(Expr::col(campaign::Column::RaisedAmount)),
                    )
                    .add(
                        Condition::all()
                            .add(campaign::Column::CurrentAmount.is_null())
                            .add(campaign::Column::RaisedAmount.is_not_null()),
                    ),
            )
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
