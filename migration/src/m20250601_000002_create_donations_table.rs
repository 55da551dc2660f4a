use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_campaigns_table::Campaigns;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Donations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Donations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Donations::CampaignId).text().not_null())
                    .col(ColumnDef::new(Donations::DonorId).string())
                    .col(ColumnDef::new(Donations::DonorEmail).string().not_null())
                    .col(ColumnDef::new(Donations::DonorName).string().not_null())
                    .col(ColumnDef::new(Donations::Amount).decimal_len(14, 2).not_null())
                    .col(ColumnDef::new(Donations::Currency).string().not_null())
                    .col(ColumnDef::new(Donations::Method).string().not_null())
                    .col(ColumnDef::new(Donations::TxId).string())
                    .col(
                        ColumnDef::new(Donations::TxVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Donations::Status).string().not_null())
                    .col(ColumnDef::new(Donations::Message).text())
                    .col(ColumnDef::new(Donations::DonorWallet).string().not_null())
                    .col(
                        ColumnDef::new(Donations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donations_campaign_id")
                            .from(Donations::Table, Donations::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_donations_campaign_id")
                    .table(Donations::Table)
                    .col(Donations::CampaignId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Donations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Donations {
    Table,
    Id,
    CampaignId,
    DonorId,
    DonorEmail,
    DonorName,
    Amount,
    Currency,
    Method,
    TxId,
    TxVerified,
    Status,
    Message,
    DonorWallet,
    CreatedAt,
}
