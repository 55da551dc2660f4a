use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Campaigns::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(Campaigns::Title).string().not_null())
                    .col(ColumnDef::new(Campaigns::Description).text())
                    .col(
                        ColumnDef::new(Campaigns::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Campaigns::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Campaigns::GoalAmount).decimal_len(14, 2))
                    // Nullable on purpose: rows imported from the old schema carry NULL totals.
                    .col(ColumnDef::new(Campaigns::RaisedAmount).decimal_len(14, 2).default(0))
                    .col(ColumnDef::new(Campaigns::CurrentAmount).decimal_len(14, 2).default(0))
                    .col(ColumnDef::new(Campaigns::DonorCount).integer().default(0))
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaigns_approved_created_at")
                    .table(Campaigns::Table)
                    .col(Campaigns::Approved)
                    .col(Campaigns::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Campaigns {
    Table,
    Id,
    Title,
    Description,
    Approved,
    Status,
    GoalAmount,
    RaisedAmount,
    CurrentAmount,
    DonorCount,
    CreatedAt,
}
