use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HealthPackages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HealthPackages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(HealthPackages::Name).string().not_null())
                    .col(ColumnDef::new(HealthPackages::Description).text())
                    .col(ColumnDef::new(HealthPackages::Category).string().not_null())
                    .col(ColumnDef::new(HealthPackages::Price).decimal_len(14, 2).not_null())
                    .col(
                        ColumnDef::new(HealthPackages::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(HealthPackages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HealthPackages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HealthPackages {
    Table,
    Id,
    Name,
    Description,
    Category,
    Price,
    Active,
    CreatedAt,
}
