use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// The only status the funding flow writes.
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "donations")]
#[schema(as = Donation)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub campaign_id: String,
    pub donor_id: Option<String>,
    pub donor_email: String,
    pub donor_name: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub tx_id: Option<String>,
    /// Set when a `tx_id` was supplied; the transaction itself is not checked
    pub tx_verified: bool,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub donor_wallet: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
