use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "campaigns")]
#[schema(as = Campaign)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Only approved campaigns are publicly listed
    pub approved: bool,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub goal_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub raised_amount: Option<Decimal>,
    /// Mirror of `raised_amount`, written in the same statement
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub current_amount: Option<Decimal>,
    pub donor_count: Option<i32>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::donation::Entity")]
    Donation,
}

impl Related<super::donation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Raised total with NULL read as zero.
    pub fn raised(&self) -> Decimal {
        self.raised_amount.unwrap_or(Decimal::ZERO)
    }

    pub fn donors(&self) -> i32 {
        self.donor_count.unwrap_or(0)
    }
}
