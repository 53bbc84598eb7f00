use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Promo code entity. Redemptions live in `promo_redemptions`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub owner_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub discount_percent: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub min_qualifying_amount: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub is_expired: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Expired either explicitly or because the expiry date is in the past.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.is_expired || self.expiry_date.map_or(false, |date| date < today)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::promo_redemption::Entity")]
    Redemptions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::promo_redemption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Redemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
