use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The `pricing_rules` table. One row per rule set; `is_active` selects the
/// set the provider serves. List-shaped rules (included cities, zone
/// overrides, the same-day fee matrix, holiday periods) are JSON columns
/// deserialized into the `models::pricing` types.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pricing_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub base_radius_miles: f64,
    pub per_mile_after_base_cents: i64,
    pub surface_fee_cents: i64,
    pub generator_price_cents: i64,
    pub extra_day_pct_bps: i32,
    pub residential_multiplier_bps: i32,
    pub commercial_multiplier_bps: i32,
    pub tax_rate_bps: i32,
    pub deposit_pct_bps: i32,
    pub overnight_holiday_only: bool,
    #[sea_orm(column_type = "Json")]
    pub included_cities: Json,
    #[sea_orm(column_type = "Json")]
    pub zone_overrides: Json,
    #[sea_orm(column_type = "Json")]
    pub same_day_fee_matrix: Json,
    #[sea_orm(column_type = "Json")]
    pub holiday_periods: Json,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Some(now));
        }
        Ok(active_model)
    }
}
