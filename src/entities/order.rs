use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::order::{LocationType, OrderStatus, PickupPreference, SurfaceType};

/// The `orders` table. All monetary columns are integer cents.
///
/// `total_cents` is always recomputed from the pricing breakdown; nothing
/// writes the money columns except the reconciliation service. `version` is
/// the optimistic-concurrency token bumped on every write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Order number must be between 1 and 50 characters"))]
    pub order_number: String,

    pub customer_name: String,
    #[validate(email(message = "Customer email must be valid"))]
    pub customer_email: String,
    pub customer_phone: Option<String>,

    pub status: OrderStatus,
    pub location_type: LocationType,
    pub surface: SurfaceType,

    pub event_date: NaiveDate,
    pub event_end_date: NaiveDate,
    pub setup_window: Option<String>,
    pub pickup_window: Option<String>,
    pub pickup_preference: PickupPreference,

    pub address_id: Option<Uuid>,
    pub generator_qty: i32,

    pub subtotal_cents: i64,
    pub travel_fee_cents: i64,
    pub surface_fee_cents: i64,
    pub same_day_pickup_fee_cents: i64,
    pub generator_fee_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub deposit_due_cents: i64,
    pub deposit_paid_cents: i64,
    pub balance_due_cents: i64,
    pub custom_deposit_cents: Option<i64>,

    pub tax_waived: bool,
    pub tax_waived_reason: Option<String>,
    pub travel_fee_waived: bool,
    pub travel_fee_waived_reason: Option<String>,
    pub surface_fee_waived: bool,
    pub surface_fee_waived_reason: Option<String>,
    pub same_day_fee_waived: bool,
    pub same_day_fee_waived_reason: Option<String>,
    pub generator_fee_waived: bool,
    pub generator_fee_waived_reason: Option<String>,

    /// Opaque reference to a stored payment method; cleared by the payment
    /// invalidation policy.
    pub payment_method_ref: Option<String>,
    pub amount_paid_cents: i64,
    pub paid_in_full: bool,

    pub admin_message: Option<String>,

    pub is_archived: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::discount::Entity")]
    Discounts,
    #[sea_orm(has_many = "super::custom_fee::Entity")]
    CustomFees,
    #[sea_orm(has_many = "super::changelog::Entity")]
    Changelog,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::AddressId",
        to = "super::address::Column::Id"
    )]
    Address,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::discount::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discounts.def()
    }
}

impl Related<super::custom_fee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomFees.def()
    }
}

impl Related<super::changelog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Changelog.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

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

impl Model {
    /// Amount still owed against the deposit; the confirm guard accepts a
    /// missing payment method only when this is zero.
    pub fn amount_due_cents(&self) -> i64 {
        (self.deposit_due_cents - self.amount_paid_cents).max(0)
    }
}
