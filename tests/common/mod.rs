// Shared test harness; not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::Mutex;
use uuid::Uuid;

use rentflow_engine::config::EngineConfig;
use rentflow_engine::db;
use rentflow_engine::entities::{discount, order, order_item, pricing_rules, rental_unit};
use rentflow_engine::errors::ServiceError;
use rentflow_engine::models::order::{
    LocationType, OrderStatus, PickupPreference, RentalMode, SurfaceType,
};
use rentflow_engine::models::pricing::PriceBreakdown;
use rentflow_engine::services::notifications::{CustomerContact, NotificationSender};
use rentflow_engine::Engine;

/// Notification sender that records every message so tests can assert on
/// what the engine tried to deliver.
pub struct RecordingNotificationSender {
    pub sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn notify(&self, _contact: &CustomerContact, message: &str) -> Result<(), ServiceError> {
        self.sent.lock().await.push(message.to_string());
        Ok(())
    }
}

/// Test harness wiring the engine against a fresh in-memory SQLite database
/// with the full schema applied.
pub struct TestEngine {
    pub engine: Engine,
    pub sent: Arc<Mutex<Vec<String>>>,
}

impl TestEngine {
    pub async fn new() -> Self {
        let pool = db::establish_in_memory()
            .await
            .expect("failed to create test database");
        let db = Arc::new(pool);

        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = Arc::new(RecordingNotificationSender { sent: sent.clone() });

        let mut config = EngineConfig::for_tests("sqlite::memory:");
        config.notifications_enabled = true;

        let engine = Engine::with_notifier(db, config, None, notifier);
        Self { engine, sent }
    }

    pub fn db(&self) -> &sea_orm::DatabaseConnection {
        &self.engine.db
    }

    pub async fn seed_unit(&self, name: &str, dry_price_cents: i64) -> rental_unit::Model {
        rental_unit::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            sku: Set(None),
            dry_price_cents: Set(dry_price_cents),
            water_price_cents: Set(Some(dry_price_cents + 5000)),
            requires_generator: Set(false),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(self.db())
        .await
        .expect("seed rental unit")
    }

    pub async fn seed_order(&self, seed: OrderSeed) -> order::Model {
        order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(seed.order_number),
            customer_name: Set("Dana Ortiz".to_string()),
            customer_email: Set("dana@example.com".to_string()),
            customer_phone: Set(Some("+18135550142".to_string())),
            status: Set(seed.status),
            location_type: Set(LocationType::Residential),
            surface: Set(SurfaceType::Grass),
            event_date: Set(seed.event_date),
            event_end_date: Set(seed.event_end_date),
            setup_window: Set(None),
            pickup_window: Set(None),
            pickup_preference: Set(PickupPreference::NextDay),
            address_id: Set(None),
            generator_qty: Set(0),
            subtotal_cents: Set(25000),
            travel_fee_cents: Set(4000),
            surface_fee_cents: Set(0),
            same_day_pickup_fee_cents: Set(0),
            generator_fee_cents: Set(0),
            tax_cents: Set(1740),
            total_cents: Set(30740),
            deposit_due_cents: Set(7685),
            deposit_paid_cents: Set(seed.amount_paid_cents),
            balance_due_cents: Set(23055),
            custom_deposit_cents: Set(None),
            tax_waived: Set(false),
            tax_waived_reason: Set(None),
            travel_fee_waived: Set(false),
            travel_fee_waived_reason: Set(None),
            surface_fee_waived: Set(false),
            surface_fee_waived_reason: Set(None),
            same_day_fee_waived: Set(false),
            same_day_fee_waived_reason: Set(None),
            generator_fee_waived: Set(false),
            generator_fee_waived_reason: Set(None),
            payment_method_ref: Set(seed.payment_method_ref),
            amount_paid_cents: Set(seed.amount_paid_cents),
            paid_in_full: Set(false),
            admin_message: Set(None),
            is_archived: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            version: Set(1),
        }
        .insert(self.db())
        .await
        .expect("seed order")
    }

    pub async fn add_item(
        &self,
        order: &order::Model,
        unit: &rental_unit::Model,
        quantity: i32,
    ) -> order_item::Model {
        order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            unit_id: Set(unit.id),
            unit_name: Set(unit.name.clone()),
            quantity: Set(quantity),
            mode: Set(RentalMode::Dry),
            unit_price_cents: Set(unit.dry_price_cents),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed order item")
    }

    pub async fn seed_discount_template(&self, name: &str, amount_cents: i64) -> discount::Model {
        discount::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(None),
            name: Set(name.to_string()),
            amount_cents: Set(Some(amount_cents)),
            percent_bps: Set(None),
            is_template: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(self.db())
        .await
        .expect("seed discount template")
    }

    pub async fn seed_pricing_rules(&self) -> pricing_rules::Model {
        pricing_rules::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("default".to_string()),
            base_radius_miles: Set(20.0),
            per_mile_after_base_cents: Set(500),
            surface_fee_cents: Set(3000),
            generator_price_cents: Set(7500),
            extra_day_pct_bps: Set(5000),
            residential_multiplier_bps: Set(10_000),
            commercial_multiplier_bps: Set(12_500),
            tax_rate_bps: Set(600),
            deposit_pct_bps: Set(2500),
            overnight_holiday_only: Set(false),
            included_cities: Set(serde_json::json!(["Riverview"])),
            zone_overrides: Set(serde_json::json!([
                { "city": "Brandon", "zip": null, "flat_fee_cents": 2500, "per_mile_cents": null }
            ])),
            same_day_fee_matrix: Set(serde_json::json!([
                { "location_type": "residential", "fee_cents": 2500 },
                { "location_type": "commercial", "fee_cents": 5000 }
            ])),
            holiday_periods: Set(serde_json::json!([])),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db())
        .await
        .expect("seed pricing rules")
    }
}

/// Seed parameters for an order row; money fields default to the combo-slide
/// quote (25000 subtotal, 4000 travel, 1740 tax, 30740 total).
pub struct OrderSeed {
    pub order_number: String,
    pub status: OrderStatus,
    pub event_date: NaiveDate,
    pub event_end_date: NaiveDate,
    pub payment_method_ref: Option<String>,
    pub amount_paid_cents: i64,
}

impl OrderSeed {
    pub fn confirmed(order_number: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            order_number: order_number.to_string(),
            status: OrderStatus::Confirmed,
            event_date: start,
            event_end_date: end,
            payment_method_ref: Some("pm_stored_123".to_string()),
            amount_paid_cents: 7685,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn without_payment(mut self) -> Self {
        self.payment_method_ref = None;
        self.amount_paid_cents = 0;
        self
    }
}

/// A breakdown that mirrors an order's persisted money fields, for saves
/// where the caller did not reprice anything.
pub fn breakdown_matching(order: &order::Model) -> PriceBreakdown {
    PriceBreakdown {
        subtotal_cents: order.subtotal_cents,
        travel_fee_cents: order.travel_fee_cents,
        surface_fee_cents: order.surface_fee_cents,
        same_day_pickup_fee_cents: order.same_day_pickup_fee_cents,
        generator_fee_cents: order.generator_fee_cents,
        tax_cents: order.tax_cents,
        total_cents: order.total_cents,
        deposit_due_cents: order.deposit_due_cents,
        balance_due_cents: order.balance_due_cents,
        distance_miles: 28.0,
        chargeable_miles: 8.0,
        per_mile_rate_cents: 500,
        flat_travel_override: false,
        effective_pickup: order.pickup_preference,
        rental_days: 1,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
