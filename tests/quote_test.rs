mod common;

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use rentflow_engine::models::order::{
    LocationType, PickupPreference, RentalMode, SurfaceType,
};
use rentflow_engine::models::pricing::{Cart, CartLine, EventParams, FeeWaivers};

use common::TestEngine;

fn combo_cart() -> Cart {
    Cart {
        lines: vec![CartLine {
            unit_id: Uuid::new_v4(),
            name: "Combo Slide".to_string(),
            quantity: 1,
            mode: RentalMode::Water,
            unit_price_cents: 25000,
        }],
        generator_qty: 0,
    }
}

fn params(distance_miles: f64) -> EventParams {
    let day = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
    EventParams {
        location_type: LocationType::Residential,
        surface: SurfaceType::Grass,
        event_date: day,
        event_end_date: day,
        pickup_preference: PickupPreference::NextDay,
        destination_city: None,
        destination_zip: None,
        distance_miles,
    }
}

#[tokio::test]
async fn quote_uses_the_persisted_rule_set() {
    let app = TestEngine::new().await;
    app.seed_pricing_rules().await;

    let breakdown = app
        .engine
        .quotes
        .quote(combo_cart(), params(28.0), None, FeeWaivers::default(), None)
        .await
        .unwrap();

    // 8 chargeable miles at 500/mile, 6% tax on 29000.
    assert_eq!(breakdown.subtotal_cents, 25000);
    assert_eq!(breakdown.travel_fee_cents, 4000);
    assert_eq!(breakdown.tax_cents, 1740);
    assert_eq!(breakdown.total_cents, 30740);
}

#[tokio::test]
async fn quote_applies_persisted_zone_overrides() {
    let app = TestEngine::new().await;
    app.seed_pricing_rules().await;

    let mut p = params(28.0);
    p.destination_city = Some("Brandon".to_string());

    let breakdown = app
        .engine
        .quotes
        .quote(combo_cart(), p, None, FeeWaivers::default(), None)
        .await
        .unwrap();

    assert_eq!(breakdown.travel_fee_cents, 2500);
    assert!(breakdown.flat_travel_override);
}

#[tokio::test]
async fn rules_are_cached_until_explicitly_refreshed() {
    let app = TestEngine::new().await;
    let seeded = app.seed_pricing_rules().await;

    let first = app.engine.rules.current().await.unwrap();
    assert_eq!(first.per_mile_after_base_cents, 500);

    // An out-of-band rule change is not picked up by the cache...
    let mut active: rentflow_engine::entities::pricing_rules::ActiveModel = seeded.into();
    active.per_mile_after_base_cents = Set(750);
    active.update(app.db()).await.unwrap();

    let cached = app.engine.rules.current().await.unwrap();
    assert_eq!(cached.per_mile_after_base_cents, 500);

    // ...until the caller invalidates or refreshes.
    app.engine.rules.invalidate().await;
    let reloaded = app.engine.rules.current().await.unwrap();
    assert_eq!(reloaded.per_mile_after_base_cents, 750);
}
