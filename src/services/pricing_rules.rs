//! Pricing rules provider.
//!
//! The rule set lives in the `pricing_rules` table; the provider loads the
//! active row, deserializes the JSON list columns into
//! [`PricingRules`](crate::models::pricing::PricingRules), and caches the
//! result until a caller refreshes or invalidates it. Refresh is always
//! caller-controlled; there is no implicit background revalidation.

use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::entities::pricing_rules::{self, Entity as PricingRulesEntity};
use crate::errors::ServiceError;
use crate::models::pricing::{HolidayPeriod, PricingRules, SameDayFeeBand, ZoneOverride};

#[derive(Clone)]
pub struct PricingRulesProvider {
    db: Arc<DatabaseConnection>,
    cache: Arc<RwLock<Option<Arc<PricingRules>>>>,
}

impl PricingRulesProvider {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Provider pre-seeded with a fixed rule set and no backing store.
    /// `current()` always serves the given rules; `refresh()` fails.
    pub fn with_static(rules: PricingRules) -> Self {
        Self {
            db: Arc::new(DatabaseConnection::Disconnected),
            cache: Arc::new(RwLock::new(Some(Arc::new(rules)))),
        }
    }

    /// Returns the active rule set, loading it on first use.
    #[instrument(skip(self))]
    pub async fn current(&self) -> Result<Arc<PricingRules>, ServiceError> {
        if let Some(rules) = self.cache.read().await.as_ref() {
            return Ok(rules.clone());
        }
        self.refresh().await
    }

    /// Reloads the active rule set from the database and replaces the cache.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<PricingRules>, ServiceError> {
        let model = PricingRulesEntity::find()
            .filter(pricing_rules::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("No active pricing rule set".to_string())
            })?;

        let rules = Arc::new(Self::from_model(model)?);
        *self.cache.write().await = Some(rules.clone());
        info!("Pricing rules refreshed");
        Ok(rules)
    }

    /// Drops the cached rule set; the next `current()` call reloads.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    fn from_model(model: pricing_rules::Model) -> Result<PricingRules, ServiceError> {
        let included_cities: Vec<String> = serde_json::from_value(model.included_cities)
            .map_err(|e| bad_column("included_cities", e))?;
        let zone_overrides: Vec<ZoneOverride> = serde_json::from_value(model.zone_overrides)
            .map_err(|e| bad_column("zone_overrides", e))?;
        let same_day_fee_matrix: Vec<SameDayFeeBand> =
            serde_json::from_value(model.same_day_fee_matrix)
                .map_err(|e| bad_column("same_day_fee_matrix", e))?;
        let holiday_periods: Vec<HolidayPeriod> = serde_json::from_value(model.holiday_periods)
            .map_err(|e| bad_column("holiday_periods", e))?;

        Ok(PricingRules {
            base_radius_miles: model.base_radius_miles,
            per_mile_after_base_cents: model.per_mile_after_base_cents,
            included_cities,
            zone_overrides,
            surface_fee_cents: model.surface_fee_cents,
            residential_multiplier_bps: model.residential_multiplier_bps as u32,
            commercial_multiplier_bps: model.commercial_multiplier_bps as u32,
            same_day_fee_matrix,
            overnight_holiday_only: model.overnight_holiday_only,
            holiday_periods,
            extra_day_pct_bps: model.extra_day_pct_bps as u32,
            generator_price_cents: model.generator_price_cents,
            tax_rate_bps: model.tax_rate_bps as u32,
            deposit_pct_bps: model.deposit_pct_bps as u32,
        })
    }
}

fn bad_column(column: &str, err: serde_json::Error) -> ServiceError {
    ServiceError::InternalError(format!(
        "Malformed pricing_rules JSON column '{}': {}",
        column, err
    ))
}
