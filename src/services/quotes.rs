//! Quote assembly.
//!
//! Request handlers call [`QuoteService::quote`] whenever draft inputs
//! change: it resolves the distance input through the distance collaborator,
//! loads the active rule set and hands both to the pure calculator.

use std::sync::Arc;

use tracing::instrument;

use crate::errors::ServiceError;
use crate::models::pricing::{Cart, EventParams, FeeWaivers, PriceBreakdown, QuoteRequest};
use crate::services::geocoding::{Coordinates, DistanceProvider};
use crate::services::pricing::price;
use crate::services::pricing_rules::PricingRulesProvider;

#[derive(Clone)]
pub struct QuoteService {
    rules: Arc<PricingRulesProvider>,
    distance: Arc<dyn DistanceProvider>,
    warehouse: Coordinates,
}

impl QuoteService {
    pub fn new(
        rules: Arc<PricingRulesProvider>,
        distance: Arc<dyn DistanceProvider>,
        warehouse: Coordinates,
    ) -> Self {
        Self {
            rules,
            distance,
            warehouse,
        }
    }

    /// Prices a quote with the active rule set.
    ///
    /// When the destination has been geocoded, the distance input is
    /// resolved through the distance collaborator; otherwise the
    /// `distance_miles` already on `params` is used as-is. A distance
    /// lookup failure surfaces as an error here, since quoting has no
    /// result to fall back on, but it never blocks a later save: saves
    /// work from the last computed breakdown.
    #[instrument(skip_all)]
    pub async fn quote(
        &self,
        cart: Cart,
        mut params: EventParams,
        destination: Option<Coordinates>,
        waivers: FeeWaivers,
        custom_deposit_cents: Option<i64>,
    ) -> Result<PriceBreakdown, ServiceError> {
        if let Some(dest) = destination {
            params.distance_miles = self
                .distance
                .distance_miles(self.warehouse, dest)
                .await
                .map_err(|e| {
                    ServiceError::ExternalServiceError(format!("Distance lookup failed: {}", e))
                })?;
        }

        let rules = self.rules.current().await?;
        price(
            &QuoteRequest {
                cart,
                params,
                waivers,
                custom_deposit_cents,
            },
            &rules,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{LocationType, PickupPreference, RentalMode, SurfaceType};
    use crate::models::pricing::CartLine;
    use crate::services::geocoding::MockDistanceProvider;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn warehouse() -> Coordinates {
        Coordinates {
            latitude: 27.9506,
            longitude: -82.4572,
        }
    }

    fn one_day_params() -> EventParams {
        let day = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        EventParams {
            location_type: LocationType::Residential,
            surface: SurfaceType::Grass,
            event_date: day,
            event_end_date: day,
            pickup_preference: PickupPreference::NextDay,
            destination_city: None,
            destination_zip: None,
            distance_miles: 0.0,
        }
    }

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

    #[tokio::test]
    async fn resolved_distance_feeds_the_travel_fee() {
        let mut distance = MockDistanceProvider::new();
        distance
            .expect_distance_miles()
            .returning(|_, _| Ok(28.0));

        let service = QuoteService::new(
            Arc::new(crate::services::pricing_rules::PricingRulesProvider::with_static(
                crate::models::pricing::PricingRules::default(),
            )),
            Arc::new(distance),
            warehouse(),
        );

        let breakdown = service
            .quote(
                combo_cart(),
                one_day_params(),
                Some(Coordinates {
                    latitude: 27.7,
                    longitude: -82.3,
                }),
                FeeWaivers::default(),
                None,
            )
            .await
            .unwrap();

        // 28 miles against the default 20-mile radius at 500/mile.
        assert_eq!(breakdown.distance_miles, 28.0);
        assert_eq!(breakdown.travel_fee_cents, 4000);
    }

    #[tokio::test]
    async fn failed_distance_lookup_is_an_external_service_error() {
        let mut distance = MockDistanceProvider::new();
        distance.expect_distance_miles().returning(|_, _| {
            Err(ServiceError::ExternalServiceError(
                "routing backend timed out".to_string(),
            ))
        });

        let service = QuoteService::new(
            Arc::new(crate::services::pricing_rules::PricingRulesProvider::with_static(
                crate::models::pricing::PricingRules::default(),
            )),
            Arc::new(distance),
            warehouse(),
        );

        let err = service
            .quote(
                combo_cart(),
                one_day_params(),
                Some(Coordinates {
                    latitude: 27.7,
                    longitude: -82.3,
                }),
                FeeWaivers::default(),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ExternalServiceError(_)));
    }

    #[tokio::test]
    async fn ungeocoded_destination_uses_the_supplied_miles() {
        let distance = MockDistanceProvider::new(); // must never be called

        let service = QuoteService::new(
            Arc::new(crate::services::pricing_rules::PricingRulesProvider::with_static(
                crate::models::pricing::PricingRules::default(),
            )),
            Arc::new(distance),
            warehouse(),
        );

        let mut params = one_day_params();
        params.distance_miles = 12.0;
        let breakdown = service
            .quote(combo_cart(), params, None, FeeWaivers::default(), None)
            .await
            .unwrap();

        assert_eq!(breakdown.distance_miles, 12.0);
        assert_eq!(breakdown.travel_fee_cents, 0);
    }
}
