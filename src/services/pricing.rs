//! Pricing calculator.
//!
//! `price` is a pure function from a quote request and a rule set to an
//! itemized breakdown. All math is integer cents with round-half-up applied
//! per fee line; the total is the sum of the already-rounded lines, so the
//! invariant `subtotal + travel + surface + same_day + generator + tax ==
//! total` holds exactly.
//!
//! Tax rule: the tax base is subtotal + travel + surface + generator. The
//! same-day pickup fee is never taxed. Waived fee lines are zeroed, which
//! excludes them from both the total and the tax base.

use validator::Validate;

use crate::errors::ServiceError;
use crate::models::order::{LocationType, PickupPreference, SurfaceType};
use crate::models::pricing::{PriceBreakdown, PricingRules, QuoteRequest, ZoneOverride};

/// Rounds `numerator / denominator` half-up. Inputs are non-negative.
fn round_half_up(numerator: i128, denominator: i128) -> i64 {
    ((2 * numerator + denominator) / (2 * denominator)) as i64
}

/// Applies a basis-point rate to an amount, rounding half-up.
fn apply_bps(amount_cents: i64, bps: u32) -> i64 {
    round_half_up(amount_cents as i128 * bps as i128, 10_000)
}

/// Rounds fractional miles times a per-mile rate to the nearest cent.
fn miles_fee(miles: f64, per_mile_cents: i64) -> i64 {
    (miles * per_mile_cents as f64).round() as i64
}

struct TravelFee {
    fee_cents: i64,
    chargeable_miles: f64,
    per_mile_rate_cents: i64,
    flat_override: bool,
}

/// Zip matches beat city matches; the first match in rule order wins within
/// each kind.
fn matching_override<'r>(
    rules: &'r PricingRules,
    city: Option<&str>,
    zip: Option<&str>,
) -> Option<&'r ZoneOverride> {
    rules
        .zone_overrides
        .iter()
        .find(|z| z.matches_zip(zip))
        .or_else(|| rules.zone_overrides.iter().find(|z| z.matches_city(city)))
}

fn travel_fee(request: &QuoteRequest, rules: &PricingRules) -> TravelFee {
    let params = &request.params;
    let distance = params.distance_miles;
    let chargeable = (distance - rules.base_radius_miles).max(0.0);

    if let Some(zone) = matching_override(
        rules,
        params.destination_city.as_deref(),
        params.destination_zip.as_deref(),
    ) {
        // A matching zone override replaces the base-radius rule entirely.
        if let Some(flat) = zone.flat_fee_cents {
            return TravelFee {
                fee_cents: flat,
                chargeable_miles: chargeable,
                per_mile_rate_cents: 0,
                flat_override: true,
            };
        }
        let rate = zone
            .per_mile_cents
            .unwrap_or(rules.per_mile_after_base_cents);
        return TravelFee {
            fee_cents: miles_fee(chargeable, rate),
            chargeable_miles: chargeable,
            per_mile_rate_cents: rate,
            flat_override: false,
        };
    }

    let in_included_city = params
        .destination_city
        .as_deref()
        .map(|city| {
            rules
                .included_cities
                .iter()
                .any(|c| c.eq_ignore_ascii_case(city))
        })
        .unwrap_or(false);

    if in_included_city || distance <= rules.base_radius_miles {
        return TravelFee {
            fee_cents: 0,
            chargeable_miles: 0.0,
            per_mile_rate_cents: rules.per_mile_after_base_cents,
            flat_override: false,
        };
    }

    TravelFee {
        fee_cents: miles_fee(chargeable, rules.per_mile_after_base_cents),
        chargeable_miles: chargeable,
        per_mile_rate_cents: rules.per_mile_after_base_cents,
        flat_override: false,
    }
}

/// Commercial bookings always pick up same-day; outside holiday periods the
/// overnight restriction does the same for everyone else.
fn effective_pickup(request: &QuoteRequest, rules: &PricingRules) -> PickupPreference {
    if request.params.location_type == LocationType::Commercial {
        return PickupPreference::SameDay;
    }
    if rules.overnight_holiday_only && !rules.in_holiday_period(request.params.event_end_date) {
        return PickupPreference::SameDay;
    }
    request.params.pickup_preference
}

/// Derives the itemized price breakdown for a quote. Pure and
/// deterministic: same inputs, same breakdown, no I/O.
pub fn price(request: &QuoteRequest, rules: &PricingRules) -> Result<PriceBreakdown, ServiceError> {
    let params = &request.params;

    if params.event_end_date < params.event_date {
        return Err(ServiceError::ValidationError(
            "Event end date must not precede the start date".to_string(),
        ));
    }
    if params.distance_miles < 0.0 {
        return Err(ServiceError::ValidationError(
            "Distance cannot be negative".to_string(),
        ));
    }
    if request.cart.generator_qty < 0 {
        return Err(ServiceError::ValidationError(
            "Generator quantity cannot be negative".to_string(),
        ));
    }
    for line in &request.cart.lines {
        line.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
    }

    let rental_days = (params.event_end_date - params.event_date).num_days() + 1;

    // Raw item subtotal, then location multiplier, then the multi-day
    // surcharge on the multiplied amount.
    let raw_subtotal: i64 = request
        .cart
        .lines
        .iter()
        .map(|line| line.unit_price_cents * line.quantity as i64)
        .sum();

    let mut subtotal = apply_bps(raw_subtotal, rules.multiplier_bps_for(params.location_type));
    if rental_days > 1 {
        let surcharge_bps = rules.extra_day_pct_bps as i128 * (rental_days as i128 - 1);
        subtotal += round_half_up(subtotal as i128 * surcharge_bps, 10_000);
    }

    let travel = travel_fee(request, rules);
    let travel_fee_cents = if request.waivers.travel {
        0
    } else {
        travel.fee_cents
    };

    let surface_fee_cents = if request.waivers.surface || params.surface == SurfaceType::Grass {
        0
    } else {
        rules.surface_fee_cents
    };

    let pickup = effective_pickup(request, rules);
    let same_day_pickup_fee_cents = if request.waivers.same_day || pickup == PickupPreference::NextDay
    {
        0
    } else {
        rules.same_day_fee_for(params.location_type)
    };

    let generator_fee_cents = if request.waivers.generator {
        0
    } else {
        request.cart.generator_qty as i64 * rules.generator_price_cents
    };

    // Same-day fee is excluded from the tax base.
    let tax_base = subtotal + travel_fee_cents + surface_fee_cents + generator_fee_cents;
    let tax_cents = if request.waivers.tax {
        0
    } else {
        apply_bps(tax_base, rules.tax_rate_bps)
    };

    let total_cents = subtotal
        + travel_fee_cents
        + surface_fee_cents
        + same_day_pickup_fee_cents
        + generator_fee_cents
        + tax_cents;

    let deposit_due_cents = match request.custom_deposit_cents {
        Some(custom) => custom,
        None => apply_bps(total_cents, rules.deposit_pct_bps),
    };
    let balance_due_cents = total_cents - deposit_due_cents;

    Ok(PriceBreakdown {
        subtotal_cents: subtotal,
        travel_fee_cents,
        surface_fee_cents,
        same_day_pickup_fee_cents,
        generator_fee_cents,
        tax_cents,
        total_cents,
        deposit_due_cents,
        balance_due_cents,
        distance_miles: params.distance_miles,
        chargeable_miles: travel.chargeable_miles,
        per_mile_rate_cents: travel.per_mile_rate_cents,
        flat_travel_override: travel.flat_override,
        effective_pickup: pickup,
        rental_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::models::order::RentalMode;
    use crate::models::pricing::{Cart, CartLine, EventParams, FeeWaivers, HolidayPeriod, SameDayFeeBand};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn combo_slide_line(price_cents: i64) -> CartLine {
        CartLine {
            unit_id: Uuid::new_v4(),
            name: "Combo Slide".to_string(),
            quantity: 1,
            mode: RentalMode::Water,
            unit_price_cents: price_cents,
        }
    }

    fn request(cart: Cart, params: EventParams) -> QuoteRequest {
        QuoteRequest {
            cart,
            params,
            waivers: FeeWaivers::default(),
            custom_deposit_cents: None,
        }
    }

    fn one_day_params(distance_miles: f64) -> EventParams {
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

    fn flat_rules() -> PricingRules {
        PricingRules {
            base_radius_miles: 20.0,
            per_mile_after_base_cents: 500,
            residential_multiplier_bps: 10_000,
            commercial_multiplier_bps: 10_000,
            tax_rate_bps: 600,
            deposit_pct_bps: 2500,
            ..PricingRules::default()
        }
    }

    #[test]
    fn combo_slide_scenario() {
        // 28 miles, 20-mile radius, $5/mile beyond: 8 * 500 = 4000 travel.
        // Tax = 6% of 29000 = 1740. Total 30740.
        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(25000)],
                    generator_qty: 0,
                },
                one_day_params(28.0),
            ),
            &flat_rules(),
        )
        .unwrap();

        assert_eq!(breakdown.subtotal_cents, 25000);
        assert_eq!(breakdown.travel_fee_cents, 4000);
        assert_eq!(breakdown.surface_fee_cents, 0);
        assert_eq!(breakdown.same_day_pickup_fee_cents, 0);
        assert_eq!(breakdown.generator_fee_cents, 0);
        assert_eq!(breakdown.tax_cents, 1740);
        assert_eq!(breakdown.total_cents, 30740);
        assert_eq!(breakdown.chargeable_miles, 8.0);
        assert_eq!(breakdown.per_mile_rate_cents, 500);
        assert!(!breakdown.flat_travel_override);
    }

    #[test]
    fn total_is_sum_of_lines() {
        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(25000)],
                    generator_qty: 2,
                },
                EventParams {
                    surface: SurfaceType::Cement,
                    pickup_preference: PickupPreference::SameDay,
                    ..one_day_params(35.5)
                },
            ),
            &flat_rules(),
        )
        .unwrap();

        assert_eq!(
            breakdown.total_cents,
            breakdown.subtotal_cents
                + breakdown.travel_fee_cents
                + breakdown.surface_fee_cents
                + breakdown.same_day_pickup_fee_cents
                + breakdown.generator_fee_cents
                + breakdown.tax_cents
        );
    }

    #[test]
    fn travel_free_within_radius_and_included_city() {
        let rules = PricingRules {
            included_cities: vec!["Riverview".to_string()],
            ..flat_rules()
        };

        let inside = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                one_day_params(12.0),
            ),
            &rules,
        )
        .unwrap();
        assert_eq!(inside.travel_fee_cents, 0);

        let far_but_included = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    destination_city: Some("riverview".to_string()),
                    ..one_day_params(45.0)
                },
            ),
            &rules,
        )
        .unwrap();
        assert_eq!(far_but_included.travel_fee_cents, 0);
    }

    #[test]
    fn zone_override_flat_fee_beats_per_mile_and_inclusion() {
        let rules = PricingRules {
            included_cities: vec!["Brandon".to_string()],
            zone_overrides: vec![ZoneOverride {
                city: Some("Brandon".to_string()),
                zip: None,
                flat_fee_cents: Some(2500),
                per_mile_cents: None,
            }],
            ..flat_rules()
        };

        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    destination_city: Some("Brandon".to_string()),
                    ..one_day_params(28.0)
                },
            ),
            &rules,
        )
        .unwrap();

        assert_eq!(breakdown.travel_fee_cents, 2500);
        assert!(breakdown.flat_travel_override);
    }

    #[test]
    fn zone_override_zip_match_beats_city_match() {
        let rules = PricingRules {
            zone_overrides: vec![
                ZoneOverride {
                    city: Some("Tampa".to_string()),
                    zip: None,
                    flat_fee_cents: Some(1000),
                    per_mile_cents: None,
                },
                ZoneOverride {
                    city: None,
                    zip: Some("33605".to_string()),
                    flat_fee_cents: Some(9000),
                    per_mile_cents: None,
                },
            ],
            ..flat_rules()
        };

        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    destination_city: Some("Tampa".to_string()),
                    destination_zip: Some("33605".to_string()),
                    ..one_day_params(10.0)
                },
            ),
            &rules,
        )
        .unwrap();

        assert_eq!(breakdown.travel_fee_cents, 9000);
    }

    #[test]
    fn zone_override_per_mile_rate_uses_chargeable_miles() {
        let rules = PricingRules {
            zone_overrides: vec![ZoneOverride {
                city: Some("Plant City".to_string()),
                zip: None,
                flat_fee_cents: None,
                per_mile_cents: Some(700),
            }],
            ..flat_rules()
        };

        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    destination_city: Some("Plant City".to_string()),
                    ..one_day_params(30.0)
                },
            ),
            &rules,
        )
        .unwrap();

        assert_eq!(breakdown.travel_fee_cents, 7000); // 10 chargeable * 700
        assert_eq!(breakdown.per_mile_rate_cents, 700);
        assert!(!breakdown.flat_travel_override);
    }

    #[test]
    fn commercial_forces_same_day_pickup() {
        let rules = PricingRules {
            same_day_fee_matrix: vec![
                SameDayFeeBand {
                    location_type: LocationType::Residential,
                    fee_cents: 2500,
                },
                SameDayFeeBand {
                    location_type: LocationType::Commercial,
                    fee_cents: 5000,
                },
            ],
            ..flat_rules()
        };

        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    location_type: LocationType::Commercial,
                    // Draft asked for next-day; commercial overrides it.
                    pickup_preference: PickupPreference::NextDay,
                    ..one_day_params(5.0)
                },
            ),
            &rules,
        )
        .unwrap();

        assert_eq!(breakdown.effective_pickup, PickupPreference::SameDay);
        assert_eq!(breakdown.same_day_pickup_fee_cents, 5000);
    }

    #[test]
    fn overnight_restricted_to_holidays() {
        let rules = PricingRules {
            overnight_holiday_only: true,
            holiday_periods: vec![HolidayPeriod {
                start: NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 7, 6).unwrap(),
            }],
            ..flat_rules()
        };

        let ordinary = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                one_day_params(5.0),
            ),
            &rules,
        )
        .unwrap();
        assert_eq!(ordinary.effective_pickup, PickupPreference::SameDay);

        let holiday_day = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        let holiday = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    event_date: holiday_day,
                    event_end_date: holiday_day,
                    ..one_day_params(5.0)
                },
            ),
            &rules,
        )
        .unwrap();
        assert_eq!(holiday.effective_pickup, PickupPreference::NextDay);
    }

    #[test]
    fn same_day_fee_excluded_from_tax_base() {
        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    pickup_preference: PickupPreference::SameDay,
                    ..one_day_params(5.0)
                },
            ),
            &flat_rules(),
        )
        .unwrap();

        assert_eq!(breakdown.same_day_pickup_fee_cents, 2500);
        // Tax on 10000 only, not 12500.
        assert_eq!(breakdown.tax_cents, 600);
    }

    #[test]
    fn surface_fee_only_on_cement() {
        let grass = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                one_day_params(5.0),
            ),
            &flat_rules(),
        )
        .unwrap();
        assert_eq!(grass.surface_fee_cents, 0);

        let cement = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    surface: SurfaceType::Cement,
                    ..one_day_params(5.0)
                },
            ),
            &flat_rules(),
        )
        .unwrap();
        assert_eq!(cement.surface_fee_cents, 3000);
    }

    #[test]
    fn multi_day_surcharge_applies_after_multiplier() {
        let rules = PricingRules {
            commercial_multiplier_bps: 12_000,
            extra_day_pct_bps: 2500,
            ..flat_rules()
        };

        let start = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                EventParams {
                    location_type: LocationType::Commercial,
                    event_date: start,
                    event_end_date: start + chrono::Duration::days(2),
                    ..one_day_params(5.0)
                },
            ),
            &rules,
        )
        .unwrap();

        // 10000 * 1.2 = 12000, then +25% per extra day * 2 days = +6000.
        assert_eq!(breakdown.rental_days, 3);
        assert_eq!(breakdown.subtotal_cents, 18000);
    }

    #[test]
    fn waived_fees_are_excluded_from_total_and_tax_base() {
        let req = QuoteRequest {
            cart: Cart {
                lines: vec![combo_slide_line(10000)],
                generator_qty: 1,
            },
            params: EventParams {
                surface: SurfaceType::Cement,
                ..one_day_params(30.0)
            },
            waivers: FeeWaivers {
                travel: true,
                surface: true,
                generator: true,
                ..FeeWaivers::default()
            },
            custom_deposit_cents: None,
        };
        let breakdown = price(&req, &flat_rules()).unwrap();

        assert_eq!(breakdown.travel_fee_cents, 0);
        assert_eq!(breakdown.surface_fee_cents, 0);
        assert_eq!(breakdown.generator_fee_cents, 0);
        // Tax base collapses to the subtotal.
        assert_eq!(breakdown.tax_cents, 600);
        assert_eq!(breakdown.total_cents, 10600);
    }

    #[test]
    fn tax_waiver_zeroes_tax() {
        let req = QuoteRequest {
            cart: Cart {
                lines: vec![combo_slide_line(10000)],
                generator_qty: 0,
            },
            params: one_day_params(5.0),
            waivers: FeeWaivers {
                tax: true,
                ..FeeWaivers::default()
            },
            custom_deposit_cents: None,
        };
        let breakdown = price(&req, &flat_rules()).unwrap();
        assert_eq!(breakdown.tax_cents, 0);
        assert_eq!(breakdown.total_cents, 10000);
    }

    #[test]
    fn custom_deposit_overrides_percentage() {
        let mut req = request(
            Cart {
                lines: vec![combo_slide_line(10000)],
                generator_qty: 0,
            },
            one_day_params(5.0),
        );
        req.custom_deposit_cents = Some(1234);

        let breakdown = price(&req, &flat_rules()).unwrap();
        assert_eq!(breakdown.deposit_due_cents, 1234);
        assert_eq!(
            breakdown.balance_due_cents,
            breakdown.total_cents - 1234
        );
    }

    #[test]
    fn deposit_defaults_to_configured_percentage() {
        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(10000)],
                    generator_qty: 0,
                },
                one_day_params(5.0),
            ),
            &flat_rules(),
        )
        .unwrap();
        // 25% of 10600, rounded half-up.
        assert_eq!(breakdown.deposit_due_cents, 2650);
        assert_eq!(breakdown.balance_due_cents, 7950);
    }

    #[test]
    fn rejects_inverted_dates_and_bad_quantities() {
        let mut bad_dates = request(
            Cart {
                lines: vec![combo_slide_line(10000)],
                generator_qty: 0,
            },
            one_day_params(5.0),
        );
        bad_dates.params.event_end_date = bad_dates.params.event_date - chrono::Duration::days(1);
        assert_matches!(
            price(&bad_dates, &flat_rules()),
            Err(ServiceError::ValidationError(_))
        );

        let mut bad_qty = request(
            Cart {
                lines: vec![combo_slide_line(10000)],
                generator_qty: 0,
            },
            one_day_params(5.0),
        );
        bad_qty.cart.lines[0].quantity = 0;
        assert_matches!(
            price(&bad_qty, &flat_rules()),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn per_line_rounding_keeps_totals_exact() {
        // 21.3 chargeable miles at 333/mile = 7092.9 -> 7093.
        let rules = PricingRules {
            per_mile_after_base_cents: 333,
            tax_rate_bps: 700,
            ..flat_rules()
        };
        let breakdown = price(
            &request(
                Cart {
                    lines: vec![combo_slide_line(9999)],
                    generator_qty: 0,
                },
                one_day_params(41.3),
            ),
            &rules,
        )
        .unwrap();

        assert_eq!(breakdown.travel_fee_cents, 7093);
        let expected_tax = apply_bps(9999 + 7093, 700);
        assert_eq!(breakdown.tax_cents, expected_tax);
        assert_eq!(
            breakdown.total_cents,
            9999 + 7093 + expected_tax
        );
    }

    #[test]
    fn round_half_up_behaviour() {
        assert_eq!(round_half_up(5, 10), 1); // 0.5 -> 1
        assert_eq!(round_half_up(4, 10), 0);
        assert_eq!(round_half_up(25, 10), 3); // 2.5 -> 3
        assert_eq!(apply_bps(825, 600), 50); // 49.5 -> 50
    }
}
