//! Pure pricing domain types.
//!
//! Everything here is plain data: the calculator in
//! `services::pricing` consumes these types and performs no I/O. All
//! monetary amounts are integer cents; rates and multipliers are basis
//! points (1 bps = 0.01%).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::order::{LocationType, PickupPreference, RentalMode, SurfaceType};

/// A travel-fee rule keyed by destination city and/or zip. A matching
/// override replaces the default distance-based fee entirely, either with a
/// flat fee or its own per-mile rate. Zip matches take precedence over city
/// matches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneOverride {
    pub city: Option<String>,
    pub zip: Option<String>,
    pub flat_fee_cents: Option<i64>,
    pub per_mile_cents: Option<i64>,
}

impl ZoneOverride {
    pub fn matches_zip(&self, zip: Option<&str>) -> bool {
        match (&self.zip, zip) {
            (Some(rule), Some(dest)) => rule == dest,
            _ => false,
        }
    }

    pub fn matches_city(&self, city: Option<&str>) -> bool {
        match (&self.city, city) {
            (Some(rule), Some(dest)) => rule.eq_ignore_ascii_case(dest),
            _ => false,
        }
    }
}

/// Same-day pickup fee by location type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SameDayFeeBand {
    pub location_type: LocationType,
    pub fee_cents: i64,
}

/// An inclusive date range during which overnight (next-day) rentals are
/// offered even when `overnight_holiday_only` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HolidayPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HolidayPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The active pricing rule set. Loaded from the `pricing_rules` table by
/// `PricingRulesProvider`; the scalar columns map one-to-one and the list
/// fields round-trip through JSON columns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricingRules {
    /// Radius around the warehouse with no travel fee, in statute miles.
    pub base_radius_miles: f64,
    /// Per-mile rate charged beyond the base radius.
    pub per_mile_after_base_cents: i64,
    /// Cities delivered free of travel fee regardless of distance.
    pub included_cities: Vec<String>,
    /// City/zip rules that replace the distance-based fee.
    pub zone_overrides: Vec<ZoneOverride>,
    /// Flat sandbag fee for hard-surface setups.
    pub surface_fee_cents: i64,
    /// Price multiplier for residential bookings, in basis points.
    pub residential_multiplier_bps: u32,
    /// Price multiplier for commercial bookings, in basis points.
    pub commercial_multiplier_bps: u32,
    /// Same-day pickup fee by location type.
    pub same_day_fee_matrix: Vec<SameDayFeeBand>,
    /// When set, next-day pickup is only offered during holiday periods.
    pub overnight_holiday_only: bool,
    /// Holiday windows referenced by `overnight_holiday_only`.
    pub holiday_periods: Vec<HolidayPeriod>,
    /// Rental-subtotal surcharge per day beyond the first, in basis points.
    pub extra_day_pct_bps: u32,
    /// Price per generator.
    pub generator_price_cents: i64,
    /// Sales tax rate in basis points.
    pub tax_rate_bps: u32,
    /// Deposit percentage of total, in basis points.
    pub deposit_pct_bps: u32,
}

impl PricingRules {
    pub fn same_day_fee_for(&self, location_type: LocationType) -> i64 {
        self.same_day_fee_matrix
            .iter()
            .find(|band| band.location_type == location_type)
            .map(|band| band.fee_cents)
            .unwrap_or(0)
    }

    pub fn multiplier_bps_for(&self, location_type: LocationType) -> u32 {
        match location_type {
            LocationType::Residential => self.residential_multiplier_bps,
            LocationType::Commercial => self.commercial_multiplier_bps,
        }
    }

    pub fn in_holiday_period(&self, date: NaiveDate) -> bool {
        self.holiday_periods.iter().any(|p| p.contains(date))
    }
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            base_radius_miles: 20.0,
            per_mile_after_base_cents: 500,
            included_cities: Vec::new(),
            zone_overrides: Vec::new(),
            surface_fee_cents: 3000,
            residential_multiplier_bps: 10_000,
            commercial_multiplier_bps: 12_500,
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
            overnight_holiday_only: false,
            holiday_periods: Vec::new(),
            extra_day_pct_bps: 5000,
            generator_price_cents: 7500,
            tax_rate_bps: 600,
            deposit_pct_bps: 2500,
        }
    }
}

/// A line in the cart being priced. `unit_price_cents` is the snapshot
/// taken when the item was added, never re-derived from the catalog.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CartLine {
    pub unit_id: Uuid,
    pub name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub mode: RentalMode,
    pub unit_price_cents: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub generator_qty: i32,
}

/// Event parameters that drive fees: where, on what, and for how long.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventParams {
    pub location_type: LocationType,
    pub surface: SurfaceType,
    pub event_date: NaiveDate,
    pub event_end_date: NaiveDate,
    pub pickup_preference: PickupPreference,
    pub destination_city: Option<String>,
    pub destination_zip: Option<String>,
    /// One-way distance from the warehouse, as reported by the distance
    /// provider.
    pub distance_miles: f64,
}

/// Admin-set flags suppressing collection of individual fee lines. A waived
/// line is excluded from the total and the tax base.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeWaivers {
    pub tax: bool,
    pub travel: bool,
    pub surface: bool,
    pub same_day: bool,
    pub generator: bool,
}

/// Everything the calculator needs to price one order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub cart: Cart,
    pub params: EventParams,
    pub waivers: FeeWaivers,
    /// Admin override for the deposit; when absent the configured
    /// percentage of the total applies.
    pub custom_deposit_cents: Option<i64>,
}

/// Itemized price breakdown. The total is the sum of the already-rounded
/// lines; callers persist these fields wholesale and never hand-edit them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal_cents: i64,
    pub travel_fee_cents: i64,
    pub surface_fee_cents: i64,
    pub same_day_pickup_fee_cents: i64,
    pub generator_fee_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub deposit_due_cents: i64,
    pub balance_due_cents: i64,
    /// Display/audit inputs behind the travel fee.
    pub distance_miles: f64,
    pub chargeable_miles: f64,
    pub per_mile_rate_cents: i64,
    /// A zone override produced the travel fee; recomputes must reapply the
    /// override rather than per-mile math.
    pub flat_travel_override: bool,
    /// The pickup actually scheduled after forcing rules were applied.
    pub effective_pickup: PickupPreference,
    pub rental_days: i64,
}

/// Renders cents as a dollar string for changelog entries and messages.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}
