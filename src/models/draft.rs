//! Edit-session staging types.
//!
//! An edit session works on an [`OrderDraft`]: a staged copy of the order
//! and its child rows. Nothing in a draft touches the database until the
//! reconciliation service commits it against the persisted baseline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::order::{LocationType, PickupPreference, RentalMode, SurfaceType};
use super::pricing::FeeWaivers;
use crate::entities;

/// One fee-waiver toggle. A waiver always carries its reason; the reason is
/// embedded in the changelog message when the flag flips.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaiverSetting {
    pub waived: bool,
    pub reason: Option<String>,
}

impl WaiverSetting {
    pub fn active(reason: impl Into<String>) -> Self {
        Self {
            waived: true,
            reason: Some(reason.into()),
        }
    }
}

/// The five per-fee waiver toggles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeWaiverSettings {
    pub tax: WaiverSetting,
    pub travel: WaiverSetting,
    pub surface: WaiverSetting,
    pub same_day: WaiverSetting,
    pub generator: WaiverSetting,
}

impl FeeWaiverSettings {
    /// Collapses the toggles into the flag set the calculator consumes.
    pub fn flags(&self) -> FeeWaivers {
        FeeWaivers {
            tax: self.tax.waived,
            travel: self.travel.waived,
            surface: self.surface.waived,
            same_day: self.same_day.waived,
            generator: self.generator.waived,
        }
    }

    fn missing_reason(&self) -> bool {
        [
            &self.tax,
            &self.travel,
            &self.surface,
            &self.same_day,
            &self.generator,
        ]
        .iter()
        .any(|w| w.waived && w.reason.as_deref().map_or(true, |r| r.trim().is_empty()))
    }
}

/// A staged order item. `id` is present for persisted rows; `is_new` /
/// `is_deleted` drive the item diff. A row that is both new and deleted is
/// discarded without a changelog entry.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct DraftItem {
    pub id: Option<Uuid>,
    pub unit_id: Uuid,
    pub unit_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub mode: RentalMode,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

impl DraftItem {
    /// Rows that only ever existed inside this edit session.
    pub fn is_discarded(&self) -> bool {
        self.is_new && self.is_deleted
    }
}

/// A staged discount. Exactly one of `amount_cents` / `percent_bps` must be
/// set and nonzero.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DraftDiscount {
    pub id: Option<Uuid>,
    pub name: String,
    pub amount_cents: Option<i64>,
    pub percent_bps: Option<u32>,
    /// Promote to the reusable template library on save. Template names are
    /// unique.
    #[serde(default)]
    pub save_as_template: bool,
}

impl DraftDiscount {
    pub fn validate_exclusive(&self) -> Result<(), ValidationError> {
        let amount = self.amount_cents.unwrap_or(0);
        let percent = self.percent_bps.unwrap_or(0);
        if (amount != 0) == (percent != 0) {
            let mut err = ValidationError::new("discount_amount_xor_percentage");
            err.message =
                Some("Discount must set exactly one of amount or percentage".into());
            return Err(err);
        }
        Ok(())
    }
}

/// A staged custom fee.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct DraftFee {
    pub id: Option<Uuid>,
    #[validate(length(min = 1, message = "Fee name is required"))]
    pub name: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub save_as_template: bool,
}

/// Staged delivery-address fields. Persisted immediately (inside the save
/// transaction, ahead of the rest of the diff) and logged as one composite
/// "address" change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl AddressDraft {
    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.street, self.city, self.state, self.postal_code
        )
    }
}

/// The staged copy of an order held by an edit session.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_draft"))]
pub struct OrderDraft {
    /// Version of the baseline this draft was loaded from; a save against a
    /// newer persisted version aborts with a concurrent-modification error.
    pub version: i32,

    pub location_type: LocationType,
    pub surface: SurfaceType,
    pub event_date: NaiveDate,
    pub event_end_date: NaiveDate,
    pub setup_window: Option<String>,
    pub pickup_window: Option<String>,
    pub pickup_preference: PickupPreference,
    pub generator_qty: i32,

    pub waivers: FeeWaiverSettings,
    pub custom_deposit_cents: Option<i64>,

    pub address: Option<AddressDraft>,
    /// Untracked: changes to this field alone persist without a changelog
    /// entry, status change or notification.
    pub admin_message: Option<String>,

    #[validate]
    pub items: Vec<DraftItem>,
    pub discounts: Vec<DraftDiscount>,
    #[validate]
    pub fees: Vec<DraftFee>,
}

fn validate_draft(draft: &OrderDraft) -> Result<(), ValidationError> {
    if draft.event_end_date < draft.event_date {
        let mut err = ValidationError::new("event_date_range");
        err.message = Some("Event end date must not precede the start date".into());
        return Err(err);
    }
    if draft.generator_qty < 0 {
        let mut err = ValidationError::new("generator_qty");
        err.message = Some("Generator quantity cannot be negative".into());
        return Err(err);
    }
    if draft.waivers.missing_reason() {
        let mut err = ValidationError::new("waiver_reason");
        err.message = Some("A waived fee requires a reason".into());
        return Err(err);
    }
    for discount in &draft.discounts {
        discount.validate_exclusive()?;
    }
    Ok(())
}

impl OrderDraft {
    /// Items that will exist after the save (new rows included, deletions
    /// and discards excluded). This is the set availability re-validates.
    pub fn effective_items(&self) -> impl Iterator<Item = &DraftItem> {
        self.items.iter().filter(|i| !i.is_deleted)
    }
}

/// The persisted aggregate a draft is diffed against, loaded with parallel
/// reads keyed by order id.
#[derive(Clone, Debug)]
pub struct OrderBaseline {
    pub order: entities::order::Model,
    pub items: Vec<entities::order_item::Model>,
    pub discounts: Vec<entities::discount::Model>,
    pub fees: Vec<entities::custom_fee::Model>,
    pub address: Option<entities::address::Model>,
}

impl OrderBaseline {
    /// Seeds a draft mirroring the persisted state; edit sessions start
    /// from this and mutate.
    pub fn to_draft(&self) -> OrderDraft {
        OrderDraft {
            version: self.order.version,
            location_type: self.order.location_type,
            surface: self.order.surface,
            event_date: self.order.event_date,
            event_end_date: self.order.event_end_date,
            setup_window: self.order.setup_window.clone(),
            pickup_window: self.order.pickup_window.clone(),
            pickup_preference: self.order.pickup_preference,
            generator_qty: self.order.generator_qty,
            waivers: FeeWaiverSettings {
                tax: WaiverSetting {
                    waived: self.order.tax_waived,
                    reason: self.order.tax_waived_reason.clone(),
                },
                travel: WaiverSetting {
                    waived: self.order.travel_fee_waived,
                    reason: self.order.travel_fee_waived_reason.clone(),
                },
                surface: WaiverSetting {
                    waived: self.order.surface_fee_waived,
                    reason: self.order.surface_fee_waived_reason.clone(),
                },
                same_day: WaiverSetting {
                    waived: self.order.same_day_fee_waived,
                    reason: self.order.same_day_fee_waived_reason.clone(),
                },
                generator: WaiverSetting {
                    waived: self.order.generator_fee_waived,
                    reason: self.order.generator_fee_waived_reason.clone(),
                },
            },
            custom_deposit_cents: self.order.custom_deposit_cents,
            address: self.address.as_ref().map(|a| AddressDraft {
                street: a.street.clone(),
                city: a.city.clone(),
                state: a.state.clone(),
                postal_code: a.postal_code.clone(),
                latitude: a.latitude,
                longitude: a.longitude,
            }),
            admin_message: self.order.admin_message.clone(),
            items: self
                .items
                .iter()
                .map(|i| DraftItem {
                    id: Some(i.id),
                    unit_id: i.unit_id,
                    unit_name: i.unit_name.clone(),
                    quantity: i.quantity,
                    mode: i.mode,
                    unit_price_cents: i.unit_price_cents,
                    is_new: false,
                    is_deleted: false,
                })
                .collect(),
            discounts: self
                .discounts
                .iter()
                .map(|d| DraftDiscount {
                    id: Some(d.id),
                    name: d.name.clone(),
                    amount_cents: d.amount_cents,
                    percent_bps: d.percent_bps.map(|p| p as u32),
                    save_as_template: false,
                })
                .collect(),
            fees: self
                .fees
                .iter()
                .map(|f| DraftFee {
                    id: Some(f.id),
                    name: f.name.clone(),
                    amount_cents: f.amount_cents,
                    save_as_template: false,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_draft() -> OrderDraft {
        OrderDraft {
            version: 1,
            location_type: LocationType::Residential,
            surface: SurfaceType::Grass,
            event_date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            event_end_date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            setup_window: None,
            pickup_window: None,
            pickup_preference: PickupPreference::NextDay,
            generator_qty: 0,
            waivers: FeeWaiverSettings::default(),
            custom_deposit_cents: None,
            address: None,
            admin_message: None,
            items: Vec::new(),
            discounts: Vec::new(),
            fees: Vec::new(),
        }
    }

    #[test]
    fn rejects_inverted_date_range() {
        let mut draft = base_draft();
        draft.event_end_date = NaiveDate::from_ymd_opt(2025, 6, 13).unwrap();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn rejects_waiver_without_reason() {
        let mut draft = base_draft();
        draft.waivers.travel.waived = true;
        assert!(draft.validate().is_err());

        draft.waivers.travel = WaiverSetting::active("repeat customer");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn rejects_discount_with_both_amount_and_percentage() {
        let mut draft = base_draft();
        draft.discounts.push(DraftDiscount {
            id: None,
            name: "Spring promo".to_string(),
            amount_cents: Some(1000),
            percent_bps: Some(500),
            save_as_template: false,
        });
        assert!(draft.validate().is_err());
    }

    #[test]
    fn rejects_discount_with_neither_amount_nor_percentage() {
        let discount = DraftDiscount {
            id: None,
            name: "Empty".to_string(),
            amount_cents: None,
            percent_bps: None,
            save_as_template: false,
        };
        assert!(discount.validate_exclusive().is_err());
    }

    #[test]
    fn new_and_deleted_item_is_discarded() {
        let item = DraftItem {
            id: None,
            unit_id: Uuid::new_v4(),
            unit_name: "Castle".to_string(),
            quantity: 1,
            mode: RentalMode::Dry,
            unit_price_cents: 15000,
            is_new: true,
            is_deleted: true,
        };
        assert!(item.is_discarded());
    }
}
