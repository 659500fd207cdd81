//! Edit reconciliation.
//!
//! `save_changes` diffs an edit-session draft against the persisted
//! baseline and commits the result: field updates, item/discount/fee
//! inserts and deletes, changelog rows, payment invalidation and the
//! approval status change run inside one database transaction. The order
//! row carries an optimistic version token, and availability is
//! re-validated inside the transaction before anything is written, so a
//! concurrent booking between the caller's check and the commit aborts the
//! save instead of double-booking a unit.
//!
//! Notifications and domain events are dispatched after the commit and are
//! best-effort: failures are logged and never surface as save failures.

use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{address, custom_fee, discount, order, order_item};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::draft::{DraftDiscount, DraftFee, DraftItem, OrderBaseline, OrderDraft, WaiverSetting};
use crate::models::order::OrderStatus;
use crate::models::pricing::{format_cents, PriceBreakdown};
use crate::services::availability::{AvailabilityResult, AvailabilityService};
use crate::services::changelog::{ChangelogService, NewChangelogEntry};
use crate::services::notifications::{CustomerContact, NotificationSender};
use crate::services::order_status::{validate_transition, TransitionContext};

/// The authenticated admin performing the save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Saves without an actor are rejected before any write.
    pub actor: Option<Actor>,
    /// Skip customer approval and set the order straight to confirmed.
    pub admin_override: bool,
}

/// What the save did, for the caller's response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub changelog_entries: usize,
    pub payment_invalidated: bool,
    pub approval_required: bool,
    pub notification_sent: bool,
}

#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DatabaseConnection>,
    availability: AvailabilityService,
    changelog: ChangelogService,
    event_sender: Option<Arc<EventSender>>,
    notifier: Arc<dyn NotificationSender>,
    notifications_enabled: bool,
}

impl ReconciliationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        availability: AvailabilityService,
        event_sender: Option<Arc<EventSender>>,
        notifier: Arc<dyn NotificationSender>,
        notifications_enabled: bool,
    ) -> Self {
        let changelog = ChangelogService::new(db.clone());
        Self {
            db,
            availability,
            changelog,
            event_sender,
            notifier,
            notifications_enabled,
        }
    }

    /// Loads the persisted aggregate an edit session diffs against. The
    /// child collections are independent lookups and load in parallel.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn load_baseline(&self, order_id: Uuid) -> Result<OrderBaseline, ServiceError> {
        let db = &*self.db;

        let order_model = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let (items, discounts, fees) = tokio::try_join!(
            order_item::Entity::find()
                .filter(order_item::Column::OrderId.eq(order_id))
                .all(db),
            discount::Entity::find()
                .filter(discount::Column::OrderId.eq(order_id))
                .all(db),
            custom_fee::Entity::find()
                .filter(custom_fee::Column::OrderId.eq(order_id))
                .all(db),
        )?;

        let address = match order_model.address_id {
            Some(address_id) => address::Entity::find_by_id(address_id).one(db).await?,
            None => None,
        };

        Ok(OrderBaseline {
            order: order_model,
            items,
            discounts,
            fees,
            address,
        })
    }

    /// Reconciles a draft against its baseline and persists the result.
    ///
    /// `availability` is the caller's last check for the draft's units and
    /// date range; any conflict in it aborts before a single write. The
    /// check is repeated inside the save transaction, so a conflicting
    /// booking that landed after the caller's check also aborts.
    #[instrument(skip(self, draft, pricing, availability, opts), fields(order_id = %order_id))]
    pub async fn save_changes(
        &self,
        order_id: Uuid,
        draft: &OrderDraft,
        pricing: &PriceBreakdown,
        availability: &[AvailabilityResult],
        opts: SaveOptions,
    ) -> Result<SaveOutcome, ServiceError> {
        draft
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        // Hard precondition: the caller's availability result must be clean.
        let conflicted: Vec<&str> = availability
            .iter()
            .filter(|r| !r.available)
            .map(|r| r.unit_name.as_str())
            .collect();
        if !conflicted.is_empty() {
            return Err(ServiceError::AvailabilityConflict(format!(
                "Cannot save: {} already booked for the requested dates",
                conflicted.join(", ")
            )));
        }

        let actor = opts.actor.as_ref().ok_or_else(|| {
            ServiceError::Unauthorized("Saving order changes requires an authenticated actor".into())
        })?;

        let baseline = self.load_baseline(order_id).await?;
        if baseline.order.status.is_terminal() {
            return Err(ServiceError::InvalidStatus(format!(
                "Order {} is {} and can no longer be edited",
                baseline.order.order_number, baseline.order.status
            )));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start save transaction");
            ServiceError::DatabaseError(e)
        })?;

        // Optimistic concurrency: the draft must have been loaded from the
        // version currently persisted.
        let current = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        if current.version != draft.version {
            return Err(ServiceError::ConcurrentModification(order_id));
        }

        // Re-validate availability inside the transaction for the units the
        // order will hold after this save.
        let unit_ids: HashSet<Uuid> = draft.effective_items().map(|i| i.unit_id).collect();
        let mut in_txn_conflicts = Vec::new();
        for unit_id in unit_ids {
            let result = self
                .availability
                .check_unit_on(&txn, unit_id, draft.event_date, draft.event_end_date, Some(order_id))
                .await?;
            if !result.available {
                in_txn_conflicts.push(result.unit_name);
            }
        }
        if !in_txn_conflicts.is_empty() {
            return Err(ServiceError::AvailabilityConflict(format!(
                "Cannot save: {} already booked for the requested dates",
                in_txn_conflicts.join(", ")
            )));
        }

        let mut entries: Vec<NewChangelogEntry> = Vec::new();

        // Address first: persisted ahead of the rest of the diff, logged as
        // one composite change.
        let new_address_id = self
            .apply_address_change(&txn, &baseline, draft, &mut entries)
            .await?;

        diff_scalar_fields(&baseline, draft, &mut entries);
        diff_pricing_fields(&baseline.order, pricing, &mut entries);
        diff_waivers(&baseline.order, draft, &mut entries);

        let (items_added, items_removed) = self
            .apply_item_diff(&txn, order_id, draft, &mut entries)
            .await?;
        self.apply_discount_diff(&txn, order_id, &baseline, &draft.discounts, &mut entries)
            .await?;
        self.apply_fee_diff(&txn, order_id, &baseline, &draft.fees, &mut entries)
            .await?;

        let items_changed = items_added > 0 || items_removed > 0;
        let payment_invalidated =
            payment_must_be_invalidated(&baseline.order, pricing, items_changed);

        let payment_method_after = if payment_invalidated {
            None
        } else {
            baseline.order.payment_method_ref.clone()
        };

        let tracked_changes = !entries.is_empty();
        let old_status = baseline.order.status;
        let mut approval_required = false;
        let new_status = if opts.admin_override {
            let ctx = TransitionContext {
                payment_method_on_file: payment_method_after.is_some(),
                amount_due_cents: (pricing.deposit_due_cents - baseline.order.amount_paid_cents)
                    .max(0),
            };
            let decision = validate_transition(old_status, OrderStatus::Confirmed, &ctx);
            if !decision.valid {
                return Err(ServiceError::InvalidStatus(
                    decision.reason.unwrap_or_else(|| "Transition rejected".into()),
                ));
            }
            OrderStatus::Confirmed
        } else if tracked_changes {
            approval_required = true;
            OrderStatus::AwaitingCustomerApproval
        } else {
            old_status
        };

        // Write the order row: draft fields, wholesale pricing overwrite,
        // payment state, status and the version bump.
        let mut active: order::ActiveModel = current.into();
        active.location_type = Set(draft.location_type);
        active.surface = Set(draft.surface);
        active.event_date = Set(draft.event_date);
        active.event_end_date = Set(draft.event_end_date);
        active.setup_window = Set(draft.setup_window.clone());
        active.pickup_window = Set(draft.pickup_window.clone());
        active.pickup_preference = Set(pricing.effective_pickup);
        active.generator_qty = Set(draft.generator_qty);
        if let Some(address_id) = new_address_id {
            active.address_id = Set(Some(address_id));
        }

        active.subtotal_cents = Set(pricing.subtotal_cents);
        active.travel_fee_cents = Set(pricing.travel_fee_cents);
        active.surface_fee_cents = Set(pricing.surface_fee_cents);
        active.same_day_pickup_fee_cents = Set(pricing.same_day_pickup_fee_cents);
        active.generator_fee_cents = Set(pricing.generator_fee_cents);
        active.tax_cents = Set(pricing.tax_cents);
        active.total_cents = Set(pricing.total_cents);
        active.deposit_due_cents = Set(pricing.deposit_due_cents);
        active.balance_due_cents = Set(pricing.balance_due_cents);
        active.custom_deposit_cents = Set(draft.custom_deposit_cents);

        active.tax_waived = Set(draft.waivers.tax.waived);
        active.tax_waived_reason = Set(draft.waivers.tax.reason.clone());
        active.travel_fee_waived = Set(draft.waivers.travel.waived);
        active.travel_fee_waived_reason = Set(draft.waivers.travel.reason.clone());
        active.surface_fee_waived = Set(draft.waivers.surface.waived);
        active.surface_fee_waived_reason = Set(draft.waivers.surface.reason.clone());
        active.same_day_fee_waived = Set(draft.waivers.same_day.waived);
        active.same_day_fee_waived_reason = Set(draft.waivers.same_day.reason.clone());
        active.generator_fee_waived = Set(draft.waivers.generator.waived);
        active.generator_fee_waived_reason = Set(draft.waivers.generator.reason.clone());

        if payment_invalidated {
            active.payment_method_ref = Set(None);
            active.paid_in_full = Set(false);
        }

        active.admin_message = Set(draft.admin_message.clone());
        active.status = Set(new_status);
        active.version = Set(draft.version + 1);
        active.updated_at = Set(Some(chrono::Utc::now()));

        active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order row");
            ServiceError::DatabaseError(e)
        })?;

        let entry_count = entries.len();
        self.changelog
            .append_all(&txn, order_id, &actor.display_name, entries)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit save transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            actor = %actor.display_name,
            changelog_entries = entry_count,
            payment_invalidated,
            old_status = %old_status,
            new_status = %new_status,
            "Order changes saved"
        );

        // Post-commit side effects are best-effort.
        self.emit_events(order_id, old_status, new_status, payment_invalidated, approval_required)
            .await;
        let notification_sent = if approval_required && self.notifications_enabled {
            self.notify_customer(&baseline, entry_count).await
        } else {
            false
        };

        Ok(SaveOutcome {
            order_id,
            status: new_status,
            changelog_entries: entry_count,
            payment_invalidated,
            approval_required,
            notification_sent,
        })
    }

    /// Persists an address edit and logs it as a single composite change.
    /// Returns the id of a newly created address row, if one was needed.
    async fn apply_address_change(
        &self,
        txn: &DatabaseTransaction,
        baseline: &OrderBaseline,
        draft: &OrderDraft,
        entries: &mut Vec<NewChangelogEntry>,
    ) -> Result<Option<Uuid>, ServiceError> {
        let Some(draft_address) = &draft.address else {
            return Ok(None);
        };

        match &baseline.address {
            Some(existing) => {
                let changed = existing.street != draft_address.street
                    || existing.city != draft_address.city
                    || existing.state != draft_address.state
                    || existing.postal_code != draft_address.postal_code;
                if !changed {
                    return Ok(None);
                }

                let old_summary = existing.summary();
                let mut active: address::ActiveModel = existing.clone().into();
                active.street = Set(draft_address.street.clone());
                active.city = Set(draft_address.city.clone());
                active.state = Set(draft_address.state.clone());
                active.postal_code = Set(draft_address.postal_code.clone());
                active.latitude = Set(draft_address.latitude);
                active.longitude = Set(draft_address.longitude);
                active.updated_at = Set(Some(chrono::Utc::now()));
                active.update(txn).await?;

                entries.push(NewChangelogEntry::edit(
                    "address",
                    old_summary,
                    draft_address.summary(),
                ));
                Ok(None)
            }
            None => {
                let new_id = Uuid::new_v4();
                let active = address::ActiveModel {
                    id: Set(new_id),
                    street: Set(draft_address.street.clone()),
                    city: Set(draft_address.city.clone()),
                    state: Set(draft_address.state.clone()),
                    postal_code: Set(draft_address.postal_code.clone()),
                    latitude: Set(draft_address.latitude),
                    longitude: Set(draft_address.longitude),
                    ..Default::default()
                };
                active.insert(txn).await?;

                entries.push(NewChangelogEntry::add("address", draft_address.summary()));
                Ok(Some(new_id))
            }
        }
    }

    /// Inserts new items, deletes removed ones, and logs each. Items both
    /// new and deleted never existed outside the session and are dropped
    /// without a log row.
    async fn apply_item_diff(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
        draft: &OrderDraft,
        entries: &mut Vec<NewChangelogEntry>,
    ) -> Result<(usize, usize), ServiceError> {
        let mut added = 0;
        let mut removed = 0;

        for item in &draft.items {
            if item.is_discarded() {
                continue;
            }
            if item.is_new {
                let active = order_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order_id),
                    unit_id: Set(item.unit_id),
                    unit_name: Set(item.unit_name.clone()),
                    quantity: Set(item.quantity),
                    mode: Set(item.mode),
                    unit_price_cents: Set(item.unit_price_cents),
                    ..Default::default()
                };
                active.insert(txn).await?;
                entries.push(NewChangelogEntry::add("item", item_summary(item)));
                added += 1;
            } else if item.is_deleted {
                if let Some(item_id) = item.id {
                    if let Some(model) = order_item::Entity::find_by_id(item_id).one(txn).await? {
                        model.delete(txn).await?;
                        entries.push(NewChangelogEntry::remove("item", item_summary(item)));
                        removed += 1;
                    }
                }
            }
        }

        Ok((added, removed))
    }

    async fn apply_discount_diff(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
        baseline: &OrderBaseline,
        drafts: &[DraftDiscount],
        entries: &mut Vec<NewChangelogEntry>,
    ) -> Result<(), ServiceError> {
        let kept_ids: HashSet<Uuid> = drafts.iter().filter_map(|d| d.id).collect();

        for stale in baseline.discounts.iter().filter(|d| !kept_ids.contains(&d.id)) {
            stale.clone().delete(txn).await?;
            entries.push(NewChangelogEntry::remove(
                "discount",
                discount_model_summary(stale),
            ));
        }

        for new in drafts.iter().filter(|d| d.id.is_none()) {
            if new.save_as_template {
                self.ensure_unique_discount_template(txn, &new.name).await?;
            }
            let active = discount::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(Some(order_id)),
                name: Set(new.name.clone()),
                amount_cents: Set(new.amount_cents),
                percent_bps: Set(new.percent_bps.map(|p| p as i32)),
                is_template: Set(new.save_as_template),
                ..Default::default()
            };
            active.insert(txn).await?;
            entries.push(NewChangelogEntry::add("discount", discount_summary(new)));
        }

        Ok(())
    }

    async fn apply_fee_diff(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
        baseline: &OrderBaseline,
        drafts: &[DraftFee],
        entries: &mut Vec<NewChangelogEntry>,
    ) -> Result<(), ServiceError> {
        let kept_ids: HashSet<Uuid> = drafts.iter().filter_map(|f| f.id).collect();

        for stale in baseline.fees.iter().filter(|f| !kept_ids.contains(&f.id)) {
            stale.clone().delete(txn).await?;
            entries.push(NewChangelogEntry::remove(
                "custom_fee",
                format!("{} ({})", stale.name, format_cents(stale.amount_cents)),
            ));
        }

        for new in drafts.iter().filter(|f| f.id.is_none()) {
            if new.save_as_template {
                self.ensure_unique_fee_template(txn, &new.name).await?;
            }
            let active = custom_fee::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(Some(order_id)),
                name: Set(new.name.clone()),
                amount_cents: Set(new.amount_cents),
                is_template: Set(new.save_as_template),
                ..Default::default()
            };
            active.insert(txn).await?;
            entries.push(NewChangelogEntry::add(
                "custom_fee",
                format!("{} ({})", new.name, format_cents(new.amount_cents)),
            ));
        }

        Ok(())
    }

    async fn ensure_unique_discount_template(
        &self,
        txn: &DatabaseTransaction,
        name: &str,
    ) -> Result<(), ServiceError> {
        let existing = discount::Entity::find()
            .filter(discount::Column::IsTemplate.eq(true))
            .filter(discount::Column::Name.eq(name))
            .one(txn)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "A discount template named '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    async fn ensure_unique_fee_template(
        &self,
        txn: &DatabaseTransaction,
        name: &str,
    ) -> Result<(), ServiceError> {
        let existing = custom_fee::Entity::find()
            .filter(custom_fee::Column::IsTemplate.eq(true))
            .filter(custom_fee::Column::Name.eq(name))
            .one(txn)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "A fee template named '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    async fn emit_events(
        &self,
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
        payment_invalidated: bool,
        approval_required: bool,
    ) {
        let Some(sender) = &self.event_sender else {
            return;
        };
        sender.send_logged(Event::OrderUpdated { order_id }).await;
        if old_status != new_status {
            sender
                .send_logged(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status,
                })
                .await;
        }
        if payment_invalidated {
            sender
                .send_logged(Event::PaymentInvalidated { order_id })
                .await;
        }
        if approval_required {
            sender
                .send_logged(Event::ApprovalRequested { order_id })
                .await;
        }
    }

    /// Email + SMS describing the change, with a link for the customer to
    /// review and approve it. Failures are logged and swallowed.
    async fn notify_customer(&self, baseline: &OrderBaseline, change_count: usize) -> bool {
        let contact = CustomerContact {
            email: Some(baseline.order.customer_email.clone()),
            phone: baseline.order.customer_phone.clone(),
        };
        let message = format!(
            "Your order {} was updated ({} change{}). Please review and approve: \
             https://orders.rentflow.dev/{}/approve",
            baseline.order.order_number,
            change_count,
            if change_count == 1 { "" } else { "s" },
            baseline.order.id
        );

        match self.notifier.notify(&contact, &message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    order_id = %baseline.order.id,
                    error = %e,
                    "Customer notification failed; save already committed"
                );
                false
            }
        }
    }
}

fn item_summary(item: &DraftItem) -> String {
    format!(
        "{} x{} ({}, {})",
        item.unit_name,
        item.quantity,
        item.mode,
        format_cents(item.unit_price_cents)
    )
}

fn discount_summary(discount: &DraftDiscount) -> String {
    match (discount.amount_cents, discount.percent_bps) {
        (Some(amount), _) if amount != 0 => {
            format!("{} ({})", discount.name, format_cents(amount))
        }
        (_, Some(bps)) => format!("{} ({}%)", discount.name, bps as f64 / 100.0),
        _ => discount.name.clone(),
    }
}

fn discount_model_summary(model: &discount::Model) -> String {
    match (model.amount_cents, model.percent_bps) {
        (Some(amount), _) if amount != 0 => format!("{} ({})", model.name, format_cents(amount)),
        (_, Some(bps)) => format!("{} ({}%)", model.name, bps as f64 / 100.0),
        _ => model.name.clone(),
    }
}

/// One changelog entry per changed scalar field. Event dates are
/// `NaiveDate` end to end, so the comparison is date-only by construction.
fn diff_scalar_fields(
    baseline: &OrderBaseline,
    draft: &OrderDraft,
    entries: &mut Vec<NewChangelogEntry>,
) {
    let b = &baseline.order;

    if b.location_type != draft.location_type {
        entries.push(NewChangelogEntry::edit(
            "location_type",
            b.location_type.to_string(),
            draft.location_type.to_string(),
        ));
    }
    if b.surface != draft.surface {
        entries.push(NewChangelogEntry::edit(
            "surface",
            b.surface.to_string(),
            draft.surface.to_string(),
        ));
    }
    if b.generator_qty != draft.generator_qty {
        entries.push(NewChangelogEntry::edit(
            "generator_qty",
            b.generator_qty.to_string(),
            draft.generator_qty.to_string(),
        ));
    }
    if b.event_date != draft.event_date {
        entries.push(NewChangelogEntry::edit(
            "event_date",
            b.event_date.to_string(),
            draft.event_date.to_string(),
        ));
    }
    if b.event_end_date != draft.event_end_date {
        entries.push(NewChangelogEntry::edit(
            "event_end_date",
            b.event_end_date.to_string(),
            draft.event_end_date.to_string(),
        ));
    }
    if b.setup_window != draft.setup_window {
        entries.push(NewChangelogEntry::edit(
            "setup_window",
            b.setup_window.clone().unwrap_or_default(),
            draft.setup_window.clone().unwrap_or_default(),
        ));
    }
    if b.pickup_window != draft.pickup_window {
        entries.push(NewChangelogEntry::edit(
            "pickup_window",
            b.pickup_window.clone().unwrap_or_default(),
            draft.pickup_window.clone().unwrap_or_default(),
        ));
    }
    if b.pickup_preference != draft.pickup_preference {
        entries.push(NewChangelogEntry::edit(
            "pickup_preference",
            b.pickup_preference.to_string(),
            draft.pickup_preference.to_string(),
        ));
    }
}

/// Pricing fields are overwritten wholesale from the breakdown, but each
/// changed field still gets its own changelog entry for audit.
fn diff_pricing_fields(
    baseline: &order::Model,
    pricing: &PriceBreakdown,
    entries: &mut Vec<NewChangelogEntry>,
) {
    let fields: [(&str, i64, i64); 9] = [
        ("subtotal", baseline.subtotal_cents, pricing.subtotal_cents),
        ("travel_fee", baseline.travel_fee_cents, pricing.travel_fee_cents),
        ("surface_fee", baseline.surface_fee_cents, pricing.surface_fee_cents),
        (
            "same_day_pickup_fee",
            baseline.same_day_pickup_fee_cents,
            pricing.same_day_pickup_fee_cents,
        ),
        ("generator_fee", baseline.generator_fee_cents, pricing.generator_fee_cents),
        ("tax", baseline.tax_cents, pricing.tax_cents),
        ("total", baseline.total_cents, pricing.total_cents),
        ("deposit_due", baseline.deposit_due_cents, pricing.deposit_due_cents),
        ("balance_due", baseline.balance_due_cents, pricing.balance_due_cents),
    ];

    for (field, old, new) in fields {
        if old != new {
            entries.push(NewChangelogEntry::edit(
                field,
                format_cents(old),
                format_cents(new),
            ));
        }
    }
}

/// Waiver flips are tracked independently of their numeric effect, with the
/// reason embedded in the log message.
fn diff_waivers(baseline: &order::Model, draft: &OrderDraft, entries: &mut Vec<NewChangelogEntry>) {
    let waivers: [(&str, bool, &WaiverSetting); 5] = [
        ("tax_waiver", baseline.tax_waived, &draft.waivers.tax),
        ("travel_fee_waiver", baseline.travel_fee_waived, &draft.waivers.travel),
        ("surface_fee_waiver", baseline.surface_fee_waived, &draft.waivers.surface),
        ("same_day_fee_waiver", baseline.same_day_fee_waived, &draft.waivers.same_day),
        (
            "generator_fee_waiver",
            baseline.generator_fee_waived,
            &draft.waivers.generator,
        ),
    ];

    for (field, was_waived, setting) in waivers {
        if was_waived != setting.waived {
            let (old_value, new_value) = if setting.waived {
                (
                    "not waived".to_string(),
                    format!(
                        "waived: {}",
                        setting.reason.as_deref().unwrap_or("no reason given")
                    ),
                )
            } else {
                ("waived".to_string(), "not waived".to_string())
            };
            entries.push(NewChangelogEntry::edit(field, old_value, new_value));
        }
    }
}

/// Conservative payment invalidation policy: clear the stored method and
/// mark the order unpaid when items changed, when the new deposit due
/// exceeds what has been captured, or when a paid-in-full order's total
/// rose above the captured amount. Pricing changes that do not increase
/// what is owed leave the stored method intact.
fn payment_must_be_invalidated(
    baseline: &order::Model,
    pricing: &PriceBreakdown,
    items_changed: bool,
) -> bool {
    if baseline.payment_method_ref.is_none() && !baseline.paid_in_full {
        return false;
    }
    if items_changed {
        return true;
    }
    if pricing.deposit_due_cents > baseline.amount_paid_cents {
        return true;
    }
    if baseline.paid_in_full && pricing.total_cents > baseline.amount_paid_cents {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{LocationType, PickupPreference, SurfaceType};
    use chrono::{NaiveDate, Utc};

    fn baseline_order() -> order::Model {
        let day = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        order::Model {
            id: Uuid::new_v4(),
            order_number: "RF-1001".to_string(),
            customer_name: "Dana Ortiz".to_string(),
            customer_email: "dana@example.com".to_string(),
            customer_phone: None,
            status: OrderStatus::Confirmed,
            location_type: LocationType::Residential,
            surface: SurfaceType::Grass,
            event_date: day,
            event_end_date: day,
            setup_window: None,
            pickup_window: None,
            pickup_preference: PickupPreference::NextDay,
            address_id: None,
            generator_qty: 0,
            subtotal_cents: 25000,
            travel_fee_cents: 4000,
            surface_fee_cents: 0,
            same_day_pickup_fee_cents: 0,
            generator_fee_cents: 0,
            tax_cents: 1740,
            total_cents: 30740,
            deposit_due_cents: 7685,
            deposit_paid_cents: 7685,
            balance_due_cents: 23055,
            custom_deposit_cents: None,
            tax_waived: false,
            tax_waived_reason: None,
            travel_fee_waived: false,
            travel_fee_waived_reason: None,
            surface_fee_waived: false,
            surface_fee_waived_reason: None,
            same_day_fee_waived: false,
            same_day_fee_waived_reason: None,
            generator_fee_waived: false,
            generator_fee_waived_reason: None,
            payment_method_ref: Some("pm_stored_123".to_string()),
            amount_paid_cents: 7685,
            paid_in_full: false,
            admin_message: None,
            is_archived: false,
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
        }
    }

    fn breakdown_matching(baseline: &order::Model) -> PriceBreakdown {
        PriceBreakdown {
            subtotal_cents: baseline.subtotal_cents,
            travel_fee_cents: baseline.travel_fee_cents,
            surface_fee_cents: baseline.surface_fee_cents,
            same_day_pickup_fee_cents: baseline.same_day_pickup_fee_cents,
            generator_fee_cents: baseline.generator_fee_cents,
            tax_cents: baseline.tax_cents,
            total_cents: baseline.total_cents,
            deposit_due_cents: baseline.deposit_due_cents,
            balance_due_cents: baseline.balance_due_cents,
            distance_miles: 28.0,
            chargeable_miles: 8.0,
            per_mile_rate_cents: 500,
            flat_travel_override: false,
            effective_pickup: baseline.pickup_preference,
            rental_days: 1,
        }
    }

    #[test]
    fn identical_pricing_produces_no_entries() {
        let baseline = baseline_order();
        let pricing = breakdown_matching(&baseline);
        let mut entries = Vec::new();
        diff_pricing_fields(&baseline, &pricing, &mut entries);
        assert!(entries.is_empty());
    }

    #[test]
    fn each_changed_pricing_field_logs_once() {
        let baseline = baseline_order();
        let mut pricing = breakdown_matching(&baseline);
        pricing.travel_fee_cents = 6000;
        pricing.tax_cents = 1860;
        pricing.total_cents = 32860;

        let mut entries = Vec::new();
        diff_pricing_fields(&baseline, &pricing, &mut entries);
        let fields: Vec<&str> = entries.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["travel_fee", "tax", "total"]);
        assert_eq!(entries[0].old_value.as_deref(), Some("$40.00"));
        assert_eq!(entries[0].new_value.as_deref(), Some("$60.00"));
    }

    #[test]
    fn waiver_flip_embeds_reason() {
        let baseline = baseline_order();
        let mut draft = OrderBaseline {
            order: baseline.clone(),
            items: Vec::new(),
            discounts: Vec::new(),
            fees: Vec::new(),
            address: None,
        }
        .to_draft();
        draft.waivers.travel = WaiverSetting::active("repeat customer");

        let mut entries = Vec::new();
        diff_waivers(&baseline, &draft, &mut entries);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field, "travel_fee_waiver");
        assert_eq!(
            entries[0].new_value.as_deref(),
            Some("waived: repeat customer")
        );
    }

    #[test]
    fn payment_invalidation_policy() {
        let baseline = baseline_order();
        let pricing = breakdown_matching(&baseline);

        // Unchanged pricing, no item changes: method survives.
        assert!(!payment_must_be_invalidated(&baseline, &pricing, false));

        // Item churn always invalidates.
        assert!(payment_must_be_invalidated(&baseline, &pricing, true));

        // Deposit rising beyond what was captured invalidates.
        let mut higher_deposit = breakdown_matching(&baseline);
        higher_deposit.deposit_due_cents = baseline.amount_paid_cents + 1;
        assert!(payment_must_be_invalidated(&baseline, &higher_deposit, false));

        // A cheaper order leaves the stored method alone.
        let mut cheaper = breakdown_matching(&baseline);
        cheaper.deposit_due_cents = baseline.amount_paid_cents - 500;
        cheaper.total_cents -= 500;
        assert!(!payment_must_be_invalidated(&baseline, &cheaper, false));
    }

    #[test]
    fn paid_in_full_total_increase_invalidates() {
        let mut baseline = baseline_order();
        baseline.paid_in_full = true;
        baseline.amount_paid_cents = baseline.total_cents;
        baseline.deposit_due_cents = 0;

        let mut pricing = breakdown_matching(&baseline);
        pricing.deposit_due_cents = 0;
        pricing.total_cents += 2500;
        assert!(payment_must_be_invalidated(&baseline, &pricing, false));

        // Same total: intact.
        let same = {
            let mut p = breakdown_matching(&baseline);
            p.deposit_due_cents = 0;
            p
        };
        assert!(!payment_must_be_invalidated(&baseline, &same, false));
    }

    #[test]
    fn no_payment_state_means_nothing_to_invalidate() {
        let mut baseline = baseline_order();
        baseline.payment_method_ref = None;
        baseline.paid_in_full = false;

        let mut pricing = breakdown_matching(&baseline);
        pricing.deposit_due_cents = baseline.amount_paid_cents + 10_000;
        assert!(!payment_must_be_invalidated(&baseline, &pricing, true));
    }

    #[test]
    fn scalar_diff_covers_tracked_fields_only() {
        let baseline_model = baseline_order();
        let baseline = OrderBaseline {
            order: baseline_model.clone(),
            items: Vec::new(),
            discounts: Vec::new(),
            fees: Vec::new(),
            address: None,
        };
        let mut draft = baseline.to_draft();
        draft.surface = SurfaceType::Cement;
        draft.event_end_date = draft.event_date + chrono::Duration::days(1);
        // Untracked field:
        draft.admin_message = Some("leave gate unlocked".to_string());

        let mut entries = Vec::new();
        diff_scalar_fields(&baseline, &draft, &mut entries);
        let fields: Vec<&str> = entries.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["surface", "event_end_date"]);
    }
}
