//! Availability checking for physical rental units.
//!
//! A unit is unavailable for a requested date range when any order in the
//! blocking status set holds it for an overlapping range. Overlap is
//! closed-interval on both ends: a booking ending Jan 3 conflicts with one
//! starting Jan 3. Query failures propagate as errors so callers treat the
//! unit as unavailable rather than risking a double-booking.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{order, order_item, rental_unit};
use crate::errors::ServiceError;
use crate::models::order::OrderStatus;

/// An order blocking the requested range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConflict {
    pub order_id: Uuid,
    pub order_number: String,
    pub event_date: NaiveDate,
    pub event_end_date: NaiveDate,
    pub status: OrderStatus,
}

/// Result of checking one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub unit_id: Uuid,
    pub unit_name: String,
    pub available: bool,
    pub conflicts: Vec<ReservationConflict>,
}

/// Closed-interval overlap: true when either boundary of one range falls
/// inside the other, or one contains the other.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

#[derive(Clone)]
pub struct AvailabilityService {
    db: Arc<DatabaseConnection>,
}

impl AvailabilityService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Checks a single unit for the requested range. `exclude_order_id`
    /// keeps the order being edited from conflicting with its own
    /// reservation.
    #[instrument(skip(self), fields(unit_id = %unit_id))]
    pub async fn check_unit(
        &self,
        unit_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_order_id: Option<Uuid>,
    ) -> Result<AvailabilityResult, ServiceError> {
        self.check_unit_on(&*self.db, unit_id, start, end, exclude_order_id)
            .await
    }

    /// Transaction-aware form used by the reconciliation service to
    /// re-validate inside its save transaction.
    pub async fn check_unit_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        unit_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_order_id: Option<Uuid>,
    ) -> Result<AvailabilityResult, ServiceError> {
        if end < start {
            return Err(ServiceError::ValidationError(
                "Requested end date precedes the start date".to_string(),
            ));
        }

        let unit = rental_unit::Entity::find_by_id(unit_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Rental unit {} not found", unit_id)))?;

        let mut query = order_item::Entity::find()
            .filter(order_item::Column::UnitId.eq(unit_id))
            .find_also_related(order::Entity)
            .filter(order::Column::Status.is_in(OrderStatus::blocking()))
            .filter(order::Column::EventDate.lte(end))
            .filter(order::Column::EventEndDate.gte(start));

        if let Some(exclude) = exclude_order_id {
            query = query.filter(order::Column::Id.ne(exclude));
        }

        let rows = query.all(conn).await?;

        // One order can hold several items of the same unit; report it once.
        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut conflicts = Vec::new();
        for (_, maybe_order) in rows {
            let Some(blocking_order) = maybe_order else {
                continue;
            };
            if seen.insert(blocking_order.id) {
                conflicts.push(ReservationConflict {
                    order_id: blocking_order.id,
                    order_number: blocking_order.order_number,
                    event_date: blocking_order.event_date,
                    event_end_date: blocking_order.event_end_date,
                    status: blocking_order.status,
                });
            }
        }

        if !conflicts.is_empty() {
            info!(
                unit = %unit.name,
                conflict_count = conflicts.len(),
                "Unit has blocking reservations for the requested range"
            );
        }

        Ok(AvailabilityResult {
            unit_id,
            unit_name: unit.name,
            available: conflicts.is_empty(),
            conflicts,
        })
    }

    /// Batch form: each unit is checked independently; the caller
    /// aggregates conflicts before deciding whether to block a save.
    #[instrument(skip(self, unit_ids), fields(count = unit_ids.len()))]
    pub async fn check_units(
        &self,
        unit_ids: &[Uuid],
        start: NaiveDate,
        end: NaiveDate,
        exclude_order_id: Option<Uuid>,
    ) -> Result<Vec<AvailabilityResult>, ServiceError> {
        try_join_all(
            unit_ids
                .iter()
                .map(|&unit_id| self.check_unit(unit_id, start, end, exclude_order_id)),
        )
        .await
    }
}
