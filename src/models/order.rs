//! Canonical order vocabulary.
//!
//! The state machine, the availability checker's blocking set, the entities
//! and the reconciliation service all work from the enums defined here. The
//! database stores the snake_case string values.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The possible statuses of an order, from intake to completion.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending_review")]
    PendingReview,
    #[sea_orm(string_value = "awaiting_customer_approval")]
    AwaitingCustomerApproval,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "setup_in_progress")]
    SetupInProgress,
    #[sea_orm(string_value = "on_the_way")]
    OnTheWay,
    #[sea_orm(string_value = "setup_completed")]
    SetupCompleted,
    #[sea_orm(string_value = "pickup_in_progress")]
    PickupInProgress,
    #[sea_orm(string_value = "on_the_way_back")]
    OnTheWayBack,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "void")]
    Void,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 12] = [
        OrderStatus::Draft,
        OrderStatus::PendingReview,
        OrderStatus::AwaitingCustomerApproval,
        OrderStatus::Confirmed,
        OrderStatus::SetupInProgress,
        OrderStatus::OnTheWay,
        OrderStatus::SetupCompleted,
        OrderStatus::PickupInProgress,
        OrderStatus::OnTheWayBack,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Void,
    ];

    /// Terminal statuses accept no further edits or transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Void
        )
    }

    /// Whether an order in this status holds its units against other
    /// bookings. Everything from initial review through completion blocks;
    /// drafts and dead orders never do.
    pub fn blocks_availability(&self) -> bool {
        !matches!(
            self,
            OrderStatus::Draft | OrderStatus::Cancelled | OrderStatus::Void
        )
    }

    /// The statuses that count as active reservations.
    pub fn blocking() -> Vec<OrderStatus> {
        OrderStatus::ALL
            .iter()
            .copied()
            .filter(OrderStatus::blocks_availability)
            .collect()
    }

    /// Legal transition targets from this status. Self-transitions are
    /// handled by the validator, not listed here.
    pub fn transitions_from(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Draft => &[
                OrderStatus::PendingReview,
                OrderStatus::Cancelled,
                OrderStatus::Void,
            ],
            OrderStatus::PendingReview => &[
                OrderStatus::AwaitingCustomerApproval,
                OrderStatus::Confirmed,
                OrderStatus::Cancelled,
                OrderStatus::Void,
            ],
            OrderStatus::AwaitingCustomerApproval => &[
                OrderStatus::Confirmed,
                OrderStatus::PendingReview,
                OrderStatus::Cancelled,
                OrderStatus::Void,
            ],
            OrderStatus::Confirmed => &[
                OrderStatus::SetupInProgress,
                OrderStatus::Cancelled,
                OrderStatus::Void,
            ],
            OrderStatus::SetupInProgress => &[OrderStatus::OnTheWay],
            OrderStatus::OnTheWay => &[OrderStatus::SetupCompleted],
            OrderStatus::SetupCompleted => &[
                OrderStatus::OnTheWay,
                OrderStatus::PickupInProgress,
            ],
            OrderStatus::PickupInProgress => &[OrderStatus::OnTheWayBack],
            OrderStatus::OnTheWayBack => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Void => &[],
        }
    }
}

/// Where the event takes place; commercial bookings price differently and
/// are forced into same-day pickup.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationType {
    #[sea_orm(string_value = "residential")]
    Residential,
    #[sea_orm(string_value = "commercial")]
    Commercial,
}

/// Setup surface. Stakes anchor on grass; hard surfaces need sandbags.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SurfaceType {
    #[sea_orm(string_value = "grass")]
    Grass,
    #[sea_orm(string_value = "cement")]
    Cement,
}

/// When the crew collects the equipment after the event.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PickupPreference {
    #[sea_orm(string_value = "same_day")]
    SameDay,
    #[sea_orm(string_value = "next_day")]
    NextDay,
}

/// How an inflatable is set up for the booking.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RentalMode {
    #[sea_orm(string_value = "dry")]
    Dry,
    #[sea_orm(string_value = "water")]
    Water,
}

/// Kind of change recorded in the order changelog.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeKind {
    #[sea_orm(string_value = "add")]
    Add,
    #[sea_orm(string_value = "remove")]
    Remove,
    #[sea_orm(string_value = "edit")]
    Edit,
}
