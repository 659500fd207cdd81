//! Order status transition validation.
//!
//! The validator is advisory: it decides whether a transition is legal and
//! why, but never persists anything. Callers apply the new status
//! themselves and can treat a rejection as fully recoverable.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::models::order::OrderStatus;

/// Order context consulted by guarded transitions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransitionContext {
    /// Whether an opaque payment-method reference is stored on the order.
    pub payment_method_on_file: bool,
    /// Cents still owed toward the deposit.
    pub amount_due_cents: i64,
}

/// Outcome of validating one transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDecision {
    pub valid: bool,
    pub reason: Option<String>,
}

impl TransitionDecision {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Validates a requested status change against the adjacency table and its
/// guards.
#[instrument]
pub fn validate_transition(
    current: OrderStatus,
    requested: OrderStatus,
    ctx: &TransitionContext,
) -> TransitionDecision {
    // Self-transition is a no-op and always valid.
    if current == requested {
        return TransitionDecision::ok();
    }

    let legal = current.transitions_from();
    if !legal.contains(&requested) {
        let targets = if legal.is_empty() {
            "none (terminal status)".to_string()
        } else {
            legal
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        return TransitionDecision::rejected(format!(
            "Cannot transition from '{}' to '{}'; legal targets: {}",
            current, requested, targets
        ));
    }

    if requested == OrderStatus::Confirmed && !confirm_guard(ctx) {
        return TransitionDecision::rejected(format!(
            "Cannot confirm without a payment method on file while {} is due",
            crate::models::pricing::format_cents(ctx.amount_due_cents)
        ));
    }

    TransitionDecision::ok()
}

/// Confirming requires a stored payment method or nothing owed.
fn confirm_guard(ctx: &TransitionContext) -> bool {
    ctx.payment_method_on_file || ctx.amount_due_cents == 0
}
