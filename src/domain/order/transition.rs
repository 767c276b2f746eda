//! Transition validation: structural table plus role permissions.
//!
//! Validation order is fixed: terminal-state check, then structural
//! reachability, then role permission. Each failure is a distinct typed
//! error carrying the attempted edge so callers can map to precise
//! status codes and messages. `is_allowed` wraps the same function so
//! the two can never drift.

use thiserror::Error;

use super::OrderStatus;
use crate::domain::foundation::{ActorRole, StateMachine};

/// Rejection reasons for a requested order transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The order is already in a terminal state.
    #[error("order is terminal in {from}: no transition to {to} is possible")]
    TerminalState { from: OrderStatus, to: OrderStatus },

    /// The target is not reachable from the current status for any role.
    #[error("no transition path from {from} to {to}")]
    NotReachable { from: OrderStatus, to: OrderStatus },

    /// The edge exists but this role may not drive it.
    #[error("role {role} may not transition an order from {from} to {to}")]
    RoleNotPermitted {
        from: OrderStatus,
        to: OrderStatus,
        role: ActorRole,
    },
}

/// Validates a requested transition for the given role.
pub fn validate_transition(
    from: OrderStatus,
    to: OrderStatus,
    role: ActorRole,
) -> Result<(), TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::TerminalState { from, to });
    }
    if !from.can_transition_to(&to) {
        return Err(TransitionError::NotReachable { from, to });
    }
    if !role.bypasses_permissions() && !role_permits(role, from, to) {
        return Err(TransitionError::RoleNotPermitted { from, to, role });
    }
    Ok(())
}

/// Non-throwing wrapper over [`validate_transition`].
pub fn is_allowed(from: OrderStatus, to: OrderStatus, role: ActorRole) -> bool {
    validate_transition(from, to, role).is_ok()
}

/// Role-permission table: which role may drive which edge.
///
/// Admin and system roles never reach this table (see
/// `ActorRole::bypasses_permissions`).
fn role_permits(role: ActorRole, from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match role {
        ActorRole::Vendor => matches!(
            (from, to),
            (Placed, Accepted)
                | (Placed, Cancelled)
                | (Accepted, Preparing)
                | (Accepted, Cancelled)
                | (Preparing, Ready)
                | (Preparing, Cancelled)
        ),
        ActorRole::Driver => matches!(
            (from, to),
            (Ready, PickedUp) | (Assigned, PickedUp) | (PickedUp, Enroute) | (Enroute, Delivered)
        ),
        ActorRole::Customer => matches!((from, to), (Placed, Cancelled)),
        ActorRole::Admin | ActorRole::System => true,
    }
}
