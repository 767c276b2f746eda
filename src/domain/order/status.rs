//! Order lifecycle statuses and the structural transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of an order.
///
/// `Delivered` and `Cancelled` are terminal: nothing transitions out of
/// them, for any role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Accepted,
    Preparing,
    Ready,
    Assigned,
    PickedUp,
    Enroute,
    Delivered,
    Cancelled,
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Placed, Accepted)
                | (Placed, Cancelled)
                | (Accepted, Preparing)
                | (Accepted, Cancelled)
                | (Preparing, Ready)
                | (Preparing, Cancelled)
                | (Ready, Assigned)
                | (Ready, PickedUp)
                | (Ready, Cancelled)
                | (Assigned, PickedUp)
                | (Assigned, Cancelled)
                | (PickedUp, Enroute)
                | (PickedUp, Cancelled)
                | (Enroute, Delivered)
                | (Enroute, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Placed => vec![Accepted, Cancelled],
            Accepted => vec![Preparing, Cancelled],
            Preparing => vec![Ready, Cancelled],
            Ready => vec![Assigned, PickedUp, Cancelled],
            Assigned => vec![PickedUp, Cancelled],
            PickedUp => vec![Enroute, Cancelled],
            Enroute => vec![Delivered, Cancelled],
            Delivered => vec![],
            Cancelled => vec![],
        }
    }
}

impl OrderStatus {
    /// All statuses, in lifecycle order. Used by exhaustive table tests.
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Placed,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Assigned,
        OrderStatus::PickedUp,
        OrderStatus::Enroute,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Parses a status from its wire representation.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "PLACED" => Ok(Self::Placed),
            "ACCEPTED" => Ok(Self::Accepted),
            "PREPARING" => Ok(Self::Preparing),
            "READY" => Ok(Self::Ready),
            "ASSIGNED" => Ok(Self::Assigned),
            "PICKED_UP" => Ok(Self::PickedUp),
            "ENROUTE" => Ok(Self::Enroute),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ValidationError::invalid_format(
                "order_status",
                format!("unknown status '{}'", other),
            )),
        }
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "PLACED",
            Self::Accepted => "ACCEPTED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Assigned => "ASSIGNED",
            Self::PickedUp => "PICKED_UP",
            Self::Enroute => "ENROUTE",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
