//! Realtime update events emitted on order changes.

use serde::{Deserialize, Serialize};

use super::OrderStatus;
use crate::domain::foundation::{EventEnvelope, EventId, OrderId, Timestamp};

/// Published after every committed status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdated {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub occurred_at: Timestamp,
}

impl OrderUpdated {
    pub fn new(order_id: OrderId, old_status: OrderStatus, new_status: OrderStatus) -> Self {
        Self {
            event_id: EventId::new(),
            order_id,
            old_status,
            new_status,
            occurred_at: Timestamp::now(),
        }
    }

    /// Wraps the event for transport.
    pub fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope {
            event_id: self.event_id,
            event_type: "order.updated.v1".to_string(),
            aggregate_id: self.order_id.to_string(),
            aggregate_type: "Order".to_string(),
            occurred_at: self.occurred_at,
            payload: serde_json::to_value(self)
                .expect("event serialization never fails for plain fields"),
        }
    }
}
