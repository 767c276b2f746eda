//! Append-only audit timeline for orders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::OrderStatus;
use crate::domain::foundation::{Actor, ActorId, ActorRole, EntryId, OrderId, Timestamp};

/// One audit row for a significant order event.
///
/// Rows are write-only: never mutated, never deleted. Admin reporting
/// reads them through the `TimelineStore` port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: EntryId,
    pub order_id: OrderId,
    pub actor_id: ActorId,
    pub actor_role: ActorRole,

    /// Event kind, e.g. "order.status_changed".
    pub event_type: String,

    pub old_status: Option<OrderStatus>,
    pub new_status: OrderStatus,
    pub metadata: HashMap<String, String>,
    pub occurred_at: Timestamp,
}

impl TimelineEntry {
    /// Builds a status-change entry.
    pub fn status_change(
        order_id: OrderId,
        actor: &Actor,
        old_status: OrderStatus,
        new_status: OrderStatus,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            id: EntryId::new(),
            order_id,
            actor_id: actor.id.clone(),
            actor_role: actor.role,
            event_type: "order.status_changed".to_string(),
            old_status: Some(old_status),
            new_status,
            metadata: HashMap::new(),
            occurred_at,
        }
    }

    /// Adds one metadata key to the entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ActorId;

    #[test]
    fn status_change_records_edge_and_actor() {
        let actor = Actor::new(ActorId::new("driver-7").unwrap(), ActorRole::Driver);
        let order_id = OrderId::new();

        let entry = TimelineEntry::status_change(
            order_id,
            &actor,
            OrderStatus::Enroute,
            OrderStatus::Delivered,
            Timestamp::now(),
        );

        assert_eq!(entry.order_id, order_id);
        assert_eq!(entry.actor_role, ActorRole::Driver);
        assert_eq!(entry.old_status, Some(OrderStatus::Enroute));
        assert_eq!(entry.new_status, OrderStatus::Delivered);
        assert_eq!(entry.event_type, "order.status_changed");
    }

    #[test]
    fn with_metadata_accumulates_keys() {
        let actor = Actor::system();
        let entry = TimelineEntry::status_change(
            OrderId::new(),
            &actor,
            OrderStatus::Placed,
            OrderStatus::Cancelled,
            Timestamp::now(),
        )
        .with_metadata("reason", "out of stock")
        .with_metadata("source", "vendor_reject");

        assert_eq!(entry.metadata.get("reason"), Some(&"out of stock".to_string()));
        assert_eq!(entry.metadata.len(), 2);
    }
}
