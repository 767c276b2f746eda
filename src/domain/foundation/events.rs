//! Event envelope for realtime update publishing.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::Timestamp;

/// Unique identifier for a published event instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random EventId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an EventId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport wrapper for a realtime update event.
///
/// Subscriber mechanics (websocket rooms, admin dashboards) are outside
/// this crate; publishers hand envelopes to the `EventPublisher` port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Routing key, e.g. "order.updated.v1".
    pub event_type: String,

    /// Identifier of the aggregate the event concerns.
    pub aggregate_id: String,

    /// Aggregate kind, e.g. "Order".
    pub aggregate_type: String,

    pub occurred_at: Timestamp,

    /// Serialized event body.
    pub payload: JsonValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_generates_unique_values() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn envelope_serializes_round_trip() {
        let envelope = EventEnvelope {
            event_id: EventId::new(),
            event_type: "order.updated.v1".to_string(),
            aggregate_id: "order-1".to_string(),
            aggregate_type: "Order".to_string(),
            occurred_at: Timestamp::from_unix_secs(1_700_000_000),
            payload: serde_json::json!({"new_status": "ACCEPTED"}),
        };

        let json = serde_json::to_string(&envelope).unwrap();
        let back: EventEnvelope = serde_json::from_str(&json).unwrap();

        assert_eq!(back.event_type, "order.updated.v1");
        assert_eq!(back.payload["new_status"], "ACCEPTED");
    }
}
