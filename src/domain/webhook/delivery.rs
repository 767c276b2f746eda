//! Webhook delivery records and dead-letter snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::foundation::Timestamp;

/// How a delivery reached its terminal state.
///
/// Both outcomes set `processed = true`; the annotation is what lets an
/// operator tell a success from a given-up event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryOutcome {
    Succeeded,
    Exhausted,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Exhausted => "EXHAUSTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCEEDED" => Some(Self::Succeeded),
            "EXHAUSTED" => Some(Self::Exhausted),
            _ => None,
        }
    }
}

/// One inbound provider notification, as persisted.
///
/// Created exactly once per distinct `provider_event_id`; the storage
/// layer's uniqueness constraint is what makes that hold under
/// concurrent double-delivery. Rows are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub provider_event_id: String,
    pub event_type: String,
    pub payload: JsonValue,
    pub processed: bool,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub next_retry_at: Option<Timestamp>,
    pub received_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub outcome: Option<DeliveryOutcome>,
}

impl WebhookDelivery {
    /// A freshly received, unprocessed delivery.
    pub fn new(
        provider_event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: JsonValue,
        max_attempts: u32,
        received_at: Timestamp,
    ) -> Self {
        Self {
            provider_event_id: provider_event_id.into(),
            event_type: event_type.into(),
            payload,
            processed: false,
            attempts: 0,
            max_attempts,
            last_error: None,
            next_retry_at: None,
            received_at,
            processed_at: None,
            outcome: None,
        }
    }

    /// True once all attempts are spent.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// Snapshot of an exhausted delivery for operator inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookDlqEntry {
    pub id: Uuid,

    /// Link back to the original delivery row.
    pub provider_event_id: String,

    pub event_type: String,
    pub payload: JsonValue,
    pub error_message: String,
    pub attempts: u32,
    pub moved_at: Timestamp,
}

impl WebhookDlqEntry {
    /// Snapshots a delivery at the moment it exhausts its attempts.
    pub fn from_delivery(
        delivery: &WebhookDelivery,
        error_message: impl Into<String>,
        moved_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_event_id: delivery.provider_event_id.clone(),
            event_type: delivery.event_type.clone(),
            payload: delivery.payload.clone(),
            error_message: error_message.into(),
            attempts: delivery.attempts,
            moved_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_delivery_is_unprocessed_with_zero_attempts() {
        let d = WebhookDelivery::new("evt_1", "payment.captured", json!({}), 5, Timestamp::now());

        assert!(!d.processed);
        assert_eq!(d.attempts, 0);
        assert!(d.next_retry_at.is_none());
        assert!(d.outcome.is_none());
    }

    #[test]
    fn exhaustion_tracks_max_attempts() {
        let mut d =
            WebhookDelivery::new("evt_1", "payment.captured", json!({}), 3, Timestamp::now());
        assert!(!d.is_exhausted());

        d.attempts = 3;
        assert!(d.is_exhausted());
    }

    #[test]
    fn dlq_entry_snapshots_the_delivery() {
        let mut d = WebhookDelivery::new(
            "evt_9",
            "payment.failed",
            json!({"data": {"payment_id": "pi_1"}}),
            5,
            Timestamp::now(),
        );
        d.attempts = 5;

        let entry = WebhookDlqEntry::from_delivery(&d, "payment not found", Timestamp::now());

        assert_eq!(entry.provider_event_id, "evt_9");
        assert_eq!(entry.attempts, 5);
        assert_eq!(entry.error_message, "payment not found");
        assert_eq!(entry.payload, d.payload);
    }

    #[test]
    fn outcome_round_trips() {
        for outcome in [DeliveryOutcome::Succeeded, DeliveryOutcome::Exhausted] {
            assert_eq!(DeliveryOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(DeliveryOutcome::parse("GONE"), None);
    }
}
