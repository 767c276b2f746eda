//! Parsed provider webhook events.
//!
//! The provider's event vocabulary is reduced to a closed set of kinds.
//! Anything outside the set becomes `Ignored`, which is acknowledged
//! without action so harmless events never poison the retry queue.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Known provider event kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventKind {
    PaymentAuthorized,
    PaymentCaptured,
    PaymentFailed,
    PaymentRefunded,
    /// Recognized as well-formed but not relevant to payment state.
    Ignored(String),
}

impl ProviderEventKind {
    /// Maps a provider event-type string onto the closed kind set.
    pub fn from_event_type(s: &str) -> Self {
        match s {
            "payment.authorized" => Self::PaymentAuthorized,
            "payment.captured" | "payment.success" => Self::PaymentCaptured,
            "payment.failed" => Self::PaymentFailed,
            "payment.refunded" | "refund.processed" => Self::PaymentRefunded,
            other => Self::Ignored(other.to_string()),
        }
    }
}

/// One provider notification, parsed far enough to route it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEvent {
    /// Provider event id when the payload carried one.
    pub id: Option<String>,

    /// Raw event-type string as sent by the provider.
    pub event_type: String,

    pub kind: ProviderEventKind,

    /// Full payload, kept verbatim for retries and the DLQ.
    pub payload: JsonValue,
}

impl ProviderEvent {
    /// Parses the routed fields out of a webhook payload.
    ///
    /// Providers disagree on field names; the id is taken from `id` or
    /// `event_id`, the type from `type` or `event`.
    pub fn from_payload(payload: JsonValue) -> Self {
        let id = payload
            .get("id")
            .or_else(|| payload.get("event_id"))
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        let event_type = payload
            .get("type")
            .or_else(|| payload.get("event"))
            .and_then(JsonValue::as_str)
            .unwrap_or("")
            .to_string();

        let kind = ProviderEventKind::from_event_type(&event_type);

        Self {
            id,
            event_type,
            kind,
            payload,
        }
    }

    /// Resolves the provider payment id referenced by this event.
    ///
    /// Checked locations, in order: `data.payment_id`,
    /// `data.payment.entity.id` (razorpay), `data.object.id` (stripe).
    pub fn provider_payment_id(&self) -> Option<&str> {
        let data = self.payload.get("data")?;
        data.get("payment_id")
            .and_then(JsonValue::as_str)
            .or_else(|| {
                data.get("payment")
                    .and_then(|p| p.get("entity"))
                    .and_then(|e| e.get("id"))
                    .and_then(JsonValue::as_str)
            })
            .or_else(|| {
                data.get("object")
                    .and_then(|o| o.get("id"))
                    .and_then(JsonValue::as_str)
            })
    }

    /// Provider-reported failure description, when present.
    pub fn failure_reason(&self) -> Option<String> {
        self.payload
            .get("data")
            .and_then(|d| d.get("error_description").or_else(|| d.get("failure_message")))
            .and_then(JsonValue::as_str)
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_known_event_types() {
        assert_eq!(
            ProviderEventKind::from_event_type("payment.captured"),
            ProviderEventKind::PaymentCaptured
        );
        assert_eq!(
            ProviderEventKind::from_event_type("payment.success"),
            ProviderEventKind::PaymentCaptured
        );
        assert_eq!(
            ProviderEventKind::from_event_type("refund.processed"),
            ProviderEventKind::PaymentRefunded
        );
    }

    #[test]
    fn unknown_event_type_becomes_ignored() {
        assert_eq!(
            ProviderEventKind::from_event_type("invoice.created"),
            ProviderEventKind::Ignored("invoice.created".to_string())
        );
    }

    #[test]
    fn parses_flat_payment_id() {
        let event = ProviderEvent::from_payload(json!({
            "id": "evt_1",
            "type": "payment.captured",
            "data": { "payment_id": "pi_1" }
        }));

        assert_eq!(event.id.as_deref(), Some("evt_1"));
        assert_eq!(event.kind, ProviderEventKind::PaymentCaptured);
        assert_eq!(event.provider_payment_id(), Some("pi_1"));
    }

    #[test]
    fn parses_razorpay_nested_entity() {
        let event = ProviderEvent::from_payload(json!({
            "event_id": "evt_rzp_9",
            "event": "payment.authorized",
            "data": { "payment": { "entity": { "id": "pay_abc" } } }
        }));

        assert_eq!(event.id.as_deref(), Some("evt_rzp_9"));
        assert_eq!(event.kind, ProviderEventKind::PaymentAuthorized);
        assert_eq!(event.provider_payment_id(), Some("pay_abc"));
    }

    #[test]
    fn parses_stripe_object_id() {
        let event = ProviderEvent::from_payload(json!({
            "id": "evt_st_4",
            "type": "payment.failed",
            "data": { "object": { "id": "pi_77" }, "failure_message": "card declined" }
        }));

        assert_eq!(event.provider_payment_id(), Some("pi_77"));
        assert_eq!(event.failure_reason().as_deref(), Some("card declined"));
    }

    #[test]
    fn missing_id_leaves_none() {
        let event = ProviderEvent::from_payload(json!({
            "type": "payment.captured",
            "data": { "payment_id": "pi_1" }
        }));
        assert!(event.id.is_none());
    }

    #[test]
    fn missing_payment_id_resolves_to_none() {
        let event = ProviderEvent::from_payload(json!({
            "id": "evt_2",
            "type": "payment.captured",
            "data": {}
        }));
        assert!(event.provider_payment_id().is_none());
    }
}
