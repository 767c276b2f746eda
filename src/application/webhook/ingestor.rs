//! WebhookIngestor - verifies, dedups, persists, and attempts processing.
//!
//! The ingest contract with the provider: once the event is durably
//! stored we acknowledge (`true`) no matter how processing went, so the
//! provider stops re-delivering; the retry pipeline owns eventual
//! success. Only verification failures are turned away (`false`)
//! without persistence.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::foundation::DomainError;
use crate::domain::payment::ProviderEvent;
use crate::domain::webhook::{RetryPolicy, WebhookDelivery, WebhookVerifier};
use crate::ports::{Clock, SaveResult, WebhookStore};

use super::EventProcessor;

/// Entry point for inbound provider webhooks.
pub struct WebhookIngestor {
    verifier: WebhookVerifier,
    store: Arc<dyn WebhookStore>,
    processor: Arc<EventProcessor>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl WebhookIngestor {
    pub fn new(
        verifier: WebhookVerifier,
        store: Arc<dyn WebhookStore>,
        processor: Arc<EventProcessor>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            store,
            processor,
            policy,
            clock,
        }
    }

    /// Ingests one raw webhook delivery.
    ///
    /// Returns `Ok(false)` for rejected deliveries (bad signature,
    /// unparseable body) and `Ok(true)` once the event is durably
    /// stored, whether or not the synchronous processing attempt
    /// succeeded. Storage failures propagate so the caller answers 5xx
    /// and the provider re-delivers.
    pub async fn ingest(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> Result<bool, DomainError> {
        if let Err(err) = self.verifier.verify(raw_body, signature_header) {
            warn!(error = %err, "rejecting webhook: signature verification failed");
            return Ok(false);
        }

        let payload: serde_json::Value = match serde_json::from_slice(raw_body) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "rejecting webhook: body is not valid JSON");
                return Ok(false);
            }
        };

        let event = ProviderEvent::from_payload(payload);
        let provider_event_id = match &event.id {
            Some(id) => id.clone(),
            None => {
                // Without a provider id there is no stable dedup key;
                // store under a generated one and flag the condition.
                let generated = format!("gen-{}", Uuid::new_v4());
                warn!(
                    event_type = %event.event_type,
                    %generated,
                    "webhook event missing provider event id"
                );
                generated
            }
        };

        // Idempotent dedup: a known id means the event is already
        // stored (and possibly processed); acknowledge without touching it.
        if self
            .store
            .find_by_provider_event_id(&provider_event_id)
            .await?
            .is_some()
        {
            debug!(%provider_event_id, "duplicate webhook delivery acknowledged");
            return Ok(true);
        }

        let now = self.clock.now();
        let delivery = WebhookDelivery::new(
            provider_event_id.clone(),
            event.event_type.clone(),
            event.payload.clone(),
            self.policy.max_attempts,
            now,
        );

        // The uniqueness constraint settles concurrent double-delivery:
        // the loser of the race treats the event as already handled.
        if self.store.insert_new(&delivery).await? == SaveResult::AlreadyExists {
            debug!(%provider_event_id, "lost insert race, event already stored");
            return Ok(true);
        }

        self.attempt_once(&event, &provider_event_id).await?;
        Ok(true)
    }

    /// One synchronous processing attempt for a freshly stored event.
    async fn attempt_once(
        &self,
        event: &ProviderEvent,
        provider_event_id: &str,
    ) -> Result<(), DomainError> {
        let outcome = self.processor.process(event).await;
        let now = self.clock.now();

        match outcome {
            Ok(true) => self.store.mark_processed(provider_event_id, now).await,
            Ok(false) => {
                let next = self.policy.next_retry_at(now, 1);
                self.store
                    .record_failure(provider_event_id, 1, "processing returned false", next)
                    .await
            }
            Err(err) => {
                warn!(%provider_event_id, error = %err, "synchronous webhook processing failed");
                let next = self.policy.next_retry_at(now, 1);
                self.store
                    .record_failure(provider_event_id, 1, &err.to_string(), next)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryOrderRepository, InMemoryPaymentRepository, InMemoryWebhookStore,
    };
    use crate::domain::foundation::{CustomerId, Money, Timestamp, VendorId};
    use crate::domain::order::{Order, OrderTotals};
    use crate::domain::payment::{Payment, PaymentStatus};
    use crate::domain::webhook::{sign_plain, SignatureScheme};
    use crate::ports::{OrderRepository, PaymentRepository, SystemClock};
    use serde_json::json;

    const SECRET: &str = "whsec_ingest_test";

    struct Fixture {
        store: Arc<InMemoryWebhookStore>,
        payments: Arc<InMemoryPaymentRepository>,
        orders: Arc<InMemoryOrderRepository>,
        ingestor: WebhookIngestor,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryWebhookStore::new());
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let processor = Arc::new(EventProcessor::new(
            payments.clone(),
            orders.clone(),
            clock.clone(),
        ));
        let ingestor = WebhookIngestor::new(
            WebhookVerifier::new(SignatureScheme::Razorpay, SECRET),
            store.clone(),
            processor,
            RetryPolicy::default(),
            clock,
        );
        Fixture {
            store,
            payments,
            orders,
            ingestor,
        }
    }

    async fn seed_authorized_payment(f: &Fixture, provider_payment_id: &str) {
        let totals = OrderTotals::new(
            Money::new(10_000, "INR").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(11_000, "INR").unwrap(),
        )
        .unwrap();
        let mut order =
            Order::place(CustomerId::new(), VendorId::new(), totals, Timestamp::now());
        let mut payment = Payment::new(
            order.id,
            provider_payment_id,
            Money::new(11_000, "INR").unwrap(),
            Timestamp::now(),
        );
        payment.status = PaymentStatus::Authorized;
        order.attach_payment(payment.id, PaymentStatus::Authorized);
        f.orders.insert(&order).await.unwrap();
        f.payments.insert(&payment).await.unwrap();
    }

    fn signed(body: &serde_json::Value) -> (Vec<u8>, String) {
        let bytes = serde_json::to_vec(body).unwrap();
        let signature = sign_plain(SECRET, &bytes);
        (bytes, signature)
    }

    #[tokio::test]
    async fn rejects_bad_signature_without_persisting() {
        let f = fixture();
        let body = json!({"id": "evt_1", "type": "payment.captured", "data": {}});
        let bytes = serde_json::to_vec(&body).unwrap();

        let accepted = f.ingestor.ingest(&bytes, "deadbeef").await.unwrap();

        assert!(!accepted);
        assert!(f
            .store
            .find_by_provider_event_id("evt_1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn accepts_and_processes_valid_event() {
        let f = fixture();
        seed_authorized_payment(&f, "pi_1").await;
        let (bytes, sig) = signed(&json!({
            "id": "evt_ok",
            "type": "payment.captured",
            "data": { "payment_id": "pi_1" }
        }));

        assert!(f.ingestor.ingest(&bytes, &sig).await.unwrap());

        let delivery = f
            .store
            .find_by_provider_event_id("evt_ok")
            .await
            .unwrap()
            .unwrap();
        assert!(delivery.processed);
        assert!(delivery.processed_at.is_some());
        let payment = f
            .payments
            .find_by_provider_payment_id("pi_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Captured);
    }

    #[tokio::test]
    async fn duplicate_delivery_stores_one_row_and_mutates_once() {
        let f = fixture();
        seed_authorized_payment(&f, "pi_1").await;
        let (bytes, sig) = signed(&json!({
            "id": "evt_dup",
            "type": "payment.captured",
            "data": { "payment_id": "pi_1" }
        }));

        assert!(f.ingestor.ingest(&bytes, &sig).await.unwrap());
        assert!(f.ingestor.ingest(&bytes, &sig).await.unwrap());

        assert_eq!(f.store.total_count().await, 1);
        let payment = f
            .payments
            .find_by_provider_payment_id("pi_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Captured);
    }

    #[tokio::test]
    async fn failed_processing_is_acknowledged_and_scheduled_for_retry() {
        let f = fixture();
        // No payment seeded: processing returns false.
        let (bytes, sig) = signed(&json!({
            "id": "evt_lag",
            "type": "payment.captured",
            "data": { "payment_id": "pi_unseen" }
        }));

        assert!(f.ingestor.ingest(&bytes, &sig).await.unwrap());

        let delivery = f
            .store
            .find_by_provider_event_id("evt_lag")
            .await
            .unwrap()
            .unwrap();
        assert!(!delivery.processed);
        assert_eq!(delivery.attempts, 1);
        assert!(delivery.next_retry_at.is_some());
        assert!(delivery.last_error.is_some());
    }

    #[tokio::test]
    async fn missing_event_id_gets_generated_fallback() {
        let f = fixture();
        let (bytes, sig) = signed(&json!({
            "type": "payment.captured",
            "data": { "payment_id": "pi_x" }
        }));

        assert!(f.ingestor.ingest(&bytes, &sig).await.unwrap());

        assert_eq!(f.store.total_count().await, 1);
        let stored = f.store.all().await;
        assert!(stored[0].provider_event_id.starts_with("gen-"));
    }

    #[tokio::test]
    async fn unparseable_body_is_rejected() {
        let f = fixture();
        let body = b"not json";
        let sig = sign_plain(SECRET, body);

        assert!(!f.ingestor.ingest(body, &sig).await.unwrap());
        assert_eq!(f.store.total_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_event_type_is_stored_and_settled() {
        let f = fixture();
        let (bytes, sig) = signed(&json!({
            "id": "evt_unknown",
            "type": "vendor.settlement.created",
            "data": {}
        }));

        assert!(f.ingestor.ingest(&bytes, &sig).await.unwrap());

        let delivery = f
            .store
            .find_by_provider_event_id("evt_unknown")
            .await
            .unwrap()
            .unwrap();
        assert!(delivery.processed);
    }
}
