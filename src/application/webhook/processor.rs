//! EventProcessor - applies provider events to payment and order state.
//!
//! Shared by the synchronous ingest attempt and the background
//! reconciler, so both paths mutate state identically. The boolean
//! return is the retry contract: `true` means the event is settled
//! (applied or safely ignorable), `false` means a retry may succeed
//! later.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::foundation::DomainError;
use crate::domain::payment::{ProviderEvent, ProviderEventKind};
use crate::ports::{Clock, OrderRepository, PaymentRepository};

/// Pure dispatcher from provider events to state changes.
pub struct EventProcessor {
    payments: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
    clock: Arc<dyn Clock>,
}

impl EventProcessor {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        orders: Arc<dyn OrderRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            payments,
            orders,
            clock,
        }
    }

    /// Processes one provider event.
    ///
    /// Returns `Ok(true)` when the event is settled, `Ok(false)` when a
    /// retry may succeed (payment row not yet visible, lost an update
    /// race, state not yet reachable). Storage failures propagate as
    /// errors and are treated as retryable by callers.
    pub async fn process(&self, event: &ProviderEvent) -> Result<bool, DomainError> {
        if let ProviderEventKind::Ignored(ref raw) = event.kind {
            debug!(event_type = %raw, "acknowledging unhandled webhook event type");
            return Ok(true);
        }

        let provider_payment_id = match event.provider_payment_id() {
            Some(id) => id.to_string(),
            None => {
                warn!(
                    event_type = %event.event_type,
                    "webhook event carries no payment id"
                );
                return Ok(false);
            }
        };

        // The payment row may not be committed yet when the provider is
        // faster than our own write path; not-found is retryable.
        let mut payment = match self
            .payments
            .find_by_provider_payment_id(&provider_payment_id)
            .await?
        {
            Some(payment) => payment,
            None => {
                debug!(%provider_payment_id, "payment not found yet, will retry");
                return Ok(false);
            }
        };

        let now = self.clock.now();
        let applied = match event.kind {
            ProviderEventKind::PaymentAuthorized => payment.authorize(now),
            ProviderEventKind::PaymentCaptured => payment.capture(now),
            ProviderEventKind::PaymentFailed => payment.fail(event.failure_reason(), now),
            ProviderEventKind::PaymentRefunded => payment.refund(now),
            ProviderEventKind::Ignored(_) => unreachable!("handled above"),
        };

        match applied {
            Ok(_) => {}
            Err(err) => {
                warn!(%provider_payment_id, error = %err, "payment state not applicable");
                return Ok(false);
            }
        }

        self.payments.update(&payment).await?;
        self.propagate_to_order(&payment).await
    }

    /// Mirrors the payment status onto the owning order.
    async fn propagate_to_order(
        &self,
        payment: &crate::domain::payment::Payment,
    ) -> Result<bool, DomainError> {
        let mut order = match self.orders.find_by_id(payment.order_id).await? {
            Some(order) => order,
            None => {
                debug!(order_id = %payment.order_id, "owning order not found yet, will retry");
                return Ok(false);
            }
        };

        if order.payment_status == Some(payment.status) {
            return Ok(true);
        }

        order.payment_status = Some(payment.status);
        match self.orders.update(&order).await {
            Ok(()) => Ok(true),
            Err(err) if err.code == crate::domain::foundation::ErrorCode::Conflict => {
                debug!(order_id = %order.id, "lost order update race, will retry");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryOrderRepository, InMemoryPaymentRepository};
    use crate::domain::foundation::{CustomerId, Money, Timestamp, VendorId};
    use crate::domain::order::{Order, OrderTotals};
    use crate::domain::payment::{Payment, PaymentStatus};
    use crate::ports::SystemClock;
    use serde_json::json;

    struct Fixture {
        payments: Arc<InMemoryPaymentRepository>,
        orders: Arc<InMemoryOrderRepository>,
        processor: EventProcessor,
    }

    fn fixture() -> Fixture {
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let processor = EventProcessor::new(
            payments.clone(),
            orders.clone(),
            Arc::new(SystemClock),
        );
        Fixture {
            payments,
            orders,
            processor,
        }
    }

    fn totals() -> OrderTotals {
        OrderTotals::new(
            Money::new(10_000, "INR").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(11_000, "INR").unwrap(),
        )
        .unwrap()
    }

    async fn seed_order_with_payment(
        fixture: &Fixture,
        provider_payment_id: &str,
        status: PaymentStatus,
    ) -> (Order, Payment) {
        let mut order =
            Order::place(CustomerId::new(), VendorId::new(), totals(), Timestamp::now());
        let mut payment = Payment::new(
            order.id,
            provider_payment_id,
            Money::new(11_000, "INR").unwrap(),
            Timestamp::now(),
        );
        payment.status = status;
        order.attach_payment(payment.id, status);

        fixture.orders.insert(&order).await.unwrap();
        fixture.payments.insert(&payment).await.unwrap();
        (order, payment)
    }

    fn captured_event(payment_id: &str) -> ProviderEvent {
        ProviderEvent::from_payload(json!({
            "id": "evt_1",
            "type": "payment.captured",
            "data": { "payment_id": payment_id }
        }))
    }

    #[tokio::test]
    async fn captures_authorized_payment_and_propagates() {
        let f = fixture();
        let (order, payment) =
            seed_order_with_payment(&f, "pi_1", PaymentStatus::Authorized).await;

        let settled = f.processor.process(&captured_event("pi_1")).await.unwrap();

        assert!(settled);
        let payment = f.payments.find_by_id(payment.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Captured);
        let order = f.orders.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, Some(PaymentStatus::Captured));
    }

    #[tokio::test]
    async fn duplicate_capture_is_settled_without_change() {
        let f = fixture();
        seed_order_with_payment(&f, "pi_1", PaymentStatus::Authorized).await;

        assert!(f.processor.process(&captured_event("pi_1")).await.unwrap());
        // Second delivery of the same state is a no-op that still settles.
        assert!(f.processor.process(&captured_event("pi_1")).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged() {
        let f = fixture();
        let event = ProviderEvent::from_payload(json!({
            "id": "evt_2",
            "type": "customer.created",
            "data": {}
        }));

        assert!(f.processor.process(&event).await.unwrap());
    }

    #[tokio::test]
    async fn missing_payment_is_retryable() {
        let f = fixture();

        let settled = f.processor.process(&captured_event("pi_ghost")).await.unwrap();

        assert!(!settled);
    }

    #[tokio::test]
    async fn missing_payment_id_is_retryable() {
        let f = fixture();
        let event = ProviderEvent::from_payload(json!({
            "id": "evt_3",
            "type": "payment.captured",
            "data": {}
        }));

        assert!(!f.processor.process(&event).await.unwrap());
    }

    #[tokio::test]
    async fn failed_event_records_reason() {
        let f = fixture();
        let (_, payment) = seed_order_with_payment(&f, "pi_9", PaymentStatus::Pending).await;

        let event = ProviderEvent::from_payload(json!({
            "id": "evt_4",
            "type": "payment.failed",
            "data": { "payment_id": "pi_9", "error_description": "card declined" }
        }));

        assert!(f.processor.process(&event).await.unwrap());
        let payment = f.payments.find_by_id(payment.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.failure_reason.as_deref(), Some("card declined"));
    }

    #[tokio::test]
    async fn inapplicable_state_is_retryable_not_fatal() {
        let f = fixture();
        // Refund event against a pending payment cannot apply.
        seed_order_with_payment(&f, "pi_5", PaymentStatus::Pending).await;
        let event = ProviderEvent::from_payload(json!({
            "id": "evt_5",
            "type": "payment.refunded",
            "data": { "payment_id": "pi_5" }
        }));

        assert!(!f.processor.process(&event).await.unwrap());
    }
}
