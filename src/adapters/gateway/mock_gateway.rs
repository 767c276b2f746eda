//! Mock payment gateway for tests and local development.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::{Money, OrderId};
use crate::ports::{GatewayError, GatewayIntent, PaymentGateway};

/// Records every call and answers success unless told to fail.
#[derive(Default)]
pub struct MockPaymentGateway {
    captures: Mutex<Vec<(String, i64)>>,
    refunds: Mutex<Vec<(String, i64)>>,
    releases: Mutex<Vec<String>>,
    intents: Mutex<Vec<(OrderId, i64)>>,
    fail_next: AtomicBool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a network error until
    /// cleared.
    pub fn set_failing(&self, failing: bool) {
        self.fail_next.store(failing, Ordering::SeqCst);
    }

    pub fn capture_calls(&self) -> Vec<(String, i64)> {
        self.captures.lock().expect("gateway lock poisoned").clone()
    }

    pub fn refund_calls(&self) -> Vec<(String, i64)> {
        self.refunds.lock().expect("gateway lock poisoned").clone()
    }

    pub fn release_calls(&self) -> Vec<String> {
        self.releases.lock().expect("gateway lock poisoned").clone()
    }

    pub fn intent_calls(&self) -> Vec<(OrderId, i64)> {
        self.intents.lock().expect("gateway lock poisoned").clone()
    }

    fn check_failure(&self) -> Result<(), GatewayError> {
        if self.fail_next.load(Ordering::SeqCst) {
            Err(GatewayError::network("simulated gateway outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(
        &self,
        order_id: OrderId,
        amount: &Money,
        _idempotency_key: Option<&str>,
    ) -> Result<GatewayIntent, GatewayError> {
        self.check_failure()?;
        self.intents
            .lock()
            .expect("gateway lock poisoned")
            .push((order_id, amount.amount_minor()));
        Ok(GatewayIntent {
            provider_payment_id: format!("pi_mock_{}", order_id),
            client_secret: Some(format!("secret_{}", order_id)),
        })
    }

    async fn capture(
        &self,
        provider_payment_id: &str,
        amount: &Money,
    ) -> Result<(), GatewayError> {
        self.check_failure()?;
        self.captures
            .lock()
            .expect("gateway lock poisoned")
            .push((provider_payment_id.to_string(), amount.amount_minor()));
        Ok(())
    }

    async fn refund(
        &self,
        provider_payment_id: &str,
        amount: &Money,
    ) -> Result<(), GatewayError> {
        self.check_failure()?;
        self.refunds
            .lock()
            .expect("gateway lock poisoned")
            .push((provider_payment_id.to_string(), amount.amount_minor()));
        Ok(())
    }

    async fn release(&self, provider_payment_id: &str) -> Result<(), GatewayError> {
        self.check_failure()?;
        self.releases
            .lock()
            .expect("gateway lock poisoned")
            .push(provider_payment_id.to_string());
        Ok(())
    }
}
