//! In-memory PaymentRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, PaymentId};
use crate::domain::payment::Payment;
use crate::ports::PaymentRepository;

/// HashMap-backed payment store, unique on `provider_payment_id`.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<PaymentId, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Option<Payment>, DomainError> {
        let payments = self.payments.read().await;
        Ok(payments.values().find(|p| p.order_id == order_id).cloned())
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .find(|p| p.provider_payment_id == provider_payment_id)
            .cloned())
    }

    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if payments
            .values()
            .any(|p| p.provider_payment_id == payment.provider_payment_id)
        {
            return Err(DomainError::conflict(format!(
                "provider payment id {} already exists",
                payment.provider_payment_id
            )));
        }
        payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&payment.id) {
            Some(stored) => {
                *stored = payment.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("payment {} not found", payment.id),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, Timestamp};

    fn payment(provider_id: &str) -> Payment {
        Payment::new(
            OrderId::new(),
            provider_id,
            Money::new(5_000, "INR").unwrap(),
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn lookup_by_provider_id_finds_payment() {
        let repo = InMemoryPaymentRepository::new();
        let payment = payment("pi_lookup");
        repo.insert(&payment).await.unwrap();

        let found = repo
            .find_by_provider_payment_id("pi_lookup")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, payment.id);
    }

    #[tokio::test]
    async fn duplicate_provider_id_is_rejected() {
        let repo = InMemoryPaymentRepository::new();
        repo.insert(&payment("pi_dup")).await.unwrap();

        let result = repo.insert(&payment("pi_dup")).await;
        assert!(matches!(result, Err(err) if err.code == ErrorCode::Conflict));
    }

    #[tokio::test]
    async fn lookup_by_order_finds_payment() {
        let repo = InMemoryPaymentRepository::new();
        let payment = payment("pi_order");
        repo.insert(&payment).await.unwrap();

        let found = repo.find_by_order(payment.order_id).await.unwrap().unwrap();
        assert_eq!(found.id, payment.id);
    }
}
