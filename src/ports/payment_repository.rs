//! PaymentRepository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId, PaymentId};
use crate::domain::payment::Payment;

/// Port for persisting and loading payments.
///
/// `provider_payment_id` is unique in storage; webhook processing uses
/// it as the lookup key since providers never see internal ids.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Loads a payment by internal id.
    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError>;

    /// Loads the payment attached to an order.
    async fn find_by_order(&self, order_id: OrderId) -> Result<Option<Payment>, DomainError>;

    /// Loads a payment by the provider's payment id.
    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Inserts a new payment.
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Updates an existing payment.
    async fn update(&self, payment: &Payment) -> Result<(), DomainError>;
}
