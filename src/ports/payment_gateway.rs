//! Payment gateway port for external payment processing.
//!
//! Defines the contract for the provider integration (Razorpay, Stripe).
//! Implementations must keep every operation safe to retry: capturing a
//! captured payment and refunding a refunded one succeed idempotently on
//! the provider side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Money, OrderId};

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent for an order.
    ///
    /// The optional idempotency key is forwarded to the provider so a
    /// retried call returns the original intent.
    async fn create_intent(
        &self,
        order_id: OrderId,
        amount: &Money,
        idempotency_key: Option<&str>,
    ) -> Result<GatewayIntent, GatewayError>;

    /// Captures an authorized payment.
    async fn capture(&self, provider_payment_id: &str, amount: &Money)
        -> Result<(), GatewayError>;

    /// Refunds a captured payment.
    async fn refund(&self, provider_payment_id: &str, amount: &Money)
        -> Result<(), GatewayError>;

    /// Releases an authorization without capturing it.
    async fn release(&self, provider_payment_id: &str) -> Result<(), GatewayError>;
}

/// Provider-side handle for a created payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayIntent {
    /// Provider's payment id (the webhook correlation key).
    pub provider_payment_id: String,

    /// Client-side secret for completing the payment, if the provider
    /// issues one.
    pub client_secret: Option<String>,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Declined, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }
}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue or provider timeout.
    NetworkError,
    /// Provider rejected the instrument.
    Declined,
    /// Referenced payment does not exist at the provider.
    NotFound,
    /// Rate limit exceeded.
    RateLimited,
    /// Any other provider-reported error.
    ProviderError,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::RateLimited)
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NetworkError => "network_error",
            Self::Declined => "declined",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn retryability_follows_code() {
        assert!(GatewayError::network("timeout").retryable);
        assert!(!GatewayError::declined("insufficient funds").retryable);
        assert!(!GatewayError::not_found("payment").retryable);
    }

    #[test]
    fn error_displays_code_and_message() {
        let err = GatewayError::declined("card expired");
        assert_eq!(err.to_string(), "declined: card expired");
    }
}
