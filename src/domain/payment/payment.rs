//! Payment entity with idempotent status application.
//!
//! A payment is mutated from two directions: orchestrator-driven
//! capture/refund during order transitions, and webhook-driven events
//! from the provider. Both paths apply the same rules, and re-applying
//! a status the payment already has is a no-op rather than an error,
//! so duplicate deliveries and crossed paths converge.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Money, OrderId, PaymentId, StateMachine, Timestamp};

/// Provider-facing status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Captured,
    Failed,
    Refunded,
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Authorized)
                | (Pending, Captured)
                | (Pending, Failed)
                | (Authorized, Captured)
                | (Authorized, Failed)
                | (Captured, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Authorized, Captured, Failed],
            Authorized => vec![Captured, Failed],
            Captured => vec![Refunded],
            Failed => vec![],
            Refunded => vec![],
        }
    }
}

impl PaymentStatus {
    /// Parses a status from its wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "AUTHORIZED" => Some(Self::Authorized),
            "CAPTURED" => Some(Self::Captured),
            "FAILED" => Some(Self::Failed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Authorized => "AUTHORIZED",
            Self::Captured => "CAPTURED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether applying a status actually changed the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// The payment was already in the requested status.
    NoOp,
}

/// A status application that is neither a change nor an idempotent repeat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payment cannot move from {from} to {attempted}")]
pub struct PaymentStateError {
    pub from: PaymentStatus,
    pub attempted: PaymentStatus,
}

/// One-to-one companion of an order, created at intent creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,

    /// Provider-side payment identifier, unique across all payments.
    pub provider_payment_id: String,

    pub status: PaymentStatus,
    pub amount: Money,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Creates a pending payment for an order.
    pub fn new(
        order_id: OrderId,
        provider_payment_id: impl Into<String>,
        amount: Money,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            order_id,
            provider_payment_id: provider_payment_id.into(),
            status: PaymentStatus::Pending,
            amount,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the payment authorized.
    pub fn authorize(&mut self, now: Timestamp) -> Result<Applied, PaymentStateError> {
        self.apply(PaymentStatus::Authorized, now)
    }

    /// Captures the payment. Capturing an already-captured payment is a
    /// no-op, not an error.
    pub fn capture(&mut self, now: Timestamp) -> Result<Applied, PaymentStateError> {
        self.apply(PaymentStatus::Captured, now)
    }

    /// Records a provider-side failure.
    pub fn fail(
        &mut self,
        reason: Option<String>,
        now: Timestamp,
    ) -> Result<Applied, PaymentStateError> {
        let applied = self.apply(PaymentStatus::Failed, now)?;
        if applied == Applied::Changed {
            self.failure_reason = reason;
        }
        Ok(applied)
    }

    /// Refunds a captured payment.
    pub fn refund(&mut self, now: Timestamp) -> Result<Applied, PaymentStateError> {
        self.apply(PaymentStatus::Refunded, now)
    }

    fn apply(
        &mut self,
        target: PaymentStatus,
        now: Timestamp,
    ) -> Result<Applied, PaymentStateError> {
        if self.status == target {
            return Ok(Applied::NoOp);
        }
        if !self.status.can_transition_to(&target) {
            return Err(PaymentStateError {
                from: self.status,
                attempted: target,
            });
        }
        self.status = target;
        self.updated_at = now;
        Ok(Applied::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment() -> Payment {
        Payment::new(
            OrderId::new(),
            "pi_test_1",
            Money::new(11_000, "INR").unwrap(),
            Timestamp::now(),
        )
    }

    #[test]
    fn new_payment_is_pending() {
        assert_eq!(payment().status, PaymentStatus::Pending);
    }

    #[test]
    fn authorize_then_capture_changes_status() {
        let mut p = payment();
        assert_eq!(p.authorize(Timestamp::now()).unwrap(), Applied::Changed);
        assert_eq!(p.capture(Timestamp::now()).unwrap(), Applied::Changed);
        assert_eq!(p.status, PaymentStatus::Captured);
    }

    #[test]
    fn capturing_twice_is_a_noop_not_an_error() {
        let mut p = payment();
        p.authorize(Timestamp::now()).unwrap();
        p.capture(Timestamp::now()).unwrap();

        assert_eq!(p.capture(Timestamp::now()).unwrap(), Applied::NoOp);
        assert_eq!(p.status, PaymentStatus::Captured);
    }

    #[test]
    fn refunding_twice_is_a_noop() {
        let mut p = payment();
        p.authorize(Timestamp::now()).unwrap();
        p.capture(Timestamp::now()).unwrap();
        p.refund(Timestamp::now()).unwrap();

        assert_eq!(p.refund(Timestamp::now()).unwrap(), Applied::NoOp);
    }

    #[test]
    fn refund_requires_capture_first() {
        let mut p = payment();
        p.authorize(Timestamp::now()).unwrap();

        let err = p.refund(Timestamp::now()).unwrap_err();
        assert_eq!(err.from, PaymentStatus::Authorized);
        assert_eq!(err.attempted, PaymentStatus::Refunded);
    }

    #[test]
    fn capture_after_refund_is_rejected() {
        let mut p = payment();
        p.authorize(Timestamp::now()).unwrap();
        p.capture(Timestamp::now()).unwrap();
        p.refund(Timestamp::now()).unwrap();

        assert!(p.capture(Timestamp::now()).is_err());
    }

    #[test]
    fn fail_records_reason_only_on_change() {
        let mut p = payment();
        p.fail(Some("card declined".to_string()), Timestamp::now())
            .unwrap();
        assert_eq!(p.failure_reason.as_deref(), Some("card declined"));

        // Second failure is a no-op and must not overwrite the reason.
        p.fail(Some("other".to_string()), Timestamp::now()).unwrap();
        assert_eq!(p.failure_reason.as_deref(), Some("card declined"));
    }

    #[test]
    fn terminal_payment_statuses_have_no_exits() {
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Refunded.is_terminal());
    }
}
