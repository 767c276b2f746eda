//! Order aggregate root.

use serde::{Deserialize, Serialize};

use super::OrderStatus;
use crate::domain::foundation::{
    CustomerId, DriverId, Money, OrderId, PaymentId, Timestamp, ValidationError, VendorId,
};
use crate::domain::payment::PaymentStatus;

/// Monetary breakdown of an order, all in the same currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Builds totals, checking the total equals the sum of its parts.
    pub fn new(
        subtotal: Money,
        tax: Money,
        delivery_fee: Money,
        total: Money,
    ) -> Result<Self, ValidationError> {
        let expected = subtotal.add(&tax)?.add(&delivery_fee)?;
        if expected != total {
            return Err(ValidationError::invalid_format(
                "total",
                format!("expected {}, got {}", expected, total),
            ));
        }
        Ok(Self {
            subtotal,
            tax,
            delivery_fee,
            total,
        })
    }
}

/// The order aggregate root.
///
/// `status` only ever changes through the lifecycle orchestrator, which
/// validates every edge against the state machine. `version` is the
/// optimistic-concurrency counter: repositories compare-and-swap on it,
/// so concurrent transitions on one order resolve to a single winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub customer: CustomerId,
    pub vendor: VendorId,
    pub driver: Option<DriverId>,
    pub totals: OrderTotals,
    pub payment: Option<PaymentId>,
    pub payment_status: Option<PaymentStatus>,
    pub cancellation_reason: Option<String>,
    pub created_at: Timestamp,
    pub delivered_at: Option<Timestamp>,
    pub version: u32,
}

impl Order {
    /// Places a new order for a customer at a vendor.
    pub fn place(
        customer: CustomerId,
        vendor: VendorId,
        totals: OrderTotals,
        now: Timestamp,
    ) -> Self {
        Self {
            id: OrderId::new(),
            status: OrderStatus::Placed,
            customer,
            vendor,
            driver: None,
            totals,
            payment: None,
            payment_status: None,
            cancellation_reason: None,
            created_at: now,
            delivered_at: None,
            version: 1,
        }
    }

    /// Attaches the payment created for this order.
    pub fn attach_payment(&mut self, payment: PaymentId, status: PaymentStatus) {
        self.payment = Some(payment);
        self.payment_status = Some(status);
    }

    /// Records the delivery moment.
    pub fn mark_delivered(&mut self, at: Timestamp) {
        self.delivered_at = Some(at);
    }

    /// Records why the order was cancelled.
    pub fn record_cancellation_reason(&mut self, reason: impl Into<String>) {
        self.cancellation_reason = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals() -> OrderTotals {
        OrderTotals::new(
            Money::new(10_000, "INR").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(11_000, "INR").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn placed_order_starts_unassigned_and_unpaid() {
        let order = Order::place(CustomerId::new(), VendorId::new(), totals(), Timestamp::now());

        assert_eq!(order.status, OrderStatus::Placed);
        assert!(order.driver.is_none());
        assert!(order.payment.is_none());
        assert!(order.payment_status.is_none());
        assert_eq!(order.version, 1);
    }

    #[test]
    fn totals_must_sum() {
        let result = OrderTotals::new(
            Money::new(10_000, "INR").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(12_000, "INR").unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn totals_reject_mixed_currencies() {
        let result = OrderTotals::new(
            Money::new(10_000, "INR").unwrap(),
            Money::new(500, "USD").unwrap(),
            Money::new(500, "INR").unwrap(),
            Money::new(11_000, "INR").unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn attach_payment_links_both_fields() {
        let mut order =
            Order::place(CustomerId::new(), VendorId::new(), totals(), Timestamp::now());
        let payment_id = PaymentId::new();

        order.attach_payment(payment_id, PaymentStatus::Pending);

        assert_eq!(order.payment, Some(payment_id));
        assert_eq!(order.payment_status, Some(PaymentStatus::Pending));
    }
}
