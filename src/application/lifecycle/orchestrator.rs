//! OrderLifecycleOrchestrator - the transactional core of order state.
//!
//! Every status change funnels through `transition`: the state machine
//! validates the edge, the repository commits it under an optimistic
//! version check, and exactly one timeline row plus one realtime update
//! follow. Status-specific side effects (driver assignment, capture,
//! refund, release) run after the commit; gateway failures are logged
//! and never roll the committed transition back, because the webhook
//! pipeline reconciles payment state eventually.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::domain::foundation::{
    Actor, ActorRole, DomainError, DriverId, ErrorCode, OrderId, VendorId,
};
use crate::domain::order::{
    validate_transition, Order, OrderStatus, OrderUpdated, TimelineEntry, TransitionError,
};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{
    Clock, DriverDirectory, EventPublisher, GatewayError, OrderRepository, PaymentGateway,
    PaymentRepository, TimelineStore,
};

/// Failures surfaced by lifecycle operations.
///
/// Transition rejections pass through untouched so callers can map the
/// three kinds (terminal, structural, role) to precise responses.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("actor does not own the order's {0}")]
    OwnershipMismatch(&'static str),

    #[error("order was modified concurrently, retry the request")]
    Conflict,

    #[error(transparent)]
    Storage(DomainError),
}

impl From<DomainError> for LifecycleError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Conflict => LifecycleError::Conflict,
            _ => LifecycleError::Storage(err),
        }
    }
}

/// Orchestrates order status transitions and their side effects.
pub struct OrderLifecycleOrchestrator {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    timeline: Arc<dyn TimelineStore>,
    publisher: Arc<dyn EventPublisher>,
    drivers: Arc<dyn DriverDirectory>,
    clock: Arc<dyn Clock>,
    gateway_timeout: Duration,
}

impl OrderLifecycleOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        timeline: Arc<dyn TimelineStore>,
        publisher: Arc<dyn EventPublisher>,
        drivers: Arc<dyn DriverDirectory>,
        clock: Arc<dyn Clock>,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            orders,
            payments,
            gateway,
            timeline,
            publisher,
            drivers,
            clock,
            gateway_timeout,
        }
    }

    /// Transitions an order to a target status on behalf of an actor.
    ///
    /// Returns the order as committed, including the side effects that
    /// completed synchronously.
    pub async fn transition(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        actor: &Actor,
    ) -> Result<Order, LifecycleError> {
        self.transition_with_reason(order_id, target, actor, None).await
    }

    /// `transition`, carrying a cancellation reason.
    pub async fn transition_with_reason(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        actor: &Actor,
        reason: Option<&str>,
    ) -> Result<Order, LifecycleError> {
        let mut order = self.load(order_id).await?;
        self.commit(&mut order, target, actor.role, actor, reason).await?;
        self.apply_side_effects(&mut order).await;
        Ok(order)
    }

    /// Vendor accepts a placed order. The vendor must own the order.
    pub async fn vendor_accept(
        &self,
        order_id: OrderId,
        vendor: VendorId,
        actor: &Actor,
    ) -> Result<Order, LifecycleError> {
        let mut order = self.load(order_id).await?;
        if order.vendor != vendor {
            return Err(LifecycleError::OwnershipMismatch("vendor"));
        }
        self.commit(&mut order, OrderStatus::Accepted, actor.role, actor, None)
            .await?;
        self.apply_side_effects(&mut order).await;
        Ok(order)
    }

    /// Vendor rejects a placed order, cancelling it with a reason.
    pub async fn vendor_reject(
        &self,
        order_id: OrderId,
        vendor: VendorId,
        actor: &Actor,
        reason: &str,
    ) -> Result<Order, LifecycleError> {
        let mut order = self.load(order_id).await?;
        if order.vendor != vendor {
            return Err(LifecycleError::OwnershipMismatch("vendor"));
        }
        self.commit(
            &mut order,
            OrderStatus::Cancelled,
            actor.role,
            actor,
            Some(reason),
        )
        .await?;
        self.apply_side_effects(&mut order).await;
        Ok(order)
    }

    /// Assigns a driver to a ready order.
    ///
    /// A driver may accept for themself; an admin or vendor may assign a
    /// third party. The structural table still governs the edge: only a
    /// `Ready` order can become `Assigned`.
    pub async fn assign_driver(
        &self,
        order_id: OrderId,
        driver: DriverId,
        actor: &Actor,
    ) -> Result<Order, LifecycleError> {
        match actor.role {
            ActorRole::Driver => {
                if actor.id.as_str() != driver.to_string() {
                    return Err(LifecycleError::OwnershipMismatch("driver"));
                }
            }
            ActorRole::Admin | ActorRole::Vendor | ActorRole::System => {}
            ActorRole::Customer => {
                return Err(LifecycleError::OwnershipMismatch("driver"));
            }
        }

        let mut order = self.load(order_id).await?;
        order.driver = Some(driver);
        // Assignment authority was checked above; the edge itself is
        // driven as the system so the role table stays minimal.
        self.commit(&mut order, OrderStatus::Assigned, ActorRole::System, actor, None)
            .await?;
        Ok(order)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, LifecycleError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(LifecycleError::OrderNotFound(order_id))
    }

    /// Validates and commits one transition, then writes the audit row
    /// and publishes the realtime update.
    async fn commit(
        &self,
        order: &mut Order,
        target: OrderStatus,
        acting_role: ActorRole,
        recorded_actor: &Actor,
        reason: Option<&str>,
    ) -> Result<(), LifecycleError> {
        let from = order.status;
        validate_transition(from, target, acting_role)?;

        let now = self.clock.now();
        order.status = target;
        match target {
            OrderStatus::Delivered => order.mark_delivered(now),
            OrderStatus::Cancelled => {
                if let Some(reason) = reason {
                    order.record_cancellation_reason(reason);
                }
            }
            _ => {}
        }

        self.orders.update(order).await?;
        order.version += 1;

        info!(
            order_id = %order.id,
            from = %from,
            to = %target,
            actor = %recorded_actor.id,
            role = %recorded_actor.role,
            "order transitioned"
        );

        let mut entry =
            TimelineEntry::status_change(order.id, recorded_actor, from, target, now);
        if let Some(reason) = reason {
            entry = entry.with_metadata("reason", reason);
        }
        // The status is already committed; an audit or publish failure
        // must not undo it.
        if let Err(err) = self.timeline.append(&entry).await {
            error!(order_id = %order.id, error = %err, "failed to append timeline entry");
        }
        let event = OrderUpdated::new(order.id, from, target);
        if let Err(err) = self.publisher.publish(event.to_envelope()).await {
            warn!(order_id = %order.id, error = %err, "failed to publish order update");
        }

        Ok(())
    }

    /// Status-specific side effects, run after the commit.
    async fn apply_side_effects(&self, order: &mut Order) {
        match order.status {
            OrderStatus::Ready => self.try_assign_driver(order).await,
            OrderStatus::Delivered => self.capture_payment(order).await,
            OrderStatus::Cancelled => self.settle_cancelled_payment(order).await,
            _ => {}
        }
    }

    /// Best-effort nearest-driver assignment for a ready order.
    ///
    /// No available driver is a normal condition: the order stays
    /// `Ready` and a later assignment request picks it up.
    async fn try_assign_driver(&self, order: &mut Order) {
        let driver = match self.drivers.nearest_available(order.vendor).await {
            Ok(Some(driver)) => driver,
            Ok(None) => {
                debug!(order_id = %order.id, "no driver available, order stays ready");
                return;
            }
            Err(err) => {
                warn!(order_id = %order.id, error = %err, "driver lookup failed");
                return;
            }
        };

        order.driver = Some(driver);
        let system = Actor::system();
        if let Err(err) = self
            .commit(order, OrderStatus::Assigned, ActorRole::System, &system, None)
            .await
        {
            // Roll back the in-memory driver ref; the stored order was
            // not modified.
            order.driver = None;
            warn!(order_id = %order.id, error = %err, "auto-assignment failed");
        }
    }

    /// Captures an authorized payment after delivery.
    async fn capture_payment(&self, order: &mut Order) {
        let mut payment = match self.payment_for(order).await {
            Some(payment) => payment,
            None => return,
        };

        if payment.status != PaymentStatus::Authorized {
            debug!(
                order_id = %order.id,
                status = %payment.status,
                "no capture needed"
            );
            return;
        }

        let result = self
            .call_gateway(self.gateway.capture(&payment.provider_payment_id, &payment.amount))
            .await;
        if let Err(err) = result {
            // The transition stays committed; the provider webhook will
            // reconcile the payment state.
            warn!(
                order_id = %order.id,
                provider_payment_id = %payment.provider_payment_id,
                error = %err,
                "capture failed, leaving reconciliation to the webhook pipeline"
            );
            return;
        }

        let now = self.clock.now();
        if payment.capture(now).is_ok() {
            self.persist_payment_status(order, &payment).await;
        }
    }

    /// Refunds or releases the payment of a cancelled order.
    async fn settle_cancelled_payment(&self, order: &mut Order) {
        let mut payment = match self.payment_for(order).await {
            Some(payment) => payment,
            None => return,
        };

        match payment.status {
            PaymentStatus::Captured => {
                let result = self
                    .call_gateway(
                        self.gateway.refund(&payment.provider_payment_id, &payment.amount),
                    )
                    .await;
                if let Err(err) = result {
                    warn!(
                        order_id = %order.id,
                        error = %err,
                        "refund failed, leaving reconciliation to the webhook pipeline"
                    );
                    return;
                }
                let now = self.clock.now();
                if payment.refund(now).is_ok() {
                    self.persist_payment_status(order, &payment).await;
                }
            }
            PaymentStatus::Authorized => {
                // Releasing a hold does not change our local status; the
                // provider reports the outcome through a webhook.
                if let Err(err) = self
                    .call_gateway(self.gateway.release(&payment.provider_payment_id))
                    .await
                {
                    warn!(order_id = %order.id, error = %err, "authorization release failed");
                }
            }
            _ => {
                debug!(
                    order_id = %order.id,
                    status = %payment.status,
                    "no payment settlement needed on cancellation"
                );
            }
        }
    }

    async fn payment_for(&self, order: &Order) -> Option<Payment> {
        match self.payments.find_by_order(order.id).await {
            Ok(payment) => payment,
            Err(err) => {
                warn!(order_id = %order.id, error = %err, "payment lookup failed");
                None
            }
        }
    }

    /// Persists a payment mutation and mirrors it onto the order.
    async fn persist_payment_status(&self, order: &mut Order, payment: &Payment) {
        if let Err(err) = self.payments.update(payment).await {
            warn!(payment_id = %payment.id, error = %err, "failed to persist payment");
            return;
        }
        order.payment_status = Some(payment.status);
        match self.orders.update(order).await {
            Ok(()) => order.version += 1,
            Err(err) => {
                warn!(
                    order_id = %order.id,
                    error = %err,
                    "failed to mirror payment status onto order"
                );
            }
        }
    }

    /// Wraps a gateway call in the configured timeout.
    async fn call_gateway<F>(&self, fut: F) -> Result<(), GatewayError>
    where
        F: std::future::Future<Output = Result<(), GatewayError>>,
    {
        match timeout(self.gateway_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::network("gateway call timed out")),
        }
    }
}
