//! In-memory OrderRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::order::Order;
use crate::ports::OrderRepository;

/// HashMap-backed order store with the same compare-and-swap contract
/// as the PostgreSQL adapter.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(DomainError::conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(&order.id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, format!("order {} not found", order.id))
        })?;

        if stored.version != order.version {
            return Err(DomainError::conflict(format!(
                "order {} version moved from {} to {}",
                order.id, order.version, stored.version
            )));
        }

        let mut updated = order.clone();
        updated.version += 1;
        *stored = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CustomerId, Money, Timestamp, VendorId};
    use crate::domain::order::{OrderStatus, OrderTotals};

    fn order() -> Order {
        let totals = OrderTotals::new(
            Money::new(1_000, "INR").unwrap(),
            Money::new(0, "INR").unwrap(),
            Money::new(0, "INR").unwrap(),
            Money::new(1_000, "INR").unwrap(),
        )
        .unwrap();
        Order::place(CustomerId::new(), VendorId::new(), totals, Timestamp::now())
    }

    #[tokio::test]
    async fn insert_then_find_round_trips() {
        let repo = InMemoryOrderRepository::new();
        let order = order();

        repo.insert(&order).await.unwrap();

        let found = repo.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(found, order);
    }

    #[tokio::test]
    async fn update_bumps_stored_version() {
        let repo = InMemoryOrderRepository::new();
        let mut order = order();
        repo.insert(&order).await.unwrap();

        order.status = OrderStatus::Accepted;
        repo.update(&order).await.unwrap();

        let stored = repo.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Accepted);
        assert_eq!(stored.version, order.version + 1);
    }

    #[tokio::test]
    async fn stale_version_conflicts() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        repo.insert(&order).await.unwrap();

        // Two readers race: both load version 1.
        let mut first = repo.find_by_id(order.id).await.unwrap().unwrap();
        let mut second = repo.find_by_id(order.id).await.unwrap().unwrap();

        first.status = OrderStatus::Accepted;
        repo.update(&first).await.unwrap();

        second.status = OrderStatus::Cancelled;
        let result = repo.update(&second).await;
        assert!(matches!(result, Err(err) if err.code == ErrorCode::Conflict));
    }

    #[tokio::test]
    async fn updating_unknown_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        let result = repo.update(&order()).await;
        assert!(matches!(result, Err(err) if err.code == ErrorCode::OrderNotFound));
    }
}
