//! In-memory TimelineStore.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::order::TimelineEntry;
use crate::ports::TimelineStore;

/// Vec-backed append-only timeline.
#[derive(Default)]
pub struct InMemoryTimelineStore {
    entries: RwLock<Vec<TimelineEntry>>,
}

impl InMemoryTimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total appended rows, for test assertions.
    pub async fn total_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl TimelineStore for InMemoryTimelineStore {
    async fn append(&self, entry: &TimelineEntry) -> Result<(), DomainError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn for_order(&self, order_id: OrderId) -> Result<Vec<TimelineEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Actor, Timestamp};
    use crate::domain::order::OrderStatus;

    #[tokio::test]
    async fn for_order_filters_by_order() {
        let store = InMemoryTimelineStore::new();
        let order_a = OrderId::new();
        let order_b = OrderId::new();
        let actor = Actor::system();

        store
            .append(&TimelineEntry::status_change(
                order_a,
                &actor,
                OrderStatus::Placed,
                OrderStatus::Accepted,
                Timestamp::now(),
            ))
            .await
            .unwrap();
        store
            .append(&TimelineEntry::status_change(
                order_b,
                &actor,
                OrderStatus::Placed,
                OrderStatus::Cancelled,
                Timestamp::now(),
            ))
            .await
            .unwrap();

        let rows = store.for_order(order_a).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].new_status, OrderStatus::Accepted);
    }
}
