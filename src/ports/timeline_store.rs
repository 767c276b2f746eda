//! TimelineStore port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::order::TimelineEntry;

/// Port for the append-only order audit timeline.
///
/// Entries are never mutated or deleted; admin reporting reads them in
/// occurrence order.
#[async_trait]
pub trait TimelineStore: Send + Sync {
    /// Appends one audit row.
    async fn append(&self, entry: &TimelineEntry) -> Result<(), DomainError>;

    /// Lists all rows for an order, oldest first.
    async fn for_order(&self, order_id: OrderId) -> Result<Vec<TimelineEntry>, DomainError>;
}
