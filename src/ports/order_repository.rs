//! OrderRepository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::order::Order;

/// Port for persisting and loading order aggregates.
///
/// `update` is a compare-and-swap on the aggregate's `version` field:
/// the write only lands if the stored version still matches
/// `order.version`, and the stored version is incremented as part of the
/// same statement. Losing the race yields `ErrorCode::Conflict`, which
/// is how two concurrent transitions on one order resolve to a single
/// winner. Callers bump their in-memory `version` after a successful
/// update.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order by id.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError>;

    /// Inserts a freshly placed order.
    async fn insert(&self, order: &Order) -> Result<(), DomainError>;

    /// Updates an order if its version is unchanged.
    ///
    /// Returns `ErrorCode::Conflict` when the version moved underneath
    /// the caller, and `ErrorCode::OrderNotFound` for unknown ids.
    async fn update(&self, order: &Order) -> Result<(), DomainError>;
}
