//! EventPublisher port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing realtime update events.
///
/// Delivery to subscribers is best-effort; the audit timeline, not the
/// realtime stream, is the durable record.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a single event envelope.
    async fn publish(&self, envelope: EventEnvelope) -> Result<(), DomainError>;
}
