//! In-memory event bus.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

/// Collects published envelopes for inspection in tests.
#[derive(Default)]
pub struct InMemoryEventBus {
    published: Mutex<Vec<EventEnvelope>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events published so far.
    pub fn event_count(&self) -> usize {
        self.published.lock().expect("bus lock poisoned").len()
    }

    /// Snapshot of everything published so far.
    pub fn events(&self) -> Vec<EventEnvelope> {
        self.published.lock().expect("bus lock poisoned").clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, envelope: EventEnvelope) -> Result<(), DomainError> {
        self.published
            .lock()
            .expect("bus lock poisoned")
            .push(envelope);
        Ok(())
    }
}
