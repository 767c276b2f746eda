//! In-memory WebhookStore and DlqStore.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::webhook::{DeliveryOutcome, WebhookDelivery, WebhookDlqEntry};
use crate::ports::{DlqStore, SaveResult, WebhookStore};

/// HashMap-backed delivery store keyed by provider event id.
#[derive(Default)]
pub struct InMemoryWebhookStore {
    deliveries: RwLock<HashMap<String, WebhookDelivery>>,
}

impl InMemoryWebhookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored deliveries, for test assertions.
    pub async fn total_count(&self) -> usize {
        self.deliveries.read().await.len()
    }

    /// All stored deliveries, for test assertions.
    pub async fn all(&self) -> Vec<WebhookDelivery> {
        self.deliveries.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl WebhookStore for InMemoryWebhookStore {
    async fn find_by_provider_event_id(
        &self,
        provider_event_id: &str,
    ) -> Result<Option<WebhookDelivery>, DomainError> {
        let deliveries = self.deliveries.read().await;
        Ok(deliveries.get(provider_event_id).cloned())
    }

    async fn insert_new(&self, delivery: &WebhookDelivery) -> Result<SaveResult, DomainError> {
        let mut deliveries = self.deliveries.write().await;
        if deliveries.contains_key(&delivery.provider_event_id) {
            Ok(SaveResult::AlreadyExists)
        } else {
            deliveries.insert(delivery.provider_event_id.clone(), delivery.clone());
            Ok(SaveResult::Inserted)
        }
    }

    async fn due_for_retry(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<WebhookDelivery>, DomainError> {
        let deliveries = self.deliveries.read().await;
        let mut due: Vec<WebhookDelivery> = deliveries
            .values()
            .filter(|d| {
                !d.processed
                    && d.next_retry_at
                        .map(|at| !at.is_after(&now))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        due.sort_by_key(|d| d.next_retry_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn mark_processed(
        &self,
        provider_event_id: &str,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut deliveries = self.deliveries.write().await;
        let delivery = get_mut(&mut deliveries, provider_event_id)?;
        delivery.processed = true;
        delivery.processed_at = Some(at);
        delivery.outcome = Some(DeliveryOutcome::Succeeded);
        delivery.next_retry_at = None;
        Ok(())
    }

    async fn mark_exhausted(
        &self,
        provider_event_id: &str,
        at: Timestamp,
        error: &str,
    ) -> Result<(), DomainError> {
        let mut deliveries = self.deliveries.write().await;
        let delivery = get_mut(&mut deliveries, provider_event_id)?;
        delivery.processed = true;
        delivery.processed_at = Some(at);
        delivery.outcome = Some(DeliveryOutcome::Exhausted);
        delivery.last_error = Some(error.to_string());
        delivery.attempts = delivery.max_attempts;
        delivery.next_retry_at = None;
        Ok(())
    }

    async fn record_failure(
        &self,
        provider_event_id: &str,
        attempts: u32,
        error: &str,
        next_retry_at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut deliveries = self.deliveries.write().await;
        let delivery = get_mut(&mut deliveries, provider_event_id)?;
        delivery.attempts = attempts;
        delivery.last_error = Some(error.to_string());
        delivery.next_retry_at = Some(next_retry_at);
        Ok(())
    }

    async fn unprocessed_count(&self) -> Result<u64, DomainError> {
        let deliveries = self.deliveries.read().await;
        Ok(deliveries.values().filter(|d| !d.processed).count() as u64)
    }
}

fn get_mut<'a>(
    deliveries: &'a mut HashMap<String, WebhookDelivery>,
    provider_event_id: &str,
) -> Result<&'a mut WebhookDelivery, DomainError> {
    deliveries.get_mut(provider_event_id).ok_or_else(|| {
        DomainError::new(
            ErrorCode::WebhookEventNotFound,
            format!("webhook delivery {} not found", provider_event_id),
        )
    })
}

/// Vec-backed dead-letter store.
#[derive(Default)]
pub struct InMemoryDlqStore {
    entries: RwLock<Vec<WebhookDlqEntry>>,
}

impl InMemoryDlqStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, for test assertions.
    pub async fn all(&self) -> Vec<WebhookDlqEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl DlqStore for InMemoryDlqStore {
    async fn append(&self, entry: &WebhookDlqEntry) -> Result<(), DomainError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.entries.read().await.len() as u64)
    }
}
