//! WebhookStore and DlqStore ports.
//!
//! The provider may deliver the same event many times: network
//! timeouts, 5xx responses from our endpoint, acknowledgements the
//! provider never received. Dedup therefore lives in storage, not in
//! application code: `insert_new` relies on a uniqueness constraint on
//! `provider_event_id`, and concurrent inserts resolve to exactly one
//! `Inserted` with every loser seeing `AlreadyExists`.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhook::{WebhookDelivery, WebhookDlqEntry};

/// Result of attempting a uniqueness-guarded insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Row was inserted (first time seeing this key).
    Inserted,
    /// Row already exists (duplicate key).
    AlreadyExists,
}

/// Port for storing webhook deliveries.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    /// Finds a delivery by the provider's event id.
    async fn find_by_provider_event_id(
        &self,
        provider_event_id: &str,
    ) -> Result<Option<WebhookDelivery>, DomainError>;

    /// Inserts a new delivery, with `ON CONFLICT DO NOTHING` semantics
    /// on `provider_event_id`.
    async fn insert_new(&self, delivery: &WebhookDelivery) -> Result<SaveResult, DomainError>;

    /// Fetches unprocessed deliveries whose retry time has come.
    async fn due_for_retry(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<WebhookDelivery>, DomainError>;

    /// Marks a delivery terminally processed by success.
    async fn mark_processed(
        &self,
        provider_event_id: &str,
        at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Marks a delivery terminally processed by retry exhaustion,
    /// keeping the final error for the audit trail.
    async fn mark_exhausted(
        &self,
        provider_event_id: &str,
        at: Timestamp,
        error: &str,
    ) -> Result<(), DomainError>;

    /// Records a failed attempt and schedules the next retry.
    async fn record_failure(
        &self,
        provider_event_id: &str,
        attempts: u32,
        error: &str,
        next_retry_at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Number of deliveries still awaiting processing.
    async fn unprocessed_count(&self) -> Result<u64, DomainError>;
}

/// Port for the dead-letter store.
///
/// Append-only; entries are read back by operators, never replayed
/// automatically. Health summaries consume the count.
#[async_trait]
pub trait DlqStore: Send + Sync {
    /// Appends a dead-letter snapshot.
    async fn append(&self, entry: &WebhookDlqEntry) -> Result<(), DomainError>;

    /// Total dead-lettered events.
    async fn count(&self) -> Result<u64, DomainError>;
}
