//! IdempotencyStore port.
//!
//! Backs the request-level idempotency cache. Two concurrent requests
//! carrying the same key must resolve to one winner; that race is
//! settled by a storage uniqueness constraint on the scope triple, not
//! by an application-level check-then-insert.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::SaveResult;
use crate::domain::foundation::{DomainError, Timestamp};

/// The triple a cached response is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyScope {
    /// Client-supplied idempotency key.
    pub key: String,

    /// Authenticated principal the key belongs to.
    pub principal: String,

    /// Logical endpoint name, e.g. "orders.create".
    pub endpoint: String,
}

impl IdempotencyScope {
    pub fn new(
        key: impl Into<String>,
        principal: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            principal: principal.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// A cached 2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub scope: IdempotencyScope,

    /// SHA-256 hex of the original request body; detects a key being
    /// reused for a different payload.
    pub request_hash: String,

    pub response_status: u16,
    pub response_body: JsonValue,

    /// True once the record holds a completed response.
    pub used: bool,

    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// Port for storing and replaying idempotency records.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Finds the record for a scope, expired or not.
    async fn find(&self, scope: &IdempotencyScope)
        -> Result<Option<IdempotencyRecord>, DomainError>;

    /// Inserts a record unless a live one already exists for the scope.
    ///
    /// An expired record under the same scope counts as absent and is
    /// replaced. Returns `AlreadyExists` when a live record won the
    /// race; the caller then replays the winner.
    async fn put_if_absent(&self, record: IdempotencyRecord) -> Result<SaveResult, DomainError>;

    /// Deletes expired records, returning how many were removed.
    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, DomainError>;
}
