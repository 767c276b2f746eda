//! In-memory IdempotencyStore.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{IdempotencyRecord, IdempotencyScope, IdempotencyStore, SaveResult};

/// HashMap-backed idempotency store keyed by the scope triple.
///
/// `put_if_absent` treats an expired record as absent, matching the
/// delete-then-insert transaction the PostgreSQL adapter runs.
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    records: RwLock<HashMap<IdempotencyScope, IdempotencyRecord>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, for test assertions.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn find(
        &self,
        scope: &IdempotencyScope,
    ) -> Result<Option<IdempotencyRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(scope).cloned())
    }

    async fn put_if_absent(&self, record: IdempotencyRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&record.scope) {
            if existing.expires_at.is_after(&record.created_at) {
                return Ok(SaveResult::AlreadyExists);
            }
        }
        records.insert(record.scope.clone(), record);
        Ok(SaveResult::Inserted)
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.expires_at.is_after(&now));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str, now: Timestamp, ttl_secs: u64) -> IdempotencyRecord {
        IdempotencyRecord {
            scope: IdempotencyScope::new(key, "principal-1", "orders.create"),
            request_hash: "abc".to_string(),
            response_status: 201,
            response_body: json!({"ok": true}),
            used: true,
            expires_at: now.plus_secs(ttl_secs),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn put_if_absent_rejects_live_duplicate() {
        let store = InMemoryIdempotencyStore::new();
        let now = Timestamp::from_unix_secs(1_700_000_000);

        assert_eq!(
            store.put_if_absent(record("k", now, 3_600)).await.unwrap(),
            SaveResult::Inserted
        );
        assert_eq!(
            store.put_if_absent(record("k", now, 3_600)).await.unwrap(),
            SaveResult::AlreadyExists
        );
    }

    #[tokio::test]
    async fn put_if_absent_replaces_expired_record() {
        let store = InMemoryIdempotencyStore::new();
        let t0 = Timestamp::from_unix_secs(1_700_000_000);

        store.put_if_absent(record("k", t0, 60)).await.unwrap();

        // A day later the original has expired.
        let t1 = t0.plus_hours(24);
        assert_eq!(
            store.put_if_absent(record("k", t1, 60)).await.unwrap(),
            SaveResult::Inserted
        );
    }

    #[tokio::test]
    async fn scopes_differ_by_principal_and_endpoint() {
        let store = InMemoryIdempotencyStore::new();
        let now = Timestamp::from_unix_secs(1_700_000_000);

        let mut a = record("k", now, 3_600);
        a.scope = IdempotencyScope::new("k", "principal-1", "orders.create");
        let mut b = record("k", now, 3_600);
        b.scope = IdempotencyScope::new("k", "principal-2", "orders.create");
        let mut c = record("k", now, 3_600);
        c.scope = IdempotencyScope::new("k", "principal-1", "payments.create_intent");

        assert_eq!(store.put_if_absent(a).await.unwrap(), SaveResult::Inserted);
        assert_eq!(store.put_if_absent(b).await.unwrap(), SaveResult::Inserted);
        assert_eq!(store.put_if_absent(c).await.unwrap(), SaveResult::Inserted);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn sweep_removes_expired_only() {
        let store = InMemoryIdempotencyStore::new();
        let now = Timestamp::from_unix_secs(1_700_000_000);

        store.put_if_absent(record("old", now, 60)).await.unwrap();
        store.put_if_absent(record("new", now, 86_400)).await.unwrap();

        let removed = store.sweep_expired(now.plus_secs(120)).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }
}
