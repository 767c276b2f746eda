//! PostgreSQL implementation of IdempotencyStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{IdempotencyRecord, IdempotencyScope, IdempotencyStore, SaveResult};

/// PostgreSQL implementation of the IdempotencyStore port.
///
/// The PRIMARY KEY on `(client_key, principal, endpoint)` settles
/// concurrent same-key requests. `put_if_absent` runs as a transaction
/// that first clears an expired row under the scope, so a stale record
/// never blocks a fresh request after its TTL.
pub struct PostgresIdempotencyStore {
    pool: PgPool,
}

impl PostgresIdempotencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an idempotency record.
#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    client_key: String,
    principal: String,
    endpoint: String,
    request_hash: String,
    response_status: i16,
    response_body: serde_json::Value,
    used: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<RecordRow> for IdempotencyRecord {
    fn from(row: RecordRow) -> Self {
        IdempotencyRecord {
            scope: IdempotencyScope::new(row.client_key, row.principal, row.endpoint),
            request_hash: row.request_hash,
            response_status: row.response_status as u16,
            response_body: row.response_body,
            used: row.used,
            expires_at: Timestamp::from_datetime(row.expires_at),
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl IdempotencyStore for PostgresIdempotencyStore {
    async fn find(
        &self,
        scope: &IdempotencyScope,
    ) -> Result<Option<IdempotencyRecord>, DomainError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT client_key, principal, endpoint, request_hash, response_status,
                   response_body, used, expires_at, created_at
            FROM idempotency_records
            WHERE client_key = $1 AND principal = $2 AND endpoint = $3
            "#,
        )
        .bind(&scope.key)
        .bind(&scope.principal)
        .bind(&scope.endpoint)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to find idempotency record: {}", e)))?;

        Ok(row.map(IdempotencyRecord::from))
    }

    async fn put_if_absent(&self, record: IdempotencyRecord) -> Result<SaveResult, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("failed to begin transaction: {}", e)))?;

        // An expired row under the same scope counts as absent.
        sqlx::query(
            r#"
            DELETE FROM idempotency_records
            WHERE client_key = $1 AND principal = $2 AND endpoint = $3 AND expires_at <= $4
            "#,
        )
        .bind(&record.scope.key)
        .bind(&record.scope.principal)
        .bind(&record.scope.endpoint)
        .bind(record.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("failed to clear expired record: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO idempotency_records (
                client_key, principal, endpoint, request_hash, response_status,
                response_body, used, expires_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (client_key, principal, endpoint) DO NOTHING
            "#,
        )
        .bind(&record.scope.key)
        .bind(&record.scope.principal)
        .bind(&record.scope.endpoint)
        .bind(&record.request_hash)
        .bind(record.response_status as i16)
        .bind(&record.response_body)
        .bind(record.used)
        .bind(record.expires_at.as_datetime())
        .bind(record.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("failed to insert idempotency record: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("failed to commit transaction: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM idempotency_records WHERE expires_at <= $1")
            .bind(now.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("failed to sweep idempotency records: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}
