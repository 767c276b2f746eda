//! PostgreSQL implementations of WebhookStore and DlqStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::webhook::{DeliveryOutcome, WebhookDelivery, WebhookDlqEntry};
use crate::ports::{DlqStore, SaveResult, WebhookStore};

/// PostgreSQL implementation of the WebhookStore port.
///
/// The PRIMARY KEY on `provider_event_id` plus `ON CONFLICT DO NOTHING`
/// is what settles concurrent double-delivery: exactly one insert wins.
pub struct PostgresWebhookStore {
    pool: PgPool,
}

impl PostgresWebhookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a webhook delivery.
#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    provider_event_id: String,
    event_type: String,
    payload: serde_json::Value,
    processed: bool,
    attempts: i32,
    max_attempts: i32,
    last_error: Option<String>,
    next_retry_at: Option<DateTime<Utc>>,
    received_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    outcome: Option<String>,
}

impl TryFrom<DeliveryRow> for WebhookDelivery {
    type Error = DomainError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        let outcome = row
            .outcome
            .as_deref()
            .map(|s| {
                DeliveryOutcome::parse(s).ok_or_else(|| {
                    DomainError::database(format!("invalid delivery outcome '{}'", s))
                })
            })
            .transpose()?;

        Ok(WebhookDelivery {
            provider_event_id: row.provider_event_id,
            event_type: row.event_type,
            payload: row.payload,
            processed: row.processed,
            attempts: row.attempts as u32,
            max_attempts: row.max_attempts as u32,
            last_error: row.last_error,
            next_retry_at: row.next_retry_at.map(Timestamp::from_datetime),
            received_at: Timestamp::from_datetime(row.received_at),
            processed_at: row.processed_at.map(Timestamp::from_datetime),
            outcome,
        })
    }
}

const SELECT_DELIVERY: &str = r#"
    SELECT provider_event_id, event_type, payload, processed, attempts, max_attempts,
           last_error, next_retry_at, received_at, processed_at, outcome
    FROM webhook_deliveries
"#;

#[async_trait]
impl WebhookStore for PostgresWebhookStore {
    async fn find_by_provider_event_id(
        &self,
        provider_event_id: &str,
    ) -> Result<Option<WebhookDelivery>, DomainError> {
        let row: Option<DeliveryRow> =
            sqlx::query_as(&format!("{} WHERE provider_event_id = $1", SELECT_DELIVERY))
                .bind(provider_event_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("failed to find webhook delivery: {}", e))
                })?;

        row.map(WebhookDelivery::try_from).transpose()
    }

    async fn insert_new(&self, delivery: &WebhookDelivery) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_deliveries (
                provider_event_id, event_type, payload, processed, attempts,
                max_attempts, last_error, next_retry_at, received_at, processed_at, outcome
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (provider_event_id) DO NOTHING
            "#,
        )
        .bind(&delivery.provider_event_id)
        .bind(&delivery.event_type)
        .bind(&delivery.payload)
        .bind(delivery.processed)
        .bind(delivery.attempts as i32)
        .bind(delivery.max_attempts as i32)
        .bind(&delivery.last_error)
        .bind(delivery.next_retry_at.as_ref().map(|t| *t.as_datetime()))
        .bind(delivery.received_at.as_datetime())
        .bind(delivery.processed_at.as_ref().map(|t| *t.as_datetime()))
        .bind(delivery.outcome.map(|o| o.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to insert webhook delivery: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn due_for_retry(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<WebhookDelivery>, DomainError> {
        let rows: Vec<DeliveryRow> = sqlx::query_as(&format!(
            "{} WHERE processed = FALSE AND next_retry_at <= $1 ORDER BY next_retry_at LIMIT $2",
            SELECT_DELIVERY
        ))
        .bind(now.as_datetime())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to fetch due deliveries: {}", e)))?;

        rows.into_iter().map(WebhookDelivery::try_from).collect()
    }

    async fn mark_processed(
        &self,
        provider_event_id: &str,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_deliveries SET
                processed = TRUE,
                processed_at = $2,
                outcome = $3,
                next_retry_at = NULL
            WHERE provider_event_id = $1
            "#,
        )
        .bind(provider_event_id)
        .bind(at.as_datetime())
        .bind(DeliveryOutcome::Succeeded.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to mark delivery processed: {}", e)))?;

        ensure_found(result.rows_affected(), provider_event_id)
    }

    async fn mark_exhausted(
        &self,
        provider_event_id: &str,
        at: Timestamp,
        error: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_deliveries SET
                processed = TRUE,
                processed_at = $2,
                outcome = $3,
                last_error = $4,
                attempts = max_attempts,
                next_retry_at = NULL
            WHERE provider_event_id = $1
            "#,
        )
        .bind(provider_event_id)
        .bind(at.as_datetime())
        .bind(DeliveryOutcome::Exhausted.as_str())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to mark delivery exhausted: {}", e)))?;

        ensure_found(result.rows_affected(), provider_event_id)
    }

    async fn record_failure(
        &self,
        provider_event_id: &str,
        attempts: u32,
        error: &str,
        next_retry_at: Timestamp,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_deliveries SET
                attempts = $2,
                last_error = $3,
                next_retry_at = $4
            WHERE provider_event_id = $1
            "#,
        )
        .bind(provider_event_id)
        .bind(attempts as i32)
        .bind(error)
        .bind(next_retry_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to record delivery failure: {}", e)))?;

        ensure_found(result.rows_affected(), provider_event_id)
    }

    async fn unprocessed_count(&self) -> Result<u64, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM webhook_deliveries WHERE processed = FALSE")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("failed to count unprocessed deliveries: {}", e))
                })?;
        Ok(count as u64)
    }
}

fn ensure_found(rows_affected: u64, provider_event_id: &str) -> Result<(), DomainError> {
    if rows_affected == 0 {
        return Err(DomainError::new(
            ErrorCode::WebhookEventNotFound,
            format!("webhook delivery {} not found", provider_event_id),
        ));
    }
    Ok(())
}

/// PostgreSQL implementation of the DlqStore port.
pub struct PostgresDlqStore {
    pool: PgPool,
}

impl PostgresDlqStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DlqStore for PostgresDlqStore {
    async fn append(&self, entry: &WebhookDlqEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_dlq (
                id, provider_event_id, event_type, payload, error_message, attempts, moved_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.provider_event_id)
        .bind(&entry.event_type)
        .bind(&entry.payload)
        .bind(&entry.error_message)
        .bind(entry.attempts as i32)
        .bind(entry.moved_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to append dlq entry: {}", e)))?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webhook_dlq")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("failed to count dlq entries: {}", e)))?;
        Ok(count as u64)
    }
}
