//! PostgreSQL implementation of TimelineStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{ActorId, ActorRole, DomainError, EntryId, OrderId, Timestamp};
use crate::domain::order::{OrderStatus, TimelineEntry};
use crate::ports::TimelineStore;

/// PostgreSQL implementation of the TimelineStore port.
///
/// Insert-only: there is no update or delete path by design.
pub struct PostgresTimelineStore {
    pool: PgPool,
}

impl PostgresTimelineStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a timeline entry.
#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    order_id: Uuid,
    actor_id: String,
    actor_role: String,
    event_type: String,
    old_status: Option<String>,
    new_status: String,
    metadata: serde_json::Value,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for TimelineEntry {
    type Error = DomainError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let actor_role = ActorRole::parse(&row.actor_role)
            .map_err(|e| DomainError::database(format!("invalid actor role: {}", e)))?;
        let old_status = row
            .old_status
            .as_deref()
            .map(|s| {
                OrderStatus::parse(s)
                    .map_err(|e| DomainError::database(format!("invalid status: {}", e)))
            })
            .transpose()?;
        let new_status = OrderStatus::parse(&row.new_status)
            .map_err(|e| DomainError::database(format!("invalid status: {}", e)))?;
        let metadata = serde_json::from_value(row.metadata)
            .map_err(|e| DomainError::database(format!("invalid metadata column: {}", e)))?;

        Ok(TimelineEntry {
            id: EntryId::from_uuid(row.id),
            order_id: OrderId::from_uuid(row.order_id),
            actor_id: ActorId::new(row.actor_id)
                .map_err(|e| DomainError::database(format!("invalid actor id: {}", e)))?,
            actor_role,
            event_type: row.event_type,
            old_status,
            new_status,
            metadata,
            occurred_at: Timestamp::from_datetime(row.occurred_at),
        })
    }
}

#[async_trait]
impl TimelineStore for PostgresTimelineStore {
    async fn append(&self, entry: &TimelineEntry) -> Result<(), DomainError> {
        let metadata = serde_json::to_value(&entry.metadata)
            .map_err(|e| DomainError::database(format!("failed to serialize metadata: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO order_timeline (
                id, order_id, actor_id, actor_role, event_type, old_status,
                new_status, metadata, occurred_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.order_id.as_uuid())
        .bind(entry.actor_id.as_str())
        .bind(entry.actor_role.as_str())
        .bind(&entry.event_type)
        .bind(entry.old_status.map(|s| s.as_str()))
        .bind(entry.new_status.as_str())
        .bind(metadata)
        .bind(entry.occurred_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to append timeline entry: {}", e)))?;

        Ok(())
    }

    async fn for_order(&self, order_id: OrderId) -> Result<Vec<TimelineEntry>, DomainError> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, actor_id, actor_role, event_type, old_status,
                   new_status, metadata, occurred_at
            FROM order_timeline
            WHERE order_id = $1
            ORDER BY occurred_at
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to load timeline: {}", e)))?;

        rows.into_iter().map(TimelineEntry::try_from).collect()
    }
}
