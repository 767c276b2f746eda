//! Redis pub/sub implementation of EventPublisher.
//!
//! Publishes order-update envelopes on a single channel; websocket
//! gateways and dashboards subscribe on their side. Suitable for
//! multi-server deployments where in-process fan-out is not enough.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// Redis-backed realtime event publisher.
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: MultiplexedConnection,
    channel: String,
}

impl RedisEventPublisher {
    pub fn new(conn: MultiplexedConnection, channel: impl Into<String>) -> Self {
        Self {
            conn,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, envelope: EventEnvelope) -> Result<(), DomainError> {
        let payload = serde_json::to_string(&envelope).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("failed to serialize event: {}", e),
            )
        })?;

        let mut conn = self.conn.clone();
        let _subscribers: i64 = conn.publish(&self.channel, payload).await.map_err(|e| {
            DomainError::new(
                ErrorCode::CacheError,
                format!("failed to publish event: {}", e),
            )
        })?;

        Ok(())
    }
}
