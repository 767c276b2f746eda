//! IdempotencySweeper - periodic cleanup of expired records.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info};

use crate::domain::foundation::DomainError;
use crate::ports::{Clock, IdempotencyStore};

/// Configuration for the sweeper loop.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often expired records are deleted.
    pub sweep_interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(3_600),
        }
    }
}

/// Background worker deleting expired idempotency records.
pub struct IdempotencySweeper {
    store: Arc<dyn IdempotencyStore>,
    clock: Arc<dyn Clock>,
    config: SweeperConfig,
}

impl IdempotencySweeper {
    pub fn new(
        store: Arc<dyn IdempotencyStore>,
        clock: Arc<dyn Clock>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Runs the sweep loop until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut interval = time::interval(self.config.sweep_interval);
        info!(
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            "idempotency sweeper started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("idempotency sweeper stopped");
                        return Ok(());
                    }
                }

                _ = interval.tick() => {
                    self.sweep_once().await?;
                }
            }
        }
    }

    /// Deletes expired records once, returning how many were removed.
    pub async fn sweep_once(&self) -> Result<u64, DomainError> {
        let removed = self.store.sweep_expired(self.clock.now()).await?;
        if removed > 0 {
            debug!(removed, "swept expired idempotency records");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryIdempotencyStore, ManualClock};
    use crate::domain::foundation::Timestamp;
    use crate::ports::{IdempotencyRecord, IdempotencyScope};
    use serde_json::json;

    fn record(key: &str, expires_at: Timestamp, created_at: Timestamp) -> IdempotencyRecord {
        IdempotencyRecord {
            scope: IdempotencyScope::new(key, "principal", "orders.create"),
            request_hash: "hash".to_string(),
            response_status: 201,
            response_body: json!({}),
            used: true,
            expires_at,
            created_at,
        }
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_records() {
        let store = Arc::new(InMemoryIdempotencyStore::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(1_700_000_000)));
        let sweeper =
            IdempotencySweeper::new(store.clone(), clock.clone(), SweeperConfig::default());

        let now = clock.now();
        store
            .put_if_absent(record("expired", now.minus_secs(60), now.minus_secs(86_400)))
            .await
            .unwrap();
        store
            .put_if_absent(record("live", now.plus_hours(24), now))
            .await
            .unwrap();

        let removed = sweeper.sweep_once().await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let store = Arc::new(InMemoryIdempotencyStore::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(1_700_000_000)));
        let sweeper = IdempotencySweeper::new(
            store,
            clock,
            SweeperConfig {
                sweep_interval: Duration::from_millis(10),
            },
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown_tx.send(true).unwrap();

        assert!(handle.await.unwrap().is_ok());
    }
}
