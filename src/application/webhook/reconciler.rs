//! WebhookReconciler - background retry loop for unprocessed deliveries.
//!
//! Polls the webhook store on a fixed interval for deliveries whose
//! retry time has come, re-invokes the processor, and either settles
//! them, reschedules them with exponential backoff, or moves them to
//! the dead-letter store once their attempt budget is spent.
//!
//! ## Graceful Shutdown
//!
//! The loop listens on a watch channel and finishes the current batch
//! before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::domain::foundation::DomainError;
use crate::domain::payment::ProviderEvent;
use crate::domain::webhook::{RetryPolicy, WebhookDelivery, WebhookDlqEntry};
use crate::ports::{Clock, DlqStore, WebhookStore};

use super::EventProcessor;

/// Configuration for the reconciler loop.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// How often to look for due deliveries.
    pub poll_interval: Duration,

    /// Maximum deliveries fetched per poll cycle.
    pub batch_size: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            batch_size: 50,
        }
    }
}

/// Background worker that retries unprocessed webhook deliveries.
pub struct WebhookReconciler {
    store: Arc<dyn WebhookStore>,
    dlq: Arc<dyn DlqStore>,
    processor: Arc<EventProcessor>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    config: ReconcilerConfig,
}

impl WebhookReconciler {
    pub fn new(
        store: Arc<dyn WebhookStore>,
        dlq: Arc<dyn DlqStore>,
        processor: Arc<EventProcessor>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            dlq,
            processor,
            policy,
            clock,
            config,
        }
    }

    /// Runs the poll loop until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut interval = time::interval(self.config.poll_interval);
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "webhook reconciler started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        // Finish the in-flight batch, then stop.
                        self.poll_once().await?;
                        info!("webhook reconciler stopped");
                        return Ok(());
                    }
                }

                _ = interval.tick() => {
                    self.poll_once().await?;
                }
            }
        }
    }

    /// Processes one batch of due deliveries.
    ///
    /// Each delivery is handled independently: one delivery's failure
    /// never aborts the rest of the batch. Returns the number of
    /// deliveries that settled this cycle.
    pub async fn poll_once(&self) -> Result<usize, DomainError> {
        let now = self.clock.now();
        let due = self.store.due_for_retry(now, self.config.batch_size).await?;
        let mut settled = 0;

        for delivery in due {
            match self.retry_delivery(&delivery).await {
                Ok(true) => settled += 1,
                Ok(false) => {}
                Err(err) => {
                    error!(
                        provider_event_id = %delivery.provider_event_id,
                        error = %err,
                        "webhook retry attempt errored"
                    );
                }
            }
        }

        Ok(settled)
    }

    /// Retries a single delivery. Returns whether it settled.
    async fn retry_delivery(&self, delivery: &WebhookDelivery) -> Result<bool, DomainError> {
        let event = ProviderEvent::from_payload(delivery.payload.clone());

        let (ok, error_text) = match self.processor.process(&event).await {
            Ok(true) => (true, None),
            Ok(false) => (false, Some("processing returned false".to_string())),
            Err(err) => (false, Some(err.to_string())),
        };

        let now = self.clock.now();
        if ok {
            self.store
                .mark_processed(&delivery.provider_event_id, now)
                .await?;
            debug!(provider_event_id = %delivery.provider_event_id, "delivery settled on retry");
            return Ok(true);
        }

        let attempts = delivery.attempts + 1;
        let error_text = error_text.unwrap_or_default();

        if self.policy.is_exhausted(attempts) {
            self.move_to_dlq(delivery, attempts, &error_text, now).await?;
            return Ok(true);
        }

        let next = self.policy.next_retry_at(now, attempts);
        self.store
            .record_failure(&delivery.provider_event_id, attempts, &error_text, next)
            .await?;
        debug!(
            provider_event_id = %delivery.provider_event_id,
            attempts,
            next_retry_at = %next,
            "delivery rescheduled"
        );
        Ok(false)
    }

    /// Snapshots an exhausted delivery into the dead-letter store.
    ///
    /// The original row stays, marked processed with an exhaustion
    /// annotation so success and give-up remain distinguishable.
    async fn move_to_dlq(
        &self,
        delivery: &WebhookDelivery,
        attempts: u32,
        error_text: &str,
        now: crate::domain::foundation::Timestamp,
    ) -> Result<(), DomainError> {
        let mut snapshot = delivery.clone();
        snapshot.attempts = attempts;

        let entry = WebhookDlqEntry::from_delivery(&snapshot, error_text, now);
        self.dlq.append(&entry).await?;
        self.store
            .mark_exhausted(&delivery.provider_event_id, now, error_text)
            .await?;

        warn!(
            provider_event_id = %delivery.provider_event_id,
            attempts,
            "delivery exhausted retries, moved to dead-letter store"
        );
        Ok(())
    }
}
