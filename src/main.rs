//! Dinehub worker binary.
//!
//! Runs the background half of the marketplace core: the webhook
//! reconciler and the idempotency sweeper. The HTTP surface mounts the
//! library from its own deployment and shares the same database.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dinehub::adapters::postgres::{
    PostgresDlqStore, PostgresIdempotencyStore, PostgresOrderRepository,
    PostgresPaymentRepository, PostgresWebhookStore,
};
use dinehub::application::idempotency::{IdempotencySweeper, SweeperConfig};
use dinehub::application::webhook::{EventProcessor, ReconcilerConfig, WebhookReconciler};
use dinehub::config::AppConfig;
use dinehub::ports::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        info!("database migrations applied");
    }

    let clock = Arc::new(SystemClock);
    let webhook_store = Arc::new(PostgresWebhookStore::new(pool.clone()));
    let dlq_store = Arc::new(PostgresDlqStore::new(pool.clone()));
    let idempotency_store = Arc::new(PostgresIdempotencyStore::new(pool.clone()));
    let processor = Arc::new(EventProcessor::new(
        Arc::new(PostgresPaymentRepository::new(pool.clone())),
        Arc::new(PostgresOrderRepository::new(pool.clone())),
        clock.clone(),
    ));

    let reconciler = WebhookReconciler::new(
        webhook_store,
        dlq_store,
        processor,
        config.webhook.retry_policy(),
        clock.clone(),
        ReconcilerConfig {
            poll_interval: config.webhook.poll_interval(),
            batch_size: config.webhook.batch_size,
        },
    );
    let sweeper = IdempotencySweeper::new(
        idempotency_store,
        clock,
        SweeperConfig {
            sweep_interval: config.idempotency.sweep_interval(),
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_shutdown = shutdown_rx.clone();

    let reconciler_handle = tokio::spawn(async move { reconciler.run(shutdown_rx).await });
    let sweeper_handle = tokio::spawn(async move { sweeper.run(sweeper_shutdown).await });

    info!("dinehub workers running, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    shutdown_tx.send(true)?;

    for (name, handle) in [("reconciler", reconciler_handle), ("sweeper", sweeper_handle)] {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(worker = name, error = %err, "worker exited with error"),
            Err(err) => error!(worker = name, error = %err, "worker task panicked"),
        }
    }

    Ok(())
}
