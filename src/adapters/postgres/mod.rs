//! PostgreSQL adapters.
//!
//! Runtime-checked sqlx queries over the schema in `migrations/`. The
//! uniqueness constraints there (provider event id, provider payment
//! id, the idempotency scope triple) are what make the `insert_new` /
//! `put_if_absent` race contracts hold across processes.

mod idempotency_store;
mod order_repository;
mod payment_repository;
mod timeline_store;
mod webhook_store;

pub use idempotency_store::PostgresIdempotencyStore;
pub use order_repository::PostgresOrderRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use timeline_store::PostgresTimelineStore;
pub use webhook_store::{PostgresDlqStore, PostgresWebhookStore};
