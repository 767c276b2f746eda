//! In-memory adapters.
//!
//! Back the integration tests and local development. Uniqueness and
//! compare-and-swap semantics mirror the contracts the PostgreSQL
//! adapters get from the schema, so tests exercise the same races.

mod clock;
mod driver_directory;
mod event_bus;
mod idempotency_store;
mod order_repository;
mod payment_repository;
mod timeline_store;
mod webhook_store;

pub use clock::ManualClock;
pub use driver_directory::StaticDriverDirectory;
pub use event_bus::InMemoryEventBus;
pub use idempotency_store::InMemoryIdempotencyStore;
pub use order_repository::InMemoryOrderRepository;
pub use payment_repository::InMemoryPaymentRepository;
pub use timeline_store::InMemoryTimelineStore;
pub use webhook_store::{InMemoryDlqStore, InMemoryWebhookStore};
