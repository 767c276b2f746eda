//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `OrderRepository` - Orders, with optimistic-concurrency updates
//! - `PaymentRepository` - Payments, looked up by provider payment id
//! - `WebhookStore` / `DlqStore` - Webhook deliveries and dead letters
//! - `IdempotencyStore` - Cached responses for retried requests
//! - `TimelineStore` - Append-only order audit rows
//!
//! ## Collaborator Ports
//!
//! - `PaymentGateway` - Capture/refund/release against the provider
//! - `EventPublisher` - Realtime order-update fan-out
//! - `DriverDirectory` - Nearest-driver lookup for assignment
//! - `Clock` - Injectable time source for retry and TTL logic

mod clock;
mod driver_directory;
mod event_publisher;
mod idempotency_store;
mod order_repository;
mod payment_gateway;
mod payment_repository;
mod timeline_store;
mod webhook_store;

pub use clock::{Clock, SystemClock};
pub use driver_directory::DriverDirectory;
pub use event_publisher::EventPublisher;
pub use idempotency_store::{IdempotencyRecord, IdempotencyScope, IdempotencyStore};
pub use order_repository::OrderRepository;
pub use payment_gateway::{GatewayError, GatewayErrorCode, GatewayIntent, PaymentGateway};
pub use payment_repository::PaymentRepository;
pub use timeline_store::TimelineStore;
pub use webhook_store::{DlqStore, SaveResult, WebhookStore};
