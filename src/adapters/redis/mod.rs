//! Redis adapters.

mod event_publisher;

pub use event_publisher::RedisEventPublisher;
