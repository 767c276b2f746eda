//! Order lifecycle orchestration.

mod orchestrator;

pub use orchestrator::{LifecycleError, OrderLifecycleOrchestrator};
