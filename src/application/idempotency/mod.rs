//! Request-level idempotency for side-effecting endpoints.

mod guard;
mod sweeper;

pub use guard::{IdempotencyError, IdempotencyGuard, OperationResponse};
pub use sweeper::{IdempotencySweeper, SweeperConfig};
