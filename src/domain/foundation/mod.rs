//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the dinehub domain.

mod actor;
mod errors;
mod events;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use actor::{Actor, ActorRole};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{EventEnvelope, EventId};
pub use ids::{ActorId, CustomerId, DriverId, EntryId, OrderId, PaymentId, VendorId};
pub use money::Money;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
