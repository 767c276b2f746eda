//! Payment domain - payment entity and provider webhook events.

mod payment;
mod provider_event;

pub use payment::{Applied, Payment, PaymentStateError, PaymentStatus};
pub use provider_event::{ProviderEvent, ProviderEventKind};
