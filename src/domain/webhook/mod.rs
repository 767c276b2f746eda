//! Webhook domain - delivery records, signature verification, retry policy.

mod backoff;
mod delivery;
mod errors;
mod verifier;

pub use backoff::RetryPolicy;
pub use delivery::{DeliveryOutcome, WebhookDelivery, WebhookDlqEntry};
pub use errors::WebhookError;
pub use verifier::{sign_plain, sign_timestamped, SignatureScheme, WebhookVerifier};
