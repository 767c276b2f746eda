//! Dinehub - Order-driven marketplace backend core.
//!
//! Implements the money-moving heart of a multi-vendor delivery
//! marketplace: the order lifecycle state machine, the payment webhook
//! reconciliation pipeline, and request-level idempotency for
//! side-effecting endpoints.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
