//! Webhook pipeline - ingestion, processing, reconciliation.

mod ingestor;
mod processor;
mod reconciler;

pub use ingestor::WebhookIngestor;
pub use processor::EventProcessor;
pub use reconciler::{ReconcilerConfig, WebhookReconciler};
