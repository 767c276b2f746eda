//! Idempotency configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Idempotency configuration (header name, TTL, guarded endpoints)
#[derive(Debug, Clone, Deserialize)]
pub struct IdempotencyConfig {
    /// Request header carrying the client key
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// Cached-response lifetime in hours
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,

    /// Endpoints guarded by the cache
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Expired-record sweep interval in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl IdempotencyConfig {
    /// True when the cache guards the given endpoint.
    pub fn guards(&self, endpoint: &str) -> bool {
        self.endpoints.iter().any(|e| e == endpoint)
    }

    /// Sweep interval as Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate idempotency configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.header_name.is_empty() {
            return Err(ValidationError::MissingRequired("IDEMPOTENCY_HEADER_NAME"));
        }
        if self.ttl_hours == 0 {
            return Err(ValidationError::InvalidIdempotencyTtl);
        }
        Ok(())
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            ttl_hours: default_ttl_hours(),
            endpoints: default_endpoints(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_header_name() -> String {
    "Idempotency-Key".to_string()
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_endpoints() -> Vec<String> {
    vec![
        "orders.create".to_string(),
        "payments.create_intent".to_string(),
    ]
}

fn default_sweep_interval() -> u64 {
    3_600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_guard_the_money_moving_endpoints() {
        let config = IdempotencyConfig::default();
        assert!(config.guards("orders.create"));
        assert!(config.guards("payments.create_intent"));
        assert!(!config.guards("orders.list"));
    }

    #[test]
    fn defaults_are_valid() {
        assert!(IdempotencyConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_ttl_fails() {
        let config = IdempotencyConfig {
            ttl_hours: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
