//! Webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::webhook::{RetryPolicy, SignatureScheme};

/// Webhook configuration (provider scheme, signing secret, retry policy)
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Signature scheme: "razorpay", "stripe" or "generic-hmac"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Provider webhook signing secret
    pub signing_secret: SecretString,

    /// Base retry backoff in seconds
    #[serde(default = "default_base_backoff")]
    pub base_backoff_secs: u64,

    /// Maximum processing attempts before the DLQ
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Reconciler poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Deliveries fetched per reconciler cycle
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Timeout for gateway capture/refund calls in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,
}

impl WebhookConfig {
    /// The configured signature scheme.
    pub fn scheme(&self) -> Result<SignatureScheme, ValidationError> {
        SignatureScheme::parse(&self.provider)
            .map_err(|_| ValidationError::UnknownSignatureScheme(self.provider.clone()))
    }

    /// The signing secret for verifier construction.
    pub fn secret(&self) -> &str {
        self.signing_secret.expose_secret()
    }

    /// The retry policy for ingest and reconciliation.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(self.base_backoff_secs), self.max_attempts)
    }

    /// Reconciler poll interval as Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Gateway call timeout as Duration.
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.signing_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("WEBHOOK_SIGNING_SECRET"));
        }
        self.scheme()?;
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.base_backoff_secs == 0 {
            return Err(ValidationError::InvalidBaseBackoff);
        }
        Ok(())
    }
}

fn default_provider() -> String {
    "razorpay".to_string()
}

fn default_base_backoff() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_poll_interval() -> u64 {
    15
}

fn default_batch_size() -> u32 {
    50
}

fn default_gateway_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, secret: &str) -> WebhookConfig {
        WebhookConfig {
            provider: provider.to_string(),
            signing_secret: SecretString::new(secret.to_string()),
            base_backoff_secs: default_base_backoff(),
            max_attempts: default_max_attempts(),
            poll_interval_secs: default_poll_interval(),
            batch_size: default_batch_size(),
            gateway_timeout_secs: default_gateway_timeout(),
        }
    }

    #[test]
    fn known_providers_validate() {
        for provider in ["razorpay", "stripe", "generic-hmac"] {
            assert!(config(provider, "whsec_x").validate().is_ok());
        }
    }

    #[test]
    fn unknown_provider_fails() {
        assert!(config("paypal", "whsec_x").validate().is_err());
    }

    #[test]
    fn empty_secret_fails() {
        assert!(config("razorpay", "").validate().is_err());
    }

    #[test]
    fn retry_policy_reflects_settings() {
        let mut cfg = config("razorpay", "whsec_x");
        cfg.base_backoff_secs = 10;
        cfg.max_attempts = 3;

        let policy = cfg.retry_policy();
        assert_eq!(policy.base_backoff, Duration::from_secs(10));
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn zero_attempts_fail() {
        let mut cfg = config("razorpay", "whsec_x");
        cfg.max_attempts = 0;
        assert!(cfg.validate().is_err());
    }
}
