//! Redis configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Redis configuration (realtime update fan-out)
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Pub/sub channel for order updates
    #[serde(default = "default_channel")]
    pub updates_channel: String,
}

impl RedisConfig {
    /// Validate redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            updates_channel: default_channel(),
        }
    }
}

fn default_channel() -> String {
    "dinehub.order_updates".to_string()
}
