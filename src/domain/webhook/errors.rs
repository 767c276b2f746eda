//! Webhook error types.

use thiserror::Error;

/// Errors raised while accepting or verifying a webhook.
///
/// Rejections here happen before anything is persisted: a delivery that
/// fails verification leaves no trace beyond a log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,

    /// Signature timestamp is older than the acceptance window.
    #[error("signature timestamp out of range")]
    TimestampOutOfRange,

    /// Signature timestamp is in the future beyond clock skew tolerance.
    #[error("invalid signature timestamp")]
    InvalidTimestamp,

    /// Signature header or payload could not be parsed.
    #[error("parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_compactly() {
        assert_eq!(WebhookError::InvalidSignature.to_string(), "invalid signature");
        assert_eq!(
            WebhookError::ParseError("bad hex".to_string()).to_string(),
            "parse error: bad hex"
        );
    }
}
