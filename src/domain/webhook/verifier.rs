//! Provider webhook signature verification.
//!
//! Verification is HMAC-SHA256 in all schemes; what differs per provider
//! is the header format and whether a timestamp is folded into the
//! signed payload. Signatures are compared in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;
use crate::domain::foundation::ValidationError;

/// Maximum allowed age for timestamped signatures (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future timestamps (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Provider-selected signature scheme, a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// Bare hex HMAC-SHA256 of the body (X-Razorpay-Signature).
    Razorpay,
    /// Stripe-style `t=<ts>,v1=<hex>` header over `"<ts>.<body>"`.
    Stripe,
    /// Bare hex HMAC-SHA256 of the body, provider-neutral.
    GenericHmac,
}

impl SignatureScheme {
    /// Parses the configuration value.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "razorpay" => Ok(Self::Razorpay),
            "stripe" => Ok(Self::Stripe),
            "generic-hmac" => Ok(Self::GenericHmac),
            other => Err(ValidationError::invalid_format(
                "webhook_provider",
                format!("unknown scheme '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Razorpay => "razorpay",
            Self::Stripe => "stripe",
            Self::GenericHmac => "generic-hmac",
        }
    }
}

/// Parsed components of a Stripe-style signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TimestampedSignature {
    timestamp: i64,
    signature: Vec<u8>,
}

impl TimestampedSignature {
    /// Parses `t=<timestamp>,v1=<hex signature>`, ignoring unknown pairs.
    fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid signature hex".to_string())
                    })?);
                }
                _ => {
                    // Unknown fields are ignored for forward compatibility.
                }
            }
        }

        Ok(Self {
            timestamp: timestamp
                .ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?,
            signature: signature
                .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?,
        })
    }
}

/// Verifies inbound webhook signatures for the configured scheme.
pub struct WebhookVerifier {
    scheme: SignatureScheme,
    secret: String,
}

impl WebhookVerifier {
    pub fn new(scheme: SignatureScheme, secret: impl Into<String>) -> Self {
        Self {
            scheme,
            secret: secret.into(),
        }
    }

    /// Verifies the signature header against the raw body.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        match self.scheme {
            SignatureScheme::Razorpay | SignatureScheme::GenericHmac => {
                self.verify_plain(payload, signature_header)
            }
            SignatureScheme::Stripe => self.verify_timestamped(payload, signature_header),
        }
    }

    fn verify_plain(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        let provided = hex::decode(signature_header.trim())
            .map_err(|_| WebhookError::ParseError("invalid signature hex".to_string()))?;
        let expected = self.compute_hmac(payload);

        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    fn verify_timestamped(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<(), WebhookError> {
        let parsed = TimestampedSignature::parse(signature_header)?;
        self.validate_timestamp(parsed.timestamp)?;

        let signed_payload = format!(
            "{}.{}",
            parsed.timestamp,
            String::from_utf8_lossy(payload)
        );
        let expected = self.compute_hmac(signed_payload.as_bytes());

        if !constant_time_compare(&expected, &parsed.signature) {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    /// Rejects signatures signed too long ago or too far in the future.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }
        Ok(())
    }

    fn compute_hmac(&self, data: &[u8]) -> Vec<u8> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time byte comparison to avoid leaking signature prefixes.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a bare hex HMAC-SHA256 signature.
///
/// Counterpart of the plain verification schemes; used by tests and
/// local webhook simulators to produce valid headers.
pub fn sign_plain(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Computes a Stripe-style signature header.
///
/// Counterpart of the timestamped verification scheme; used by tests
/// and local webhook simulators to produce valid headers.
pub fn sign_timestamped(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signed = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(signed.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    // ══════════════════════════════════════════════════════════════
    // Plain HMAC schemes
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn plain_scheme_accepts_valid_signature() {
        let verifier = WebhookVerifier::new(SignatureScheme::Razorpay, TEST_SECRET);
        let payload = br#"{"id":"evt_1","type":"payment.captured"}"#;
        let header = sign_plain(TEST_SECRET, payload);

        assert!(verifier.verify(payload, &header).is_ok());
    }

    #[test]
    fn plain_scheme_rejects_wrong_secret() {
        let verifier = WebhookVerifier::new(SignatureScheme::GenericHmac, "wrong_secret");
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign_plain(TEST_SECRET, payload);

        assert_eq!(
            verifier.verify(payload, &header),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn plain_scheme_rejects_tampered_payload() {
        let verifier = WebhookVerifier::new(SignatureScheme::Razorpay, TEST_SECRET);
        let header = sign_plain(TEST_SECRET, br#"{"id":"evt_1"}"#);

        assert_eq!(
            verifier.verify(br#"{"id":"evt_2"}"#, &header),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn plain_scheme_rejects_non_hex_header() {
        let verifier = WebhookVerifier::new(SignatureScheme::Razorpay, TEST_SECRET);

        assert!(matches!(
            verifier.verify(b"{}", "not hex at all"),
            Err(WebhookError::ParseError(_))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Stripe scheme
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn stripe_scheme_accepts_valid_signature() {
        let verifier = WebhookVerifier::new(SignatureScheme::Stripe, TEST_SECRET);
        let payload = br#"{"id":"evt_1","type":"payment.captured"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let header = sign_timestamped(TEST_SECRET, timestamp, payload);

        assert!(verifier.verify(payload, &header).is_ok());
    }

    #[test]
    fn stripe_scheme_rejects_stale_timestamp() {
        let verifier = WebhookVerifier::new(SignatureScheme::Stripe, TEST_SECRET);
        let payload = b"{}";
        let timestamp = chrono::Utc::now().timestamp() - 600;
        let header = sign_timestamped(TEST_SECRET, timestamp, payload);

        assert_eq!(
            verifier.verify(payload, &header),
            Err(WebhookError::TimestampOutOfRange)
        );
    }

    #[test]
    fn stripe_scheme_rejects_future_timestamp_beyond_skew() {
        let verifier = WebhookVerifier::new(SignatureScheme::Stripe, TEST_SECRET);
        let payload = b"{}";
        let timestamp = chrono::Utc::now().timestamp() + 120;
        let header = sign_timestamped(TEST_SECRET, timestamp, payload);

        assert_eq!(
            verifier.verify(payload, &header),
            Err(WebhookError::InvalidTimestamp)
        );
    }

    #[test]
    fn stripe_scheme_tolerates_small_future_skew() {
        let verifier = WebhookVerifier::new(SignatureScheme::Stripe, TEST_SECRET);
        let payload = b"{}";
        let timestamp = chrono::Utc::now().timestamp() + 30;
        let header = sign_timestamped(TEST_SECRET, timestamp, payload);

        assert!(verifier.verify(payload, &header).is_ok());
    }

    #[test]
    fn stripe_scheme_ignores_unknown_header_fields() {
        let verifier = WebhookVerifier::new(SignatureScheme::Stripe, TEST_SECRET);
        let payload = b"{}";
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!(
            "{},v0=deadbeef,scheme=hmac",
            sign_timestamped(TEST_SECRET, timestamp, payload)
        );

        assert!(verifier.verify(payload, &header).is_ok());
    }

    #[test]
    fn stripe_scheme_requires_timestamp_and_signature() {
        let verifier = WebhookVerifier::new(SignatureScheme::Stripe, TEST_SECRET);

        assert!(matches!(
            verifier.verify(b"{}", "v1=abcd"),
            Err(WebhookError::ParseError(_))
        ));
        assert!(matches!(
            verifier.verify(b"{}", "t=1234567890"),
            Err(WebhookError::ParseError(_))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Scheme parsing and comparison
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn scheme_parses_configuration_values() {
        assert_eq!(SignatureScheme::parse("razorpay").unwrap(), SignatureScheme::Razorpay);
        assert_eq!(SignatureScheme::parse("stripe").unwrap(), SignatureScheme::Stripe);
        assert_eq!(
            SignatureScheme::parse("generic-hmac").unwrap(),
            SignatureScheme::GenericHmac
        );
        assert!(SignatureScheme::parse("paypal").is_err());
    }

    #[test]
    fn constant_time_compare_handles_lengths() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
        assert!(constant_time_compare(b"", b""));
    }
}
