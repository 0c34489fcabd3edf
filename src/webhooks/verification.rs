use crate::error::Result;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Trait for verifying webhook signatures.
///
/// Payment processors sign their notifications differently; implement this
/// trait for the provider in use.
#[async_trait]
pub trait WebhookVerifier: Send + Sync {
    /// Verify `signature` against the raw `payload` bytes.
    ///
    /// Returns `Ok(true)` if the signature is valid, `Ok(false)` if not,
    /// `Err` only on infrastructure failure.
    async fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<bool>;
}

/// No-op verifier that accepts all webhooks.
///
/// Only for development and tests; a deployment without a configured
/// webhook secret falls back to this and logs a warning per delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerification;

#[async_trait]
impl WebhookVerifier for NoVerification {
    async fn verify_signature(&self, _payload: &[u8], _signature: &str) -> Result<bool> {
        tracing::warn!("webhook accepted without signature verification");
        Ok(true)
    }
}

/// HMAC-SHA256 webhook verifier with timing-safe comparison.
///
/// Signatures are hex encoded, optionally carrying a prefix such as
/// `sha256=` which is stripped before decoding.
pub struct HmacSha256Verifier {
    secret: Vec<u8>,
    signature_prefix: Option<String>,
}

impl HmacSha256Verifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            signature_prefix: None,
        }
    }

    /// Create a verifier that strips a prefix from signatures.
    pub fn new_with_prefix(secret: impl Into<Vec<u8>>, prefix: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            signature_prefix: Some(prefix.into()),
        }
    }

    fn compute_signature(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    fn decode_signature(&self, signature: &str) -> Option<Vec<u8>> {
        let sig = match &self.signature_prefix {
            Some(prefix) => signature.strip_prefix(prefix.as_str()).unwrap_or(signature),
            None => signature,
        };
        hex_decode(sig)
    }
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    // Byte-pair slicing below assumes single-byte characters.
    if !s.is_ascii() || s.len() % 2 != 0 {
        return None;
    }

    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Constant-time comparison to prevent timing attacks.
///
/// Uses the `subtle` crate, whose optimization barriers keep the compiler
/// from reintroducing timing-leaking branches.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[async_trait]
impl WebhookVerifier for HmacSha256Verifier {
    async fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        let provided = match self.decode_signature(signature) {
            Some(bytes) => bytes,
            None => {
                tracing::debug!("failed to decode webhook signature");
                return Ok(false);
            }
        };

        let expected = self.compute_signature(payload);
        let is_valid = constant_time_compare(&expected, &provided);

        if !is_valid {
            tracing::debug!("webhook signature verification failed");
        }

        Ok(is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compute a valid hex-encoded HMAC-SHA256 signature for testing.
    pub(crate) fn compute_test_signature(secret: &[u8], payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        mac.update(payload);
        let result = mac.finalize().into_bytes();
        result.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_hex_decode_valid() {
        assert_eq!(hex_decode(""), Some(vec![]));
        assert_eq!(hex_decode("00"), Some(vec![0x00]));
        assert_eq!(hex_decode("0a1b2c"), Some(vec![0x0a, 0x1b, 0x2c]));
        assert_eq!(hex_decode("AABB"), Some(vec![0xaa, 0xbb]));
    }

    #[test]
    fn test_hex_decode_invalid() {
        assert_eq!(hex_decode("0"), None); // odd length
        assert_eq!(hex_decode("0g"), None); // invalid char
        assert_eq!(hex_decode("αβ"), None); // multi-byte chars must not panic
    }

    #[tokio::test]
    async fn test_non_ascii_signature_fails_cleanly() {
        let verifier = HmacSha256Verifier::new("secret");
        assert!(!verifier.verify_signature(b"payload", "αβγδ").await.unwrap());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2], &[1, 2, 3]));
    }

    #[tokio::test]
    async fn test_no_verification_always_passes() {
        let verifier = NoVerification;
        assert!(verifier
            .verify_signature(b"any payload", "any-signature")
            .await
            .unwrap());
        assert!(verifier.verify_signature(b"", "").await.unwrap());
    }

    #[tokio::test]
    async fn test_valid_signature() {
        let secret = b"my-webhook-secret";
        let payload = b"test payload";
        let verifier = HmacSha256Verifier::new(secret.to_vec());

        let signature = compute_test_signature(secret, payload);
        assert!(verifier.verify_signature(payload, &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_secret_fails() {
        let payload = b"test payload";
        let signature = compute_test_signature(b"secret1", payload);

        let verifier = HmacSha256Verifier::new("secret2");
        assert!(!verifier.verify_signature(payload, &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_modified_payload_fails() {
        let secret = b"my-secret";
        let signature = compute_test_signature(secret, b"original payload");

        let verifier = HmacSha256Verifier::new(secret.to_vec());
        assert!(!verifier
            .verify_signature(b"modified payload", &signature)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_malformed_signature_fails() {
        let verifier = HmacSha256Verifier::new("secret");
        for sig in ["", "not-hex", "abc", "0g0g0g"] {
            assert!(
                !verifier.verify_signature(b"payload", sig).await.unwrap(),
                "signature '{}' should fail",
                sig
            );
        }
    }

    #[tokio::test]
    async fn test_prefix_stripped() {
        let secret = b"hook-secret";
        let payload = b"{\"event\":\"payment_completed\"}";
        let verifier = HmacSha256Verifier::new_with_prefix(secret.to_vec(), "sha256=");

        let signature = format!("sha256={}", compute_test_signature(secret, payload));
        assert!(verifier.verify_signature(payload, &signature).await.unwrap());

        // Missing prefix still verifies; the strip is best effort.
        let bare = compute_test_signature(secret, payload);
        assert!(verifier.verify_signature(payload, &bare).await.unwrap());
    }
}
