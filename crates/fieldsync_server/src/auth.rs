//! Webhook signature verification.
//!
//! Inbound webhooks carry an HMAC-SHA256 signature over the raw request
//! body, hex-encoded, computed with the shared webhook secret. Requests
//! with a missing or wrong signature are rejected before the body is even
//! parsed.

use crate::error::{ServerError, ServerResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies webhook signatures against the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl WebhookVerifier {
    /// Creates a verifier with the given shared secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Signs a body, returning the hex-encoded signature.
    ///
    /// Used by senders and by tests; the receiver side only verifies.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a hex-encoded signature over `body`.
    pub fn verify(&self, body: &[u8], signature: &str) -> ServerResult<()> {
        let expected = hex::decode(signature.trim())
            .map_err(|_| ServerError::NotAuthorized("malformed signature".into()))?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| ServerError::NotAuthorized("signature mismatch".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let verifier = WebhookVerifier::new(b"webhook-secret".to_vec());
        let body = br#"{"event_type":"work_order_updated"}"#;

        let signature = verifier.sign(body);
        assert!(verifier.verify(body, &signature).is_ok());
    }

    #[test]
    fn reject_tampered_body() {
        let verifier = WebhookVerifier::new(b"webhook-secret".to_vec());
        let signature = verifier.sign(b"original");

        let result = verifier.verify(b"tampered", &signature);
        assert!(matches!(result, Err(ServerError::NotAuthorized(_))));
    }

    #[test]
    fn reject_wrong_secret() {
        let signer = WebhookVerifier::new(b"secret-a".to_vec());
        let verifier = WebhookVerifier::new(b"secret-b".to_vec());

        let body = b"payload";
        let signature = signer.sign(body);
        assert!(verifier.verify(body, &signature).is_err());
    }

    #[test]
    fn reject_malformed_signature() {
        let verifier = WebhookVerifier::new(b"secret".to_vec());
        let result = verifier.verify(b"payload", "not-hex!");
        assert!(matches!(result, Err(ServerError::NotAuthorized(_))));
    }
}
