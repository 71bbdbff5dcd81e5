//! HMAC-SHA256 signing and constant-time verification over the canonical
//! payload slice.

use crate::crypto::Crypto;
use crate::error::{ProtocolError, SdkError};
use crate::json::canonical_payload_slice;
use subtle::ConstantTimeEq;

/// Computes `Base64(HMAC-SHA256(app_secret, payload_slice))` for the
/// payload slice found within `serialized_envelope`.
pub fn sign(crypto: &dyn Crypto, app_secret: &str, serialized_envelope: &str) -> Result<String, SdkError> {
    let slice = canonical_payload_slice(serialized_envelope)?;
    let digest = crypto.hmac_sha256(app_secret.as_bytes(), slice.as_bytes());
    Ok(crypto.base64_encode(&digest))
}

/// Recomputes the expected signature over `serialized_envelope`'s payload
/// slice and compares it to `claimed_signature` in constant time. Any
/// extraction failure (missing markers, oversize slice) fails closed.
#[must_use]
pub fn verify(
    crypto: &dyn Crypto,
    app_secret: &str,
    serialized_envelope: &str,
    claimed_signature: &str,
    max_payload_len: usize,
) -> bool {
    let Ok(slice) = canonical_payload_slice(serialized_envelope) else {
        return false;
    };
    if slice.len() > max_payload_len {
        // Never truncate-and-verify: an oversize slice fails closed.
        return false;
    }
    let digest = crypto.hmac_sha256(app_secret.as_bytes(), slice.as_bytes());
    let expected = crypto.base64_encode(&digest);

    // Constant-time comparison over equal-length byte strings. Unequal
    // lengths are themselves not secret (Base64-encoded SHA-256 output has
    // a fixed length), so a length short-circuit does not leak timing
    // information about the digest itself.
    if expected.len() != claimed_signature.len() {
        return false;
    }
    expected.as_bytes().ct_eq(claimed_signature.as_bytes()).into()
}

/// Convenience wrapper returning a typed error instead of `bool`, for call
/// sites that want `?` rather than an `if !verify(..)`.
pub fn verify_or_err(
    crypto: &dyn Crypto,
    app_secret: &str,
    serialized_envelope: &str,
    claimed_signature: &str,
    max_payload_len: usize,
) -> Result<(), SdkError> {
    if verify(crypto, app_secret, serialized_envelope, claimed_signature, max_payload_len) {
        Ok(())
    } else {
        Err(SdkError::Protocol(ProtocolError::InvalidSignature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HostCrypto;
    use crate::json::{Envelope, Header, MessageType, Payload, Signature};

    fn envelope_with_action(action: &str) -> Envelope {
        Envelope {
            header: Header::default(),
            payload: Payload {
                kind: MessageType::Request,
                action: action.to_string(),
                device_id: "aaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
                client_id: None,
                reply_token: Some("rt-1".to_string()),
                message: Some("m-1".to_string()),
                created_at: 1_700_000_000,
                success: None,
                cause: None,
                value: serde_json::json!({"state": "On"}),
            },
            signature: Signature {
                hmac: String::new(),
            },
        }
    }

    #[test]
    fn round_trips() {
        let crypto = HostCrypto;
        let mut envelope = envelope_with_action("setPowerState");
        let unsigned = envelope.to_canonical_json().unwrap();
        let sig = sign(&crypto, "my-secret", &unsigned).unwrap();
        envelope.signature.hmac = sig.clone();
        let signed = envelope.to_canonical_json().unwrap();
        assert!(verify(&crypto, "my-secret", &signed, &sig, 2048));
    }

    #[test]
    fn mutated_payload_byte_fails() {
        let crypto = HostCrypto;
        let mut envelope = envelope_with_action("setPowerState");
        let unsigned = envelope.to_canonical_json().unwrap();
        let sig = sign(&crypto, "my-secret", &unsigned).unwrap();
        envelope.signature.hmac = sig.clone();
        envelope.payload.action = "setPowerStateX".to_string();
        let tampered = envelope.to_canonical_json().unwrap();
        assert!(!verify(&crypto, "my-secret", &tampered, &sig, 2048));
    }

    #[test]
    fn wrong_key_fails() {
        let crypto = HostCrypto;
        let mut envelope = envelope_with_action("setPowerState");
        let unsigned = envelope.to_canonical_json().unwrap();
        let sig = sign(&crypto, "correct-secret", &unsigned).unwrap();
        envelope.signature.hmac = sig.clone();
        let signed = envelope.to_canonical_json().unwrap();
        assert!(!verify(&crypto, "wrong-secret", &signed, &sig, 2048));
    }

    #[test]
    fn missing_markers_fail_closed() {
        let crypto = HostCrypto;
        assert!(!verify(&crypto, "secret", "{\"not\":\"an envelope\"}", "abc", 2048));
    }
}
