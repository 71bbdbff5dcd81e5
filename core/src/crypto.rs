//! Cryptographic primitive collaborator contract.
//!
//! The core never hand-rolls HMAC/SHA-1/Base64; it asks for them through
//! this trait so a host can substitute a hardware-accelerated or
//! certified implementation. [`HostCrypto`] is the default, backed by the
//! RustCrypto `sha2`/`sha1`/`hmac` crates and the `base64` crate.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Narrow crypto surface the protocol core needs: HMAC-SHA256 (message
/// signing), SHA-1 (WebSocket handshake accept key), Base64 (both).
pub trait Crypto: Send {
    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> [u8; 32];
    fn sha1(&self, message: &[u8]) -> [u8; 20];
    fn base64_encode(&self, bytes: &[u8]) -> String;
}

#[derive(Default, Clone, Copy)]
pub struct HostCrypto;

impl Crypto for HostCrypto {
    fn hmac_sha256(&self, key: &[u8], message: &[u8]) -> [u8; 32] {
        // HMAC accepts keys of any length; the sinric app secret is a
        // short ASCII token, well within a single SHA-256 block anyway.
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
            .expect("HMAC accepts keys of any length");
        mac.update(message);
        mac.finalize().into_bytes().into()
    }

    fn sha1(&self, message: &[u8]) -> [u8; 20] {
        let mut hasher = Sha1::new();
        hasher.update(message);
        hasher.finalize().into()
    }

    fn base64_encode(&self, bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_is_deterministic_and_key_sensitive() {
        let crypto = HostCrypto;
        let a = crypto.hmac_sha256(b"secret-a", b"payload");
        let b = crypto.hmac_sha256(b"secret-a", b"payload");
        let c = crypto.hmac_sha256(b"secret-b", b"payload");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sha1_matches_known_vector() {
        let crypto = HostCrypto;
        let digest = crypto.sha1(b"abc");
        assert_eq!(
            hex::encode(digest),
            "a9993e364706816aba3e25717850c26c9cd0d89"
        );
    }
}
