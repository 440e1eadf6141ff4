//! Cryptographic primitives for the vault client
//!
//! The key hierarchy only needs an opaque key capability: something that can
//! sign, seal data for itself, open data sealed for it, and be rebuilt from a
//! JSON key description. [`CryptoKey`] is that seam; [`SecretKey`] is the
//! production implementation.
//!
//! # Security Model
//!
//! ## Identity
//! Every user and every group owns an Ed25519 keypair. Users sign their
//! requests with it.
//!
//! ## Sealing
//! Data is sealed to a key's public half with an ephemeral X25519 agreement
//! and ChaCha20-Poly1305 (see [`sealed`]).
//!
//! ## Hierarchy
//! A group's private key description is sealed under its parent's key, or
//! under the user's own key for a root group. Walking a secret's group path
//! from the user key downwards recovers the key that opens the secret.
//!
//! Ciphertexts travel through JSON as standard padded base64 strings.

mod content_key;
mod keys;
pub mod sealed;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub use content_key::{ContentKey, ContentKeyError};
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

/// An asymmetric private key as the key hierarchy sees it
pub trait CryptoKey: Sized {
    /// Sign `data`, returning a detached signature
    fn sign(&self, data: &[u8]) -> Vec<u8>;

    /// Seal `data` so that this key can open it again
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Open data sealed for this key
    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Rebuild a key from its JSON key description
    fn from_json(json: &str) -> Result<Self, KeyError>;

    /// JSON key description of this key
    fn to_json(&self) -> String;

    /// Seal a UTF-8 payload and encode the result as base64
    fn encrypt_text(&self, plaintext: &str) -> Result<String, KeyError> {
        Ok(STANDARD.encode(self.encrypt(plaintext.as_bytes())?))
    }

    /// Decode a base64 ciphertext and open it as UTF-8 text
    fn decrypt_text(&self, ciphertext: &str) -> Result<String, KeyError> {
        let raw = STANDARD
            .decode(ciphertext)
            .map_err(|e| anyhow::anyhow!("ciphertext is not valid base64: {}", e))?;
        let plaintext = self.decrypt(&raw)?;
        String::from_utf8(plaintext)
            .map_err(|e| anyhow::anyhow!("plaintext is not valid utf-8: {}", e).into())
    }

    /// Open an encrypted key description and parse the key inside it
    fn decrypt_private_key(&self, ciphertext: &str) -> Result<Self, KeyError> {
        let description = self.decrypt_text(ciphertext)?;
        Self::from_json(&description)
    }
}

impl CryptoKey for SecretKey {
    fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.sign_bytes(data)
    }

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        sealed::seal(data, &self.public())
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        sealed::open(data, self)
    }

    fn from_json(json: &str) -> Result<Self, KeyError> {
        SecretKey::from_description(json)
    }

    fn to_json(&self) -> String {
        self.to_description()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_text_round_trip() {
        let key = SecretKey::generate();
        let ciphertext = key.encrypt_text("{\"title\":\"mail\"}").unwrap();
        assert_eq!(key.decrypt_text(&ciphertext).unwrap(), "{\"title\":\"mail\"}");
    }

    #[test]
    fn test_decrypt_text_rejects_bad_base64() {
        let key = SecretKey::generate();
        assert!(key.decrypt_text("not base64 at all!").is_err());
    }

    #[test]
    fn test_decrypt_private_key() {
        let parent = SecretKey::generate();
        let child = SecretKey::generate();

        let encrypted = parent.encrypt_text(&child.to_json()).unwrap();
        let recovered = parent.decrypt_private_key(&encrypted).unwrap();
        assert_eq!(recovered.to_bytes(), child.to_bytes());

        // only the parent can open it
        let stranger = SecretKey::generate();
        assert!(stranger.decrypt_private_key(&encrypted).is_err());
    }
}
