//! Symmetric layer of a sealed payload
//!
//! A [`ContentKey`] only ever comes out of [`ContentKey::derive`]: the
//! sealing layer derives one from an ECDH agreement, uses it once and drops
//! it. Framing of a box:
//!
//! ```text
//! nonce (12) || ChaCha20-Poly1305( blake3(plaintext) (32) || plaintext ) || tag (16)
//! ```

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;
/// Digest of the plaintext carried inside the box
pub const DIGEST_SIZE: usize = blake3::OUT_LEN;

#[derive(Debug, thiserror::Error)]
pub enum ContentKeyError {
    #[error("content key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("box too short: need at least {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
    #[error("authentication failed")]
    Authentication,
    #[error("plaintext digest mismatch")]
    Digest,
}

/// One-shot ChaCha20-Poly1305 key derived with BLAKE3
pub struct ContentKey(Key);

impl ContentKey {
    /// Derive a key from agreement output under a domain separation context
    pub fn derive(context: &str, material: &[u8]) -> Self {
        Self(Key::from(blake3::derive_key(context, material)))
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(&self.0)
    }

    /// Box `plaintext` under a fresh random nonce
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, ContentKeyError> {
        let mut nonce = Nonce::default();
        getrandom::getrandom(nonce.as_mut_slice())
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;

        let framed = [blake3::hash(plaintext).as_bytes().as_slice(), plaintext].concat();
        let ciphertext = self
            .cipher()
            .encrypt(&nonce, framed.as_slice())
            .map_err(|_| anyhow::anyhow!("encryption failed"))?;

        Ok([nonce.as_slice(), ciphertext.as_slice()].concat())
    }

    /// Open a box produced by [`ContentKey::seal`]
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, ContentKeyError> {
        let needed = NONCE_SIZE + DIGEST_SIZE + TAG_SIZE;
        if sealed.len() < needed {
            return Err(ContentKeyError::Truncated {
                needed,
                got: sealed.len(),
            });
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        let mut framed = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ContentKeyError::Authentication)?;

        let plaintext = framed.split_off(DIGEST_SIZE);
        if blake3::hash(&plaintext).as_bytes() != framed.as_slice() {
            return Err(ContentKeyError::Digest);
        }
        Ok(plaintext)
    }
}
