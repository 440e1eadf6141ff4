//! Memoization of decrypted keys and payloads
//!
//! Both caches are keyed by the exact ciphertext string. They live in the
//! session and are dropped together on logout; there is no partial
//! invalidation.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::crypto::CryptoKey;
use crate::resolver::DecryptError;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("key already cached for this ciphertext")]
    Duplicate,
    #[error("key missing from cache for ciphertext {0}")]
    Missing(String),
}

/// Decrypted group keys by the ciphertext they were decrypted from
#[derive(Debug)]
pub struct KeyCache<K> {
    keys: HashMap<String, K>,
}

impl<K> Default for KeyCache<K> {
    fn default() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }
}

impl<K> KeyCache<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, ciphertext: &str) -> Option<&K> {
        self.keys.get(ciphertext)
    }

    /// Take ownership of a freshly decrypted key
    ///
    /// Each ciphertext is decrypted once, so inserting it twice is a caller
    /// bug. Debug builds panic; release builds refuse the insert.
    pub fn insert(&mut self, ciphertext: String, key: K) -> Result<(), CacheError> {
        debug_assert!(
            !self.keys.contains_key(&ciphertext),
            "duplicate key cache insert"
        );
        if self.keys.contains_key(&ciphertext) {
            return Err(CacheError::Duplicate);
        }
        self.keys.insert(ciphertext, key);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Decode a base64 ciphertext, open it with `key` and read it as UTF-8
pub(crate) fn decrypt_payload<K: CryptoKey>(key: &K, ciphertext: &str) -> Result<String, DecryptError> {
    let raw = STANDARD.decode(ciphertext)?;
    let plaintext = key.decrypt(&raw)?;
    Ok(String::from_utf8(plaintext)?)
}

/// Plaintexts by the ciphertext they were decrypted from
#[derive(Debug, Default)]
pub struct DecryptionCache {
    plaintexts: HashMap<String, String>,
}

impl DecryptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached plaintext for `ciphertext`, decrypting with `key` on a miss
    ///
    /// A hit never touches `key`. A failed decrypt leaves the cache as it was.
    pub fn get_or_decrypt<K: CryptoKey>(
        &mut self,
        key: &K,
        ciphertext: &str,
    ) -> Result<String, DecryptError> {
        self.get_or_decode(key, ciphertext, |plaintext| Ok(plaintext.to_string()))
    }

    /// Parse the plaintext for `ciphertext` with `decode`
    ///
    /// On a miss the plaintext is cached only once `decode` accepts it, so a
    /// payload that decrypts but does not parse leaves the cache as it was.
    pub fn get_or_decode<K, T, F>(
        &mut self,
        key: &K,
        ciphertext: &str,
        decode: F,
    ) -> Result<T, DecryptError>
    where
        K: CryptoKey,
        F: FnOnce(&str) -> Result<T, DecryptError>,
    {
        if let Some(plaintext) = self.plaintexts.get(ciphertext) {
            tracing::debug!(len = ciphertext.len(), "decryption cache hit");
            return decode(plaintext);
        }

        tracing::debug!(len = ciphertext.len(), "decryption cache miss");
        let plaintext = decrypt_payload(key, ciphertext)?;
        let decoded = decode(&plaintext)?;
        self.plaintexts.insert(ciphertext.to_string(), plaintext);
        Ok(decoded)
    }

    pub fn len(&self) -> usize {
        self.plaintexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plaintexts.is_empty()
    }

    pub fn clear(&mut self) {
        self.plaintexts.clear();
    }
}
