//! Deterministic key for unit tests
//!
//! `MockKey` "seals" by prefixing the payload with its id and counts every
//! decrypt on the current thread, so tests can assert how often the key
//! hierarchy actually decrypts.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoKey, KeyError};

thread_local! {
    static DECRYPTS: Cell<usize> = const { Cell::new(0) };
}

/// Number of `MockKey::decrypt` calls on this thread since the last reset
pub fn decrypt_count() -> usize {
    DECRYPTS.with(Cell::get)
}

pub fn reset_decrypt_count() {
    DECRYPTS.with(|count| count.set(0));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockKey {
    id: String,
}

impl MockKey {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn prefix(&self) -> Vec<u8> {
        format!("sealed:{}:", self.id).into_bytes()
    }
}

impl CryptoKey for MockKey {
    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut signature = format!("signed:{}:", self.id).into_bytes();
        signature.extend_from_slice(blake3::hash(data).as_bytes());
        signature
    }

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        let mut sealed = self.prefix();
        sealed.extend_from_slice(data);
        Ok(sealed)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        DECRYPTS.with(|count| count.set(count.get() + 1));
        data.strip_prefix(self.prefix().as_slice())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| anyhow::anyhow!("payload not sealed for key {}", self.id).into())
    }

    fn from_json(json: &str) -> Result<Self, KeyError> {
        Ok(serde_json::from_str(json)?)
    }

    fn to_json(&self) -> String {
        format!("{{\"id\":{}}}", serde_json::Value::String(self.id.clone()))
    }
}
