/**
 * Memoization of decrypted group keys and
 *  decrypted payloads, keyed by ciphertext.
 */
pub mod cache;
/**
 * JSON wire codec.
 *  - Context-stack writer and frame-stack reader
 *  - Generic value model
 *  - `wire_struct!` typed records
 */
pub mod codec;
/**
 * Cryptographic types and operations.
 *  - The `CryptoKey` capability the key hierarchy runs on
 *  - Ed25519 identity keys and sealed payloads
 */
pub mod crypto;
/**
 * Opens a secret's sealed payloads with its
 *  resolved key.
 */
pub mod decoder;
/**
 * Walks a secret's group path down to the key
 *  that opens it.
 */
pub mod resolver;
/**
 * Per-login state: user key, caches and the
 *  personal group.
 */
pub mod session;
/**
 * Request and response records exchanged
 *  with the server.
 */
pub mod types;

#[cfg(test)]
pub(crate) mod testkit;

pub mod prelude {
    pub use crate::cache::{CacheError, DecryptionCache, KeyCache};
    pub use crate::codec::{CodecError, JsonReader, JsonWriter, Value, ValueType};
    pub use crate::crypto::{CryptoKey, KeyError, PublicKey, SecretKey};
    pub use crate::resolver::DecryptError;
    pub use crate::session::{DefaultGroup, Session};
    pub use crate::types::{GroupInfo, GroupMap, Secret, SecretClientData, SecretCriticalData};
}
