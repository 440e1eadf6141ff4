//! Secret payload decoding
//!
//! Opens a secret's two sealed payloads with its resolved key and parses
//! each as a JSON document. Client data goes through the decryption cache;
//! critical data is decrypted fresh every time and never cached.

use crate::cache::{decrypt_payload, DecryptionCache};
use crate::codec::{from_slice, WireStruct};
use crate::crypto::CryptoKey;
use crate::resolver::DecryptError;
use crate::types::{Secret, SecretClientData, SecretCriticalData};

fn parse<T: WireStruct>(plaintext: &str) -> Result<T, DecryptError> {
    Ok(from_slice(plaintext.as_bytes())?)
}

fn decode_client_data<K: CryptoKey>(
    key: &K,
    plaintexts: &mut DecryptionCache,
    ciphertext: &str,
) -> Result<SecretClientData, DecryptError> {
    plaintexts.get_or_decode(key, ciphertext, parse)
}

fn decode_critical_data<K: CryptoKey>(
    key: &K,
    ciphertext: &str,
) -> Result<SecretCriticalData, DecryptError> {
    let plaintext = decrypt_payload(key, ciphertext)?;
    parse(&plaintext)
}

/// Replace the secret's decoded payloads using its resolved `key`
///
/// Nothing on `secret` changes unless every present payload decodes.
pub fn decode<K: CryptoKey>(
    secret: &mut Secret,
    key: &K,
    plaintexts: &mut DecryptionCache,
) -> Result<(), DecryptError> {
    let client_data = match secret.encrypted_client_data.as_deref() {
        Some(ciphertext) => Some(
            decode_client_data(key, plaintexts, ciphertext)
                .map_err(|e| DecryptError::ClientData(Box::new(e)))?,
        ),
        None => None,
    };

    let critical_data = match secret.encrypted_critical_data.as_deref() {
        Some(ciphertext) => Some(
            decode_critical_data(key, ciphertext)
                .map_err(|e| DecryptError::CriticalData(Box::new(e)))?,
        ),
        None => None,
    };

    if client_data.is_some() {
        secret.client_data = client_data;
    }
    if critical_data.is_some() {
        secret.critical_data = critical_data;
    }
    Ok(())
}
