//! Public-key sealing
//!
//! Every encrypted blob the server hands out (a group's private key, a
//! secret's client data, its critical data) is sealed for exactly one key
//! holder:
//!
//! ```text
//! ephemeral_pubkey (32) || nonce (12) || ciphertext || tag (16)
//! ```
//!
//! The sender makes a throwaway keypair, agrees on a shared secret with the
//! recipient over X25519 and boxes the payload with a [`ContentKey`] derived
//! from it. The recipient repeats the agreement from the ephemeral public key
//! at the front of the payload.

use super::content_key::{ContentKey, DIGEST_SIZE, NONCE_SIZE, TAG_SIZE};
use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};

/// Domain separation for content keys of sealed payloads
const SEAL_CONTEXT: &str = "vault 2024 sealed payload v1";

/// Ephemeral key plus the smallest possible box
pub const MIN_SEALED_SIZE: usize = PUBLIC_KEY_SIZE + NONCE_SIZE + DIGEST_SIZE + TAG_SIZE;

fn content_key(shared: &x25519_dalek::SharedSecret) -> ContentKey {
    ContentKey::derive(SEAL_CONTEXT, shared.as_bytes())
}

/// Seal `data` for the holder of `recipient`'s private key
pub fn seal(data: &[u8], recipient: &PublicKey) -> Result<Vec<u8>, KeyError> {
    let ephemeral = SecretKey::generate();
    let shared = ephemeral
        .agreement_key()
        .diffie_hellman(&recipient.agreement_key());

    let boxed = content_key(&shared).seal(data)?;
    Ok([ephemeral.public().to_bytes().as_slice(), boxed.as_slice()].concat())
}

/// Open a payload sealed for `recipient`
pub fn open(sealed: &[u8], recipient: &SecretKey) -> Result<Vec<u8>, KeyError> {
    if sealed.len() < MIN_SEALED_SIZE {
        return Err(anyhow::anyhow!(
            "sealed payload is {} bytes, shorter than the minimum {}",
            sealed.len(),
            MIN_SEALED_SIZE
        )
        .into());
    }

    let (ephemeral, boxed) = sealed.split_at(PUBLIC_KEY_SIZE);
    let ephemeral = PublicKey::try_from(ephemeral)?;
    let shared = recipient
        .agreement_key()
        .diffie_hellman(&ephemeral.agreement_key());

    Ok(content_key(&shared).open(boxed)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::content_key::ContentKeyError;

    #[test]
    fn test_only_recipient_opens() {
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();

        let sealed = seal(b"{\"password\":\"hunter2\"}", &alice.public()).unwrap();
        assert_eq!(open(&sealed, &alice).unwrap(), b"{\"password\":\"hunter2\"}");
        assert!(matches!(
            open(&sealed, &bob),
            Err(KeyError::Content(ContentKeyError::Authentication))
        ));
    }

    #[test]
    fn test_short_payload_rejected() {
        let key = SecretKey::generate();
        let sealed = seal(b"", &key.public()).unwrap();
        assert_eq!(sealed.len(), MIN_SEALED_SIZE);
        assert!(matches!(
            open(&sealed[..MIN_SEALED_SIZE - 1], &key),
            Err(KeyError::Default(_))
        ));
    }

    #[test]
    fn test_each_seal_uses_a_fresh_ephemeral() {
        let key = SecretKey::generate();
        let a = seal(b"same", &key.public()).unwrap();
        let b = seal(b"same", &key.public()).unwrap();
        assert_ne!(a[..PUBLIC_KEY_SIZE], b[..PUBLIC_KEY_SIZE]);
    }
}
