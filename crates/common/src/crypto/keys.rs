use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::content_key::ContentKeyError;

pub const PRIVATE_KEY_SIZE: usize = ed25519_dalek::SECRET_KEY_LENGTH;
pub const PUBLIC_KEY_SIZE: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

const KEY_TYPE_ED25519: &str = "ed25519";

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("malformed key description: {0}")]
    Description(#[from] serde_json::Error),
    #[error("sealed payload: {0}")]
    Content(#[from] ContentKeyError),
}

/// Public half of a user or group key
///
/// Data gets sealed for its holder, and request signatures are checked
/// against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: &[u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            anyhow::anyhow!("public key must be {} bytes, got {}", PUBLIC_KEY_SIZE, bytes.len())
        })?;
        VerifyingKey::from_bytes(bytes)
            .map(PublicKey)
            .map_err(|e| anyhow::anyhow!("invalid public key: {}", e).into())
    }
}

impl PublicKey {
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Montgomery form of the key, for the sealing agreement
    pub(crate) fn agreement_key(&self) -> X25519PublicKey {
        X25519PublicKey::from(self.0.to_montgomery().to_bytes())
    }

    /// Check a detached Ed25519 signature over `msg`
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<(), KeyError> {
        let signature = Signature::from_slice(signature)
            .map_err(|e| anyhow::anyhow!("malformed signature: {}", e))?;
        self.0
            .verify_strict(msg, &signature)
            .map_err(|e| anyhow::anyhow!("bad signature: {}", e).into())
    }
}

/// `{"type":"ed25519","private":"<hex>"}`
#[derive(Serialize, Deserialize)]
struct KeyDescription<'a> {
    #[serde(rename = "type")]
    key_type: &'a str,
    private: String,
}

/// Private key of a user or a group
///
/// Signs requests and opens data sealed for its public half. A group's key
/// is stored sealed under its parent, so the JSON description produced by
/// [`SecretKey::to_description`] is itself a sealed payload on the wire.
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretKey").field(&self.public().to_hex()).finish()
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(SigningKey::from_bytes(&bytes))
    }
}

impl SecretKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
        Self::from(bytes)
    }

    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Scalar of the key as an X25519 secret, for the sealing agreement
    pub(crate) fn agreement_key(&self) -> StaticSecret {
        StaticSecret::from(self.0.to_scalar_bytes())
    }

    pub fn to_description(&self) -> String {
        let description = KeyDescription {
            key_type: KEY_TYPE_ED25519,
            private: hex::encode(self.0.as_bytes()),
        };
        // two string fields cannot fail to serialize
        serde_json::to_string(&description).unwrap_or_default()
    }

    /// Parse a JSON key description
    ///
    /// Fails on malformed JSON, a key type other than `ed25519`, or a
    /// private key that is not 32 bytes of hex.
    pub fn from_description(json: &str) -> Result<Self, KeyError> {
        let description: KeyDescription = serde_json::from_str(json)?;
        if description.key_type != KEY_TYPE_ED25519 {
            return Err(anyhow::anyhow!("unsupported key type: {}", description.key_type).into());
        }
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        hex::decode_to_slice(&description.private, &mut bytes).map_err(|e| {
            anyhow::anyhow!("private key is not {} bytes of hex: {}", PRIVATE_KEY_SIZE, e)
        })?;
        Ok(Self::from(bytes))
    }

    pub fn sign_bytes(&self, msg: &[u8]) -> Vec<u8> {
        self.0.sign(msg).to_bytes().to_vec()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_description_round_trip() {
        let key = SecretKey::generate();
        let json = key.to_description();
        assert!(json.starts_with("{\"type\":\"ed25519\",\"private\":\""));

        let parsed = SecretKey::from_description(&json).unwrap();
        assert_eq!(parsed.to_bytes(), key.to_bytes());
        assert_eq!(parsed.public(), key.public());
    }

    #[test]
    fn test_description_rejects_bad_input() {
        assert!(matches!(
            SecretKey::from_description("not json"),
            Err(KeyError::Description(_))
        ));
        assert!(SecretKey::from_description(r#"{"type":"rsa","private":"00"}"#).is_err());
        assert!(SecretKey::from_description(r#"{"type":"ed25519","private":"abcd"}"#).is_err());
        assert!(SecretKey::from_description(r#"{"type":"ed25519"}"#).is_err());
    }

    #[test]
    fn test_public_key_from_bytes() {
        let public = SecretKey::generate().public();
        let parsed = PublicKey::try_from(public.to_bytes().as_slice()).unwrap();
        assert_eq!(parsed, public);
        assert!(PublicKey::try_from([7u8; 31].as_slice()).is_err());
    }

    #[test]
    fn test_signatures() {
        let key = SecretKey::generate();
        let signature = key.sign_bytes(b"{\"deviceId\":\"d\"}");
        assert_eq!(signature.len(), 64);

        key.public().verify(b"{\"deviceId\":\"d\"}", &signature).unwrap();
        assert!(key.public().verify(b"{\"deviceId\":\"e\"}", &signature).is_err());
        assert!(SecretKey::generate()
            .public()
            .verify(b"{\"deviceId\":\"d\"}", &signature)
            .is_err());
        assert!(key.public().verify(b"x", &signature[..10]).is_err());
    }
}
