//! Key-hierarchy resolution
//!
//! A secret is sealed for the last group on its `groupIdPath`. Each group's
//! private key is sealed for the group before it, and the first group's for
//! the user. Walking the path from the user key downwards recovers the key
//! that opens the secret, caching every group key on the way.

use crate::cache::{CacheError, DecryptionCache, KeyCache};
use crate::codec::CodecError;
use crate::crypto::{CryptoKey, KeyError};
use crate::types::GroupMap;

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("secret does not contain a group id path")]
    MissingGroupPath,
    #[error("group {0} not found")]
    GroupNotFound(i32),
    #[error("group {0} has no encrypted private key")]
    MissingGroupKey(i32),
    #[error("error decrypting key: {0}")]
    Key(#[from] KeyError),
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("plaintext is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("malformed payload: {0}")]
    Codec(#[from] CodecError),
    #[error("error decrypting secret client data: {0}")]
    ClientData(#[source] Box<DecryptError>),
    #[error("error decrypting secret critical data: {0}")]
    CriticalData(#[source] Box<DecryptError>),
}

/// Walk `path` from `user_key` down to the key of its last group
///
/// Group keys already in `keys` are reused without decrypting. A failure at
/// any step leaves both caches holding only the keys decrypted before it.
pub fn resolve<'a, K: CryptoKey>(
    user_key: &K,
    keys: &'a mut KeyCache<K>,
    plaintexts: &mut DecryptionCache,
    path: &[i32],
    groups: &GroupMap,
) -> Result<&'a K, DecryptError> {
    if path.is_empty() {
        return Err(DecryptError::MissingGroupPath);
    }

    // ciphertext of the current key; `None` is the user key
    let mut current: Option<&str> = None;

    for &group_id in path {
        let group = groups
            .get(&group_id)
            .ok_or(DecryptError::GroupNotFound(group_id))?;
        let encrypted = group
            .encrypted_private_key
            .as_deref()
            .ok_or(DecryptError::MissingGroupKey(group_id))?;

        if keys.find(encrypted).is_some() {
            tracing::debug!(group_id, "key cache hit");
        } else {
            tracing::debug!(group_id, "key cache miss");
            let parent = match current {
                None => user_key,
                Some(ciphertext) => keys
                    .find(ciphertext)
                    .ok_or_else(|| CacheError::Missing(ciphertext.to_string()))?,
            };
            let key = plaintexts.get_or_decode(parent, encrypted, |description| {
                Ok(K::from_json(description)?)
            })?;
            keys.insert(encrypted.to_string(), key)?;
        }

        current = Some(encrypted);
    }

    let keys: &'a KeyCache<K> = keys;
    match current {
        Some(ciphertext) => keys
            .find(ciphertext)
            .ok_or_else(|| CacheError::Missing(ciphertext.to_string()).into()),
        None => Err(DecryptError::MissingGroupPath),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testkit::{decrypt_count, reset_decrypt_count, MockKey};
    use crate::types::GroupInfo;

    fn group(id: i32, name: &str, sealed_by: &MockKey, key: &MockKey) -> (i32, GroupInfo) {
        let info = GroupInfo {
            group_id: Some(id),
            auto_delete: Some(false),
            name: Some(name.to_string()),
            encrypted_private_key: Some(sealed_by.encrypt_text(&key.to_json()).unwrap()),
        };
        (id, info)
    }

    struct Fixture {
        user: MockKey,
        groups: GroupMap,
        keys: KeyCache<MockKey>,
        plaintexts: DecryptionCache,
    }

    fn fixture() -> Fixture {
        let user = MockKey::new("user");
        let g1 = MockKey::new("g1");
        let g2 = MockKey::new("g2");
        let g3 = MockKey::new("g3");
        let groups = GroupMap::from([
            group(1, "", &user, &g1),
            group(2, "team", &g1, &g2),
            group(3, "other", &g1, &g3),
        ]);
        Fixture {
            user,
            groups,
            keys: KeyCache::new(),
            plaintexts: DecryptionCache::new(),
        }
    }

    #[test]
    fn test_walks_path_in_order() {
        let mut f = fixture();
        reset_decrypt_count();

        let key = resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[1, 2], &f.groups).unwrap();
        assert_eq!(key.id(), "g2");
        assert_eq!(decrypt_count(), 2);
        assert_eq!(f.keys.len(), 2);
    }

    #[test]
    fn test_second_resolution_hits_cache() {
        let mut f = fixture();
        resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[1, 2], &f.groups).unwrap();

        reset_decrypt_count();
        let key = resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[1, 2], &f.groups).unwrap();
        assert_eq!(key.id(), "g2");
        assert_eq!(decrypt_count(), 0);

        // a sibling reuses the cached parent and decrypts only its own key
        let key = resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[1, 3], &f.groups).unwrap();
        assert_eq!(key.id(), "g3");
        assert_eq!(decrypt_count(), 1);
    }

    #[test]
    fn test_empty_path_fails() {
        let mut f = fixture();
        assert!(matches!(
            resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[], &f.groups),
            Err(DecryptError::MissingGroupPath)
        ));
    }

    #[test]
    fn test_unknown_group_fails() {
        let mut f = fixture();
        assert!(matches!(
            resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[1, 9], &f.groups),
            Err(DecryptError::GroupNotFound(9))
        ));
        // the first link was still cached
        assert_eq!(f.keys.len(), 1);
    }

    #[test]
    fn test_wrong_parent_fails_without_caching() {
        let mut f = fixture();
        // group 2 is sealed for g1, not for the user
        assert!(matches!(
            resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[2], &f.groups),
            Err(DecryptError::Key(_))
        ));
        assert!(f.keys.is_empty());
        assert!(f.plaintexts.is_empty());
    }

    #[test]
    fn test_malformed_key_material_fails() {
        let mut f = fixture();
        let broken = GroupInfo {
            group_id: Some(5),
            encrypted_private_key: Some(f.user.encrypt_text("not a key").unwrap()),
            ..Default::default()
        };
        f.groups.insert(5, broken);
        assert!(matches!(
            resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[5], &f.groups),
            Err(DecryptError::Key(KeyError::Description(_)))
        ));
        assert!(f.keys.is_empty());
        assert!(f.plaintexts.is_empty());
    }

    #[test]
    fn test_missing_group_key_fails() {
        let mut f = fixture();
        f.groups.insert(
            6,
            GroupInfo {
                group_id: Some(6),
                ..Default::default()
            },
        );
        assert!(matches!(
            resolve(&f.user, &mut f.keys, &mut f.plaintexts, &[6], &f.groups),
            Err(DecryptError::MissingGroupKey(6))
        ));
    }
}
