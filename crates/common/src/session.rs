//! Per-login client state
//!
//! A [`Session`] owns the user key together with everything decrypted from
//! it: both caches, the personal group and the group map of the last
//! listing.

use std::collections::BTreeMap;

use crate::cache::{DecryptionCache, KeyCache};
use crate::crypto::CryptoKey;
use crate::decoder;
use crate::resolver::{self, DecryptError};
use crate::types::{GroupMap, Secret};

/// The caller's personal group and its decrypted key
#[derive(Debug)]
pub struct DefaultGroup<K> {
    pub id: i32,
    pub key: K,
}

/// Everything a logged-in user holds in memory
///
/// One session exists per login. Dropping it (or calling [`Session::logout`])
/// discards every decrypted key and plaintext at once.
#[derive(Debug)]
pub struct Session<K> {
    username: String,
    user_key: K,
    keys: KeyCache<K>,
    plaintexts: DecryptionCache,
    default_group: Option<DefaultGroup<K>>,
    groups: GroupMap,
}

impl<K: CryptoKey> Session<K> {
    pub fn new(username: impl Into<String>, user_key: K) -> Self {
        Self {
            username: username.into(),
            user_key,
            keys: KeyCache::new(),
            plaintexts: DecryptionCache::new(),
            default_group: None,
            groups: GroupMap::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn user_key(&self) -> &K {
        &self.user_key
    }

    pub fn keys(&self) -> &KeyCache<K> {
        &self.keys
    }

    pub fn plaintexts(&self) -> &DecryptionCache {
        &self.plaintexts
    }

    pub fn default_group(&self) -> Option<&DefaultGroup<K>> {
        self.default_group.as_ref()
    }

    /// Group map of the most recent listing
    pub fn groups(&self) -> &GroupMap {
        &self.groups
    }

    pub fn set_groups(&mut self, groups: GroupMap) {
        self.groups = groups;
    }

    /// Pick the personal group out of a listing and decrypt its key
    ///
    /// The key is decrypted directly with the user key and not cached. When
    /// the listing has no personal group, or its key cannot be opened, the
    /// default group is cleared.
    pub fn update_default_group(&mut self, groups: &GroupMap) {
        let personal = groups.values().find(|group| group.is_personal());

        self.default_group = personal.and_then(|group| {
            let id = group.group_id?;
            let encrypted = group.encrypted_private_key.as_deref()?;
            match self.user_key.decrypt_private_key(encrypted) {
                Ok(key) => Some(DefaultGroup { id, key }),
                Err(e) => {
                    tracing::warn!(group_id = id, "failed to decrypt personal group key: {}", e);
                    None
                }
            }
        });

        match &self.default_group {
            Some(group) => tracing::debug!(group_id = group.id, "default group updated"),
            None => tracing::debug!("no default group in listing"),
        }
    }

    /// Key that opens `secret`, walking its group path
    pub fn resolve_key(&mut self, secret: &Secret) -> Result<&K, DecryptError> {
        let path = secret.group_id_path.as_deref().unwrap_or_default();
        resolver::resolve(
            &self.user_key,
            &mut self.keys,
            &mut self.plaintexts,
            path,
            &self.groups,
        )
    }

    /// Decode one secret in place against the current group map
    pub fn decode_secret(&mut self, secret: &mut Secret) -> Result<(), DecryptError> {
        let path = secret.group_id_path.as_deref().unwrap_or_default();
        let key = resolver::resolve(
            &self.user_key,
            &mut self.keys,
            &mut self.plaintexts,
            path,
            &self.groups,
        )?;
        decoder::decode(secret, key, &mut self.plaintexts)
    }

    /// Decode every secret of a listing, stopping at the first failure
    pub fn decode_all(&mut self, secrets: &mut BTreeMap<i32, Secret>) -> Result<(), DecryptError> {
        for (secret_id, secret) in secrets.iter_mut() {
            if let Err(e) = self.decode_secret(secret) {
                tracing::warn!(secret_id, "failed to decode secret: {}", e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Drop every decrypted key and plaintext
    pub fn logout(&mut self) {
        self.keys.clear();
        self.plaintexts.clear();
        self.default_group = None;
        self.groups.clear();
    }
}
