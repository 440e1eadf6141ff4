//! Shared helpers for key hierarchy integration tests
#![allow(dead_code)]

use std::cell::Cell;

use common::codec::to_string;
use common::crypto::{CryptoKey, KeyError, SecretKey};
use common::types::{GroupInfo, GroupMap, Secret, SecretClientData, SecretCriticalData};

thread_local! {
    static DECRYPTS: Cell<usize> = const { Cell::new(0) };
}

/// Decrypts performed by `CountingKey`s on this thread
pub fn decrypts() -> usize {
    DECRYPTS.with(Cell::get)
}

pub fn reset_decrypts() {
    DECRYPTS.with(|count| count.set(0));
}

/// A real `SecretKey` that counts its decrypts
#[derive(Debug)]
pub struct CountingKey(pub SecretKey);

impl CryptoKey for CountingKey {
    fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.0.sign(data)
    }

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.0.encrypt(data)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        DECRYPTS.with(|count| count.set(count.get() + 1));
        self.0.decrypt(data)
    }

    fn from_json(json: &str) -> Result<Self, KeyError> {
        SecretKey::from_json(json).map(CountingKey)
    }

    fn to_json(&self) -> String {
        self.0.to_json()
    }
}

/// A group whose key is sealed for `parent`
pub fn group(id: i32, name: &str, parent: &SecretKey, key: &SecretKey) -> GroupInfo {
    GroupInfo {
        group_id: Some(id),
        auto_delete: Some(false),
        name: Some(name.to_string()),
        encrypted_private_key: Some(parent.encrypt_text(&key.to_json()).unwrap()),
    }
}

/// A secret sealed for `key`, reachable through `path`
pub fn secret(id: i32, path: &[i32], key: &SecretKey, title: &str, password: &str) -> Secret {
    let client = SecretClientData {
        kind: Some("manual".to_string()),
        title: Some(title.to_string()),
        login_url: Some(format!("https://{}.example.com", title)),
        ..Default::default()
    };
    let critical = SecretCriticalData {
        password: Some(password.to_string()),
        ..Default::default()
    };
    Secret {
        secret_id: Some(id),
        group_id_path: Some(path.to_vec()),
        encrypted_client_data: Some(key.encrypt_text(&to_string(&client).unwrap()).unwrap()),
        encrypted_critical_data: Some(key.encrypt_text(&to_string(&critical).unwrap()).unwrap()),
        ..Default::default()
    }
}

/// User key, personal group 1, team group 2 under it, and their keys
pub struct Hierarchy {
    pub user: SecretKey,
    pub personal: SecretKey,
    pub team: SecretKey,
    pub groups: GroupMap,
}

pub fn hierarchy() -> Hierarchy {
    let user = SecretKey::generate();
    let personal = SecretKey::generate();
    let team = SecretKey::generate();
    let groups = GroupMap::from([
        (1, group(1, "", &user, &personal)),
        (2, group(2, "engineering", &personal, &team)),
    ]);
    Hierarchy {
        user,
        personal,
        team,
        groups,
    }
}
