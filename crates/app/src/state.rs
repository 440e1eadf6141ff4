use std::fs;
use std::path::{Path, PathBuf};

use client::ClientConfig;
use common::prelude::{KeyError, SecretKey};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "vault";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Account the key belongs to
    pub username: String,
    /// Server endpoint and device identity
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            client: ClientConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the vault directory (~/.vault)
    pub vault_dir: PathBuf,
    /// Path to the user key description
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the vault directory path (custom or default ~/.vault)
    pub fn vault_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Create the vault directory with its config and key files
    ///
    /// Writes `key` when given, otherwise a freshly generated key.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: AppConfig,
        key: Option<SecretKey>,
    ) -> Result<Self, StateError> {
        let vault_dir = Self::vault_dir(custom_path)?;

        if vault_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized(vault_dir));
        }

        fs::create_dir_all(&vault_dir)?;

        let key = key.unwrap_or_else(SecretKey::generate);
        let key_path = vault_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_description())?;

        let config_path = vault_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        tracing::debug!(path = %vault_dir.display(), "initialized vault directory");

        Ok(Self {
            vault_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the vault directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let vault_dir = Self::vault_dir(custom_path)?;

        if !vault_dir.is_dir() {
            return Err(StateError::NotInitialized(vault_dir));
        }

        let key_path = vault_dir.join(KEY_FILE_NAME);
        let config_path = vault_dir.join(CONFIG_FILE_NAME);
        for (path, name) in [(&config_path, CONFIG_FILE_NAME), (&key_path, KEY_FILE_NAME)] {
            if !path.is_file() {
                return Err(StateError::MissingFile(name));
            }
        }

        let config = toml::from_str(&fs::read_to_string(&config_path)?)?;

        Ok(Self {
            vault_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the user key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        read_key_file(&self.key_path)
    }
}

/// Read a key description from an arbitrary file, for importing on init
pub fn read_key_file(path: &Path) -> Result<SecretKey, StateError> {
    let description = fs::read_to_string(path)?;
    Ok(SecretKey::from_description(description.trim())?)
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("no vault at {}; run `vault init` first", .0.display())]
    NotInitialized(PathBuf),

    #[error("a vault is already set up at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("cannot locate a home directory")]
    NoHomeDirectory,

    #[error("vault directory is missing {0}")]
    MissingFile(&'static str),

    #[error("key file does not hold a usable key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode config: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
