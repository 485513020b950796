use std::collections::BTreeMap;
use std::str::FromStr;
use std::{fs, path::PathBuf};

use common::crypto::PublicKey;
use common::keystore::{FileKeyStore, KeyStore, KeyStoreError};
use common::prelude::{Identity, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

pub const APP_NAME: &str = "ndn-share";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEYS_DIR_NAME: &str = "keys";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name other people list us under in recipient entries
    pub identity: String,
    /// Name of our private key in the key store
    pub key_name: String,
    /// Default log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Also write daily log files here when set
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Known recipients, by identity name
    #[serde(default)]
    pub contacts: BTreeMap<String, PublicKey>,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Key name used when none is given: `<identity>/KEY/1`
pub fn default_key_name(identity: &str) -> String {
    format!("{}/KEY/1", identity.trim_end_matches('/'))
}

impl AppConfig {
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            key_name: default_key_name(&identity),
            identity,
            log_level: default_log_level(),
            log_dir: None,
            contacts: BTreeMap::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.identity.clone(), self.key_name.clone())
    }

    pub fn log_level(&self) -> Result<LevelFilter, StateError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| StateError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.ndn-share)
    pub state_dir: PathBuf,
    /// Path to the private key directory
    pub keys_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.ndn-share)
    pub fn state_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory and generate our identity key
    pub fn init(custom_path: Option<PathBuf>, config: AppConfig) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let keys_path = state_dir.join(KEYS_DIR_NAME);
        fs::create_dir_all(&keys_path)?;

        let key = SecretKey::generate();
        FileKeyStore::new(&keys_path).insert(&config.key_name, &key)?;

        let state = Self {
            state_dir,
            keys_path,
            config_path,
            config,
        };
        state.save()?;
        tracing::info!(
            "initialized {} as {:?}",
            state.state_dir.display(),
            state.config.identity
        );
        Ok(state)
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;

        if !state_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let keys_path = state_dir.join(KEYS_DIR_NAME);
        let config_path = state_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        if !keys_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", KEYS_DIR_NAME)));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            state_dir,
            keys_path,
            config_path,
            config,
        })
    }

    /// Write the current config back to disk
    pub fn save(&self) -> Result<(), StateError> {
        let config_toml = toml::to_string_pretty(&self.config)?;
        fs::write(&self.config_path, config_toml)?;
        Ok(())
    }

    pub fn key_store(&self) -> FileKeyStore {
        FileKeyStore::new(&self.keys_path)
    }

    pub fn identity(&self) -> Identity {
        self.config.identity()
    }

    /// Public half of our identity key
    pub fn public_key(&self) -> Result<PublicKey, StateError> {
        let handle = self.key_store().key_handle(&self.config.key_name)?;
        Ok(handle.public_key())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("ndn-share directory not initialized. Run 'ndn-share init' first")]
    NotInitialized,

    #[error("ndn-share directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid log level: {0:?}")]
    InvalidLogLevel(String),

    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_init_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("state");

        let state = AppState::init(Some(dir.clone()), AppConfig::new("/alice")).unwrap();
        assert_eq!(state.config.key_name, "/alice/KEY/1");
        assert!(state.keys_path.is_dir());
        assert!(state.config_path.is_file());

        let loaded = AppState::load(Some(dir)).unwrap();
        assert_eq!(loaded.config, state.config);
        assert_eq!(loaded.public_key().unwrap(), state.public_key().unwrap());
        assert_eq!(loaded.identity(), Identity::new("/alice", "/alice/KEY/1"));
    }

    #[test]
    fn test_init_twice() {
        let tmp = tempfile::tempdir().unwrap();
        AppState::init(Some(tmp.path().to_path_buf()), AppConfig::new("alice")).unwrap();
        assert!(matches!(
            AppState::init(Some(tmp.path().to_path_buf()), AppConfig::new("alice")),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(tmp.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
        assert!(matches!(
            AppState::load(Some(tmp.path().to_path_buf())),
            Err(StateError::MissingFile(_))
        ));
    }

    #[test]
    fn test_contacts_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = AppState::init(Some(tmp.path().to_path_buf()), AppConfig::new("alice")).unwrap();

        let bob = SecretKey::generate().public();
        state.config.contacts.insert("bob".to_string(), bob);
        state.save().unwrap();

        let loaded = AppState::load(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.config.contacts.get("bob"), Some(&bob));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            identity = "carol"
            key_name = "/carol/KEY/7"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_level().unwrap(), LevelFilter::INFO);
        assert!(config.log_dir.is_none());
        assert!(config.contacts.is_empty());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::new("carol");
        config.log_level = "loud".to_string();
        assert!(matches!(
            config.log_level(),
            Err(StateError::InvalidLogLevel(level)) if level == "loud"
        ));
    }
}
