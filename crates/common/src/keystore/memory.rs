use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{KeyStore, KeyStoreError, PrivateKeyHandle};
use crate::crypto::SecretKey;

/// In-memory key store, keyed by key name
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    keys: Arc<RwLock<HashMap<String, SecretKey>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `secret` under `name`, replacing any previous key
    pub fn insert(&self, name: impl Into<String>, secret: SecretKey) {
        self.keys.write().insert(name.into(), secret);
    }

    pub fn remove(&self, name: &str) -> Option<SecretKey> {
        self.keys.write().remove(name)
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

impl KeyStore for MemoryKeyStore {
    fn key_handle(&self, name: &str) -> Result<PrivateKeyHandle, KeyStoreError> {
        self.keys
            .read()
            .get(name)
            .map(|secret| PrivateKeyHandle::new(name, secret.clone()))
            .ok_or_else(|| KeyStoreError::NotFound(name.to_string()))
    }
}
