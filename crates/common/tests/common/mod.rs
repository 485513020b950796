//! Shared test utilities for sync metadata integration tests
#![allow(dead_code)]

use common::crypto::{Iv, SecretKey, SymmetricKey};
use common::keystore::MemoryKeyStore;
use common::sync_metadata::{Identity, SyncMetadata};

/// Install a test subscriber once; honors `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A named participant with their own keypair
pub struct Party {
    pub identity: Identity,
    pub secret: SecretKey,
}

impl Party {
    pub fn new(name: &str) -> Self {
        Self {
            identity: Identity::new(name, format!("/{}/KEY/1", name)),
            secret: SecretKey::generate(),
        }
    }

    /// A key store holding only this party's key
    pub fn key_store(&self) -> MemoryKeyStore {
        let store = MemoryKeyStore::new();
        store.insert(self.identity.key_name.clone(), self.secret.clone());
        store
    }
}

/// Seal `key` for every party and encode the record
pub fn seal_for(name: &str, key: &SymmetricKey, iv: Option<Iv>, parties: &[&Party]) -> Vec<u8> {
    let recipients: Vec<_> = parties
        .iter()
        .map(|p| (p.identity.name.clone(), p.secret.public()))
        .collect();
    SyncMetadata::seal(name, key, iv, &recipients)
        .unwrap()
        .encode()
}
