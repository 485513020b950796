//! Private key storage and key unwrapping
//!
//! A [`KeyStore`] maps a key name to a [`PrivateKeyHandle`]. The handle
//! decrypts wrapped keys on behalf of its owner; the private key itself
//! never leaves the handle.
//!
//! Key stores are read-only from the point of view of this crate and may
//! block on I/O, so callers running inside an async runtime should drive
//! [`unwrap_key`] from a blocking context.

mod file;
mod memory;

pub use file::FileKeyStore;
pub use memory::MemoryKeyStore;

use std::fmt::Debug;

use crate::crypto::{CryptoError, PublicKey, SecretKey, SecretShare, SecretShareError, SymmetricKey};

#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("no key named {0:?} in key store")]
    NotFound(String),
    /// The backing storage could not be read
    #[error("key store unavailable: {0}")]
    BackendUnavailable(#[from] std::io::Error),
    /// A key exists under this name but could not be loaded
    #[error("stored key {name:?} is corrupt: {reason}")]
    Corrupt { name: String, reason: String },
}

/// Errors that can occur while recovering a wrapped symmetric key
#[derive(Debug, thiserror::Error)]
pub enum UnwrapError {
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
    /// The wrapped key was malformed, or was not wrapped for this private key
    #[error("failed to decrypt wrapped key: {0}")]
    Share(#[from] SecretShareError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Opaque handle to a private key held by a key store
#[derive(Debug, Clone)]
pub struct PrivateKeyHandle {
    name: String,
    secret: SecretKey,
}

impl PrivateKeyHandle {
    pub(crate) fn new(name: impl Into<String>, secret: SecretKey) -> Self {
        Self {
            name: name.into(),
            secret,
        }
    }

    /// Name the handle was looked up under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public()
    }

    /// Decrypt a wrapped key blob, returning the raw key bytes
    pub fn decrypt(&self, wrapped: &[u8]) -> Result<Vec<u8>, SecretShareError> {
        SecretShare::try_from(wrapped)?.recover(&self.secret)
    }
}

/// Source of private key handles
pub trait KeyStore: Send + Sync + Debug {
    /// Look up the private key stored under `name`
    ///
    /// # Errors
    ///
    /// * `KeyStoreError::NotFound` - no key is stored under `name`
    /// * `KeyStoreError::BackendUnavailable` - the storage backend failed
    /// * `KeyStoreError::Corrupt` - the stored key could not be parsed
    fn key_handle(&self, name: &str) -> Result<PrivateKeyHandle, KeyStoreError>;
}

impl<K: KeyStore + ?Sized> KeyStore for &K {
    fn key_handle(&self, name: &str) -> Result<PrivateKeyHandle, KeyStoreError> {
        (**self).key_handle(name)
    }
}

/// Recover the symmetric key wrapped in `wrapped` with the private key
/// stored under `key_name`.
///
/// May block on the key store.
///
/// # Errors
///
/// * `UnwrapError::KeyStore` - the private key could not be retrieved
/// * `UnwrapError::Share` - the blob is malformed or not wrapped for this key
/// * `UnwrapError::Crypto` - the recovered bytes are not a valid AES key length
pub fn unwrap_key<K>(wrapped: &[u8], key_name: &str, key_store: &K) -> Result<SymmetricKey, UnwrapError>
where
    K: KeyStore + ?Sized,
{
    let handle = key_store.key_handle(key_name)?;
    let raw = handle.decrypt(wrapped).inspect_err(|e| {
        tracing::warn!("failed to decrypt wrapped key with {:?}: {}", key_name, e);
    })?;
    let key = SymmetricKey::from_slice(&raw)?;
    tracing::debug!("unwrapped {}-byte symmetric key with {:?}", key.len(), key_name);
    Ok(key)
}
