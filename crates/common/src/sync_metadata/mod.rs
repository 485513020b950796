//! Sync metadata records
//!
//! A sync metadata record names one encrypted file and carries a copy of
//! the file's symmetric key wrapped for every recipient:
//!
//! ```text
//! SyncMetadata (999)
//!   Name (100)               UTF-8 logical file name
//!   RecipientEntry (104)     one per recipient
//!     RecipientId (101)      UTF-8 identity name
//!     WrappedKey (102)       ephemeral public key || AES-KW(file key)
//!     Iv (105)               optional, 16 bytes
//! ```
//!
//! Readers go through [`parse`], which only unwraps the entry addressed
//! to the caller. [`SyncMetadata`] is the owned form used by publishers
//! and by tooling that needs to see every entry.

mod parser;

pub use parser::parse;

use crate::crypto::{Iv, PublicKey, SecretShare, SecretShareError, SymmetricKey};
use crate::keystore::KeyStore;
use crate::tlv::{DecodeError, Encoder};

/// Record type codes
pub mod types {
    pub const NAME: u64 = 100;
    pub const RECIPIENT_ID: u64 = 101;
    pub const WRAPPED_KEY: u64 = 102;
    pub const RECIPIENT_ENTRY: u64 = 104;
    pub const IV: u64 = 105;
    pub const SYNC_METADATA: u64 = 999;
}

/// Who is reading the metadata
///
/// `name` is matched against recipient ids; `key_name` selects the
/// private key in the key store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub key_name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, key_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_name: key_name.into(),
        }
    }
}

/// How much of the record [`parse`] validates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Stop looking at entries once ours is found. Later entries are
    /// skipped by their declared length, and once the name is also known
    /// the rest of the record is not read at all.
    #[default]
    MatchAndStop,
    /// Open and validate every entry, even after a match.
    ValidateAll,
}

/// Everything [`parse`] needs besides the bytes
#[derive(Debug)]
pub struct Context<'a, K: KeyStore + ?Sized> {
    pub identity: &'a Identity,
    pub key_store: &'a K,
    pub policy: MatchPolicy,
}

impl<K: KeyStore + ?Sized> Clone for Context<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: KeyStore + ?Sized> Copy for Context<'_, K> {}

impl<'a, K: KeyStore + ?Sized> Context<'a, K> {
    pub fn new(identity: &'a Identity, key_store: &'a K) -> Self {
        Self {
            identity,
            key_store,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// One recipient's copy of the file key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientEntry {
    pub recipient: String,
    pub wrapped_key: Vec<u8>,
    pub iv: Option<Iv>,
}

impl RecipientEntry {
    fn encode_into(&self, encoder: &mut Encoder) {
        encoder.write_nested(types::RECIPIENT_ENTRY, |entry| {
            entry.write_blob(types::RECIPIENT_ID, self.recipient.as_bytes());
            entry.write_blob(types::WRAPPED_KEY, &self.wrapped_key);
            if let Some(iv) = &self.iv {
                entry.write_blob(types::IV, iv.bytes());
            }
        });
    }
}

/// Owned sync metadata record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMetadata {
    pub name: String,
    pub recipients: Vec<RecipientEntry>,
}

impl SyncMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recipients: Vec::new(),
        }
    }

    pub fn add_recipient(&mut self, entry: RecipientEntry) -> &mut Self {
        self.recipients.push(entry);
        self
    }

    /// First entry addressed to `recipient`
    pub fn recipient(&self, recipient: &str) -> Option<&RecipientEntry> {
        self.recipients.iter().find(|e| e.recipient == recipient)
    }

    /// Build the record for a file encrypted under `key`
    ///
    /// `key` is wrapped separately for each `(recipient id, public key)`
    /// pair. When `iv` is given every entry carries it.
    ///
    /// # Errors
    ///
    /// Returns an error if a recipient's public key cannot be used for
    /// key agreement.
    pub fn seal(
        name: impl Into<String>,
        key: &SymmetricKey,
        iv: Option<Iv>,
        recipients: &[(String, PublicKey)],
    ) -> Result<Self, SecretShareError> {
        let mut metadata = Self::new(name);
        for (recipient, public_key) in recipients {
            let share = SecretShare::new(key, public_key)?;
            metadata.add_recipient(RecipientEntry {
                recipient: recipient.clone(),
                wrapped_key: share.into(),
                iv,
            });
        }
        tracing::debug!(
            "sealed {:?} for {} recipients",
            metadata.name,
            metadata.recipients.len()
        );
        Ok(metadata)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_nested(types::SYNC_METADATA, |metadata| {
            metadata.write_blob(types::NAME, self.name.as_bytes());
            for entry in &self.recipients {
                entry.encode_into(metadata);
            }
        });
        encoder.finish()
    }

    /// Decode and validate the whole record, keeping every entry
    ///
    /// Nothing is unwrapped.
    pub fn decode(input: &[u8]) -> Result<Self, DecodeError> {
        parser::decode_all(input)
    }
}
