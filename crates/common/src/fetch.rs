//! The outcome of parsing sync metadata: which name to fetch, and whether
//! the caller can decrypt what comes back.

use crate::crypto::{CryptoError, Iv, SymmetricKey};

/// Whether the current identity holds a key for the content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted(SymmetricKey),
    /// No recipient entry matched the current identity
    NotAuthorized,
}

impl Access {
    pub fn key(&self) -> Option<&SymmetricKey> {
        match self {
            Access::Granted(key) => Some(key),
            Access::NotAuthorized => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("not authorized to decrypt {0:?}")]
    NotAuthorized(String),
    #[error("no IV in the recipient entry and none supplied")]
    MissingIv,
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Request for a named piece of content
///
/// Produced by [`crate::sync_metadata::parse`] and handed to whatever
/// fetches the content. The fetch itself happens elsewhere; once the
/// ciphertext is in hand, [`FetchRequest::open`] decrypts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    name: String,
    access: Access,
    iv: Option<Iv>,
}

impl FetchRequest {
    pub fn new(name: impl Into<String>, access: Access, iv: Option<Iv>) -> Self {
        Self {
            name: name.into(),
            access,
            iv,
        }
    }

    pub fn not_authorized(name: impl Into<String>) -> Self {
        Self::new(name, Access::NotAuthorized, None)
    }

    /// Logical name of the content to fetch
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> &Access {
        &self.access
    }

    /// The recovered symmetric key, `None` when not authorized
    pub fn key(&self) -> Option<&SymmetricKey> {
        self.access.key()
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self.access, Access::Granted(_))
    }

    /// IV carried by the matching recipient entry, if it had one
    pub fn iv(&self) -> Option<&Iv> {
        self.iv.as_ref()
    }

    /// Decrypt fetched `ciphertext`
    ///
    /// `iv_override` takes precedence over the IV from the recipient entry.
    ///
    /// # Errors
    ///
    /// * `OpenError::NotAuthorized` - no key was recovered for this request
    /// * `OpenError::MissingIv` - neither an override nor an entry IV is available
    /// * `OpenError::Crypto` - bad IV length, padding or integrity failure
    pub fn open(&self, iv_override: Option<&[u8]>, ciphertext: &[u8]) -> Result<Vec<u8>, OpenError> {
        let key = self
            .key()
            .ok_or_else(|| OpenError::NotAuthorized(self.name.clone()))?;
        let iv = match (iv_override, self.iv.as_ref()) {
            (Some(iv), _) => iv,
            (None, Some(iv)) => iv.bytes(),
            (None, None) => return Err(OpenError::MissingIv),
        };
        Ok(key.decrypt(iv, ciphertext)?)
    }
}
