//! Wrapping a file key for one recipient
//!
//! A share is `ephemeral_public || AES-KW(kek, key)`, where `kek` is the
//! X25519 agreement between a throwaway keypair and the recipient's
//! identity key. The recipient repeats the agreement from the other side
//! with their private key and unwraps.
//!
//! AES Key Wrap (RFC 3394) carries its own integrity check, so unwrapping
//! with the wrong private key fails outright rather than yielding garbage.

use aes_kw::KekAes256;

use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
use super::secret::SymmetricKey;

/// Bytes AES Key Wrap adds to its input (one 64-bit semiblock)
pub const KW_OVERHEAD: usize = 8;
/// AES-KW needs at least two semiblocks of input
const KW_MIN_INPUT: usize = 16;
const MIN_SHARE_SIZE: usize = PUBLIC_KEY_SIZE + KW_MIN_INPUT + KW_OVERHEAD;

#[derive(Debug, thiserror::Error)]
pub enum SecretShareError {
    #[error("wrapped key is {0} bytes, need at least 56")]
    TooShort(usize),
    #[error("wrapped key body is {0} bytes, not a whole number of semiblocks")]
    Misaligned(usize),
    #[error("bad ephemeral key: {0}")]
    EphemeralKey(#[from] KeyError),
    #[error("AES-KW wrap failed for a {0}-byte key")]
    Wrap(usize),
    #[error("AES-KW integrity check failed")]
    Unwrap,
}

/// Key-encryption key both sides of a share agree on
fn agree(ours: &SecretKey, theirs: PublicKey) -> KekAes256 {
    let shared = ours.to_x25519().diffie_hellman(&theirs.to_x25519());
    KekAes256::from(*shared.as_bytes())
}

/// A file key wrapped for a single recipient
///
/// Shares are randomized: wrapping the same key twice for the same
/// recipient gives different bytes. For an AES-256 key a share is 72
/// bytes.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SecretShare(Vec<u8>);

impl TryFrom<&[u8]> for SecretShare {
    type Error = SecretShareError;

    /// Checks the framing only; whether the share opens is up to `recover`.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < MIN_SHARE_SIZE {
            return Err(SecretShareError::TooShort(bytes.len()));
        }
        let body = bytes.len() - PUBLIC_KEY_SIZE;
        if body % KW_OVERHEAD != 0 {
            return Err(SecretShareError::Misaligned(body));
        }
        Ok(Self(bytes.to_vec()))
    }
}

impl From<SecretShare> for Vec<u8> {
    fn from(share: SecretShare) -> Self {
        share.0
    }
}

impl SecretShare {
    pub fn new(key: &SymmetricKey, recipient: &PublicKey) -> Result<Self, SecretShareError> {
        Self::wrap(key.bytes(), recipient)
    }

    /// Wrap arbitrary key material, which must be a valid AES-KW input
    pub(crate) fn wrap(material: &[u8], recipient: &PublicKey) -> Result<Self, SecretShareError> {
        let ephemeral = SecretKey::generate();
        let wrapped = agree(&ephemeral, *recipient)
            .wrap_vec(material)
            .map_err(|_| SecretShareError::Wrap(material.len()))?;

        let mut share = ephemeral.public().to_bytes().to_vec();
        share.extend_from_slice(&wrapped);
        Ok(Self(share))
    }

    /// Unwrap with the recipient's private key
    ///
    /// Returns the raw key bytes; their length is not checked here.
    pub fn recover(&self, recipient: &SecretKey) -> Result<Vec<u8>, SecretShareError> {
        let (ephemeral, wrapped) = self.0.split_at(PUBLIC_KEY_SIZE);
        let ephemeral = PublicKey::try_from(ephemeral)?;
        agree(recipient, ephemeral)
            .unwrap_vec(wrapped)
            .map_err(|_| SecretShareError::Unwrap)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}
