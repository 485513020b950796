//! Identity keypairs
//!
//! Every recipient owns an Ed25519 keypair. The public half is what a
//! publisher wraps file keys against; the private half stays in a key
//! store. Both halves convert to X25519 for the key agreement step of
//! key wrapping.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

pub const PRIVATE_KEY_SIZE: usize = 32;
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Tag of the PEM block a private key is stored in
const PEM_TAG: &str = "PRIVATE KEY";

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Decode exactly `N` bytes of (optionally `0x`-prefixed) hex
fn decode_hex<const N: usize>(hex: &str, what: &str) -> Result<[u8; N], KeyError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut bytes = [0u8; N];
    hex::decode_to_slice(hex, &mut bytes)
        .map_err(|e| anyhow::anyhow!("{} is not {} bytes of hex: {}", what, N, e))?;
    Ok(bytes)
}

/// A recipient's public identity key
///
/// Publishers need one per recipient they list. Serialized as hex so it
/// can sit in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(VerifyingKey);

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: &[u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            anyhow::anyhow!(
                "public key must be {} bytes, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )
        })?;
        Self::from_bytes(bytes)
    }
}

impl PublicKey {
    /// Rejects encodings that are not a point on the curve
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_SIZE]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| anyhow::anyhow!("not a valid public key: {}", e).into())
    }

    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        Self::from_bytes(&decode_hex::<PUBLIC_KEY_SIZE>(hex, "public key")?)
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Montgomery form of the key, for X25519 key agreement
    ///
    /// Infallible: the point was already validated when the key was built.
    pub(crate) fn to_x25519(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0.to_montgomery().to_bytes())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        PublicKey::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// A private identity key
///
/// Normally only a key store holds one; the parser reaches it through a
/// [`PrivateKeyHandle`](crate::keystore::PrivateKeyHandle). `Debug` shows
/// the public half only.
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretKey").field(&self.public()).finish()
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(secret: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(SigningKey::from_bytes(&secret))
    }
}

impl SecretKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
        Self::from(bytes)
    }

    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// PEM block tagged `PRIVATE KEY` holding the raw 32-byte seed
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(PEM_TAG, self.0.to_bytes()))
    }

    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let block = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("malformed PEM: {}", e))?;
        if block.tag() != PEM_TAG {
            return Err(anyhow::anyhow!(
                "expected a {:?} PEM block, found {:?}",
                PEM_TAG,
                block.tag()
            )
            .into());
        }
        let seed: [u8; PRIVATE_KEY_SIZE] = block.contents().try_into().map_err(|_| {
            anyhow::anyhow!(
                "private key must be {} bytes, got {}",
                PRIVATE_KEY_SIZE,
                block.contents().len()
            )
        })?;
        Ok(Self::from(seed))
    }

    /// X25519 secret pairing with [`PublicKey::to_x25519`]
    pub(crate) fn to_x25519(&self) -> StaticSecret {
        StaticSecret::from(self.0.to_scalar_bytes())
    }
}
