//! Content encryption using AES-CBC
//!
//! Every shared file is encrypted once under its own `SymmetricKey`. The
//! ciphertext format is AES-CBC with PKCS#7 padding over
//! `blake3(plaintext) (32 bytes) || plaintext`, so tampering with any
//! ciphertext byte is detected rather than yielding altered plaintext.
//!
//! This framing is not optional. Content from a publisher that encrypts
//! with bare AES-CBC/PKCS#7 (no digest prefix) cannot be opened here and
//! fails with [`CryptoError::PaddingOrIntegrity`].

use std::ops::Deref;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;
/// Size of a CBC initialization vector in bytes
pub const IV_SIZE: usize = BLOCK_SIZE;
/// Size of BLAKE3 hash in bytes (256 bits)
pub const BLAKE3_HASH_SIZE: usize = 32;
/// Key length used for freshly generated keys (AES-256)
pub const DEFAULT_KEY_SIZE: usize = 32;

/// Errors that can occur during content encryption/decryption
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length {0}, expected 16, 24 or 32 bytes")]
    InvalidKeyLength(usize),
    #[error("invalid IV length {0}, expected 16 bytes")]
    InvalidIv(usize),
    /// Wrong key, wrong IV, or the ciphertext was modified.
    #[error("ciphertext failed padding or integrity check")]
    PaddingOrIntegrity,
}

/// A CBC initialization vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Deref for Iv {
    type Target = [u8; IV_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; IV_SIZE]> for Iv {
    fn from(bytes: [u8; IV_SIZE]) -> Self {
        Iv(bytes)
    }
}

impl Iv {
    /// Generate a new random IV
    pub fn generate() -> Self {
        let mut buff = [0; IV_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create an IV from a byte slice
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidIv`] unless the slice is exactly `IV_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CryptoError> {
        if data.len() != IV_SIZE {
            return Err(CryptoError::InvalidIv(data.len()));
        }
        let mut buff = [0; IV_SIZE];
        buff.copy_from_slice(data);
        Ok(Self(buff))
    }

    /// Parse an IV from a hexadecimal string
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|_| CryptoError::InvalidIv(hex.len() / 2))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// A per-file AES key
///
/// Accepts the three AES key sizes (16, 24 or 32 bytes); any other length
/// is rejected when the key is constructed, so a `SymmetricKey` is always
/// usable for both directions.
///
/// # Examples
///
/// ```ignore
/// let key = SymmetricKey::generate();
/// let iv = Iv::generate();
///
/// let ciphertext = key.encrypt(&iv, b"hello world")?;
/// let plaintext = key.decrypt(iv.bytes(), &ciphertext)?;
/// assert_eq!(plaintext, b"hello world");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey(Vec<u8>);

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey(<{} bytes>)", self.0.len())
    }
}

impl SymmetricKey {
    /// Generate a new random AES-256 key
    pub fn generate() -> Self {
        let mut buff = vec![0; DEFAULT_KEY_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a key from raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] unless the slice is 16, 24 or 32 bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CryptoError> {
        match data.len() {
            16 | 24 | 32 => Ok(Self(data.to_vec())),
            len => Err(CryptoError::InvalidKeyLength(len)),
        }
    }

    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encrypt file content
    ///
    /// The BLAKE3 hash of `data` is prepended before encryption and checked
    /// again by [`decrypt`](Self::decrypt).
    pub fn encrypt(&self, iv: &Iv, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let plaintext_hash = blake3::hash(data);

        let mut data_with_hash = Vec::with_capacity(BLAKE3_HASH_SIZE + data.len());
        data_with_hash.extend_from_slice(plaintext_hash.as_bytes());
        data_with_hash.extend_from_slice(data);

        match self.0.len() {
            16 => cbc_encrypt::<Aes128>(&self.0, iv.bytes(), &data_with_hash),
            24 => cbc_encrypt::<Aes192>(&self.0, iv.bytes(), &data_with_hash),
            32 => cbc_encrypt::<Aes256>(&self.0, iv.bytes(), &data_with_hash),
            len => Err(CryptoError::InvalidKeyLength(len)),
        }
    }

    /// Decrypt file content fetched alongside `iv`
    ///
    /// # Errors
    ///
    /// - [`CryptoError::InvalidIv`] if `iv` is not exactly 16 bytes
    /// - [`CryptoError::PaddingOrIntegrity`] if the ciphertext is not a whole
    ///   number of blocks, the padding is invalid, or the embedded plaintext
    ///   hash does not match. Nothing is returned in that case, not even a
    ///   partial plaintext.
    pub fn decrypt(&self, iv: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if iv.len() != IV_SIZE {
            return Err(CryptoError::InvalidIv(iv.len()));
        }
        if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::PaddingOrIntegrity);
        }

        let decrypted = match self.0.len() {
            16 => cbc_decrypt::<Aes128>(&self.0, iv, data),
            24 => cbc_decrypt::<Aes192>(&self.0, iv, data),
            32 => cbc_decrypt::<Aes256>(&self.0, iv, data),
            len => Err(CryptoError::InvalidKeyLength(len)),
        }?;

        if decrypted.len() < BLAKE3_HASH_SIZE {
            return Err(CryptoError::PaddingOrIntegrity);
        }

        let mut stored_hash = [0u8; BLAKE3_HASH_SIZE];
        stored_hash.copy_from_slice(&decrypted[..BLAKE3_HASH_SIZE]);
        let plaintext = &decrypted[BLAKE3_HASH_SIZE..];

        // blake3::Hash equality is constant time
        if blake3::Hash::from(stored_hash) != blake3::hash(plaintext) {
            return Err(CryptoError::PaddingOrIntegrity);
        }

        Ok(plaintext.to_vec())
    }
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: BlockCipher + BlockEncryptMut + KeyInit,
{
    let cipher = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(data))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    let cipher = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| CryptoError::PaddingOrIntegrity)
}
