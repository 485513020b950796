//! Cryptographic primitives for ndn-share
//!
//! - **Identity**: Ed25519 keypairs (`SecretKey`/`PublicKey`) identify a
//!   recipient and are the target of key wrapping
//! - **Content Encryption**: AES-CBC with PKCS#7 padding under a per-file
//!   `SymmetricKey`, with a BLAKE3 digest of the plaintext carried inside the
//!   ciphertext for integrity
//! - **Key Wrapping**: ECDH over the X25519 form of the recipient's key,
//!   followed by AES Key Wrap of the file key
//!
//! # Sharing a file
//!
//! 1. Generate a random `SymmetricKey` and `Iv`, encrypt the file once
//! 2. For each recipient, wrap the key into a `SecretShare` against their `PublicKey`
//! 3. Publish the shares with the file name in a sync metadata record
//!
//! A recipient recovers the key with the private half of their identity
//! (through a key store handle) and decrypts the fetched content.

mod keys;
mod secret;
mod secret_share;

pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use secret::{
    CryptoError, Iv, SymmetricKey, BLAKE3_HASH_SIZE, BLOCK_SIZE, DEFAULT_KEY_SIZE, IV_SIZE,
};
pub use secret_share::{SecretShare, SecretShareError, KW_OVERHEAD};
