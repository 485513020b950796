/**
 * Cryptographic types and operations.
 *  - Identity keypairs
 *  - Per-recipient key wrapping
 *  - Content encryption with a per-file symmetric key
 */
pub mod crypto;
/**
 * Explicit request for named content, produced
 *  by parsing sync metadata and consumed by
 *  whatever transport fetches the content.
 */
pub mod fetch;
/**
 * Private key storage. Key stores hand out
 *  handles that decrypt wrapped keys without
 *  exposing raw private key material.
 */
pub mod keystore;
/**
 * The sync metadata record: a file's logical
 *  name plus one wrapped key per recipient.
 */
pub mod sync_metadata;
/**
 * Generic nested type-length-value codec.
 */
pub mod tlv;

pub mod prelude {
    pub use crate::crypto::{Iv, PublicKey, SecretKey, SymmetricKey};
    pub use crate::fetch::{Access, FetchRequest};
    pub use crate::keystore::{FileKeyStore, KeyStore, MemoryKeyStore};
    pub use crate::sync_metadata::{parse, Context, Identity, MatchPolicy, SyncMetadata};
    pub use crate::tlv::{DecodeError, Decoder, Encoder};
}
