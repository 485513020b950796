use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Args;

use common::crypto::{CryptoError, Iv, KeyError, PublicKey, SecretShareError, SymmetricKey};
use common::sync_metadata::SyncMetadata;
use ndn_share::state::{AppState, StateError};

pub const METADATA_EXTENSION: &str = "meta";
pub const CONTENT_EXTENSION: &str = "enc";

/// `<path>.<extension>`, keeping any extension `path` already has
pub fn with_suffix(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Encrypt a file once and wrap its key for each recipient
#[derive(Args, Debug, Clone)]
pub struct Seal {
    /// File to encrypt
    pub input: PathBuf,

    /// Logical name to publish the file under (default: <identity>/<file name>)
    #[arg(long)]
    pub name: Option<String>,

    /// Recipient, either a contact name or NAME=PUBLIC_KEY_HEX (repeatable)
    #[arg(long = "to", required = true)]
    pub recipients: Vec<String>,

    /// Add our own identity to the recipients
    #[arg(long)]
    pub include_self: bool,

    /// Leave the IV out of the metadata and print it instead
    #[arg(long)]
    pub detached_iv: bool,

    /// Output path prefix; writes <out>.meta and <out>.enc (default: the input path)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("unknown contact {0:?}, add it with 'ndn-share contact add' or pass NAME=PUBLIC_KEY_HEX")]
    UnknownContact(String),
    #[error("invalid public key for {0:?}: {1}")]
    InvalidKey(String, KeyError),
    #[error("cannot derive a logical name from {0}")]
    NoName(PathBuf),
    #[error("encryption failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error("key wrapping failed: {0}")]
    Share(#[from] SecretShareError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sealing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Seal {
    fn resolve_recipients(&self, state: &AppState) -> Result<Vec<(String, PublicKey)>, SealError> {
        let mut recipients = Vec::with_capacity(self.recipients.len() + 1);
        for recipient in &self.recipients {
            let resolved = match recipient.split_once('=') {
                Some((name, hex)) => {
                    let key = PublicKey::from_hex(hex)
                        .map_err(|e| SealError::InvalidKey(name.to_string(), e))?;
                    (name.to_string(), key)
                }
                None => {
                    let key = state
                        .config
                        .contacts
                        .get(recipient)
                        .ok_or_else(|| SealError::UnknownContact(recipient.clone()))?;
                    (recipient.clone(), *key)
                }
            };
            recipients.push(resolved);
        }
        if self.include_self {
            recipients.push((state.config.identity.clone(), state.public_key()?));
        }
        Ok(recipients)
    }

    fn logical_name(&self, state: &AppState) -> Result<String, SealError> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        let file_name = self
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SealError::NoName(self.input.clone()))?;
        Ok(format!(
            "{}/{}",
            state.config.identity.trim_end_matches('/'),
            file_name
        ))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Seal {
    type Error = SealError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let recipients = self.resolve_recipients(&state)?;
        let name = self.logical_name(&state)?;
        let plaintext = tokio::fs::read(&self.input).await?;

        let embed_iv = !self.detached_iv;
        let (metadata, ciphertext, iv) = tokio::task::spawn_blocking(move || {
            let key = SymmetricKey::generate();
            let iv = Iv::generate();
            let ciphertext = key.encrypt(&iv, &plaintext)?;
            let metadata = SyncMetadata::seal(name, &key, embed_iv.then_some(iv), &recipients)?;
            Ok::<_, SealError>((metadata, ciphertext, iv))
        })
        .await??;

        let out = self.out.clone().unwrap_or_else(|| self.input.clone());
        let metadata_path = with_suffix(&out, METADATA_EXTENSION);
        let content_path = with_suffix(&out, CONTENT_EXTENSION);
        tokio::fs::write(&metadata_path, metadata.encode()).await?;
        tokio::fs::write(&content_path, &ciphertext).await?;

        let recipient_names: Vec<&str> = metadata
            .recipients
            .iter()
            .map(|e| e.recipient.as_str())
            .collect();
        tracing::info!(
            "sealed {:?} for {} recipients",
            metadata.name,
            recipient_names.len()
        );

        let mut output = format!(
            "Sealed {}\n\
             - Metadata: {}\n\
             - Content: {}\n\
             - Recipients: {}",
            metadata.name,
            metadata_path.display(),
            content_path.display(),
            recipient_names.join(", "),
        );
        if self.detached_iv {
            output.push_str(&format!("\n- IV: {}", iv.to_hex()));
        }
        Ok(output)
    }
}
