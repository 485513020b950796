use std::path::PathBuf;

use clap::Args;

use common::crypto::{CryptoError, Iv};
use common::fetch::OpenError as DecryptError;
use common::sync_metadata::{parse, Context, MatchPolicy};
use common::tlv::DecodeError;
use ndn_share::state::StateError;

use super::seal::{with_suffix, CONTENT_EXTENSION, METADATA_EXTENSION};

/// Recover the key from sealed metadata and decrypt the content
#[derive(Args, Debug, Clone)]
pub struct Open {
    /// Sync metadata file
    pub metadata: PathBuf,

    /// Encrypted content (default: the metadata path with .meta replaced by .enc)
    #[arg(long)]
    pub content: Option<PathBuf>,

    /// Hex IV, for content sealed with a detached IV
    #[arg(long)]
    pub iv: Option<String>,

    /// Write the plaintext here instead of printing it
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Validate every recipient entry, not just up to ours
    #[arg(long)]
    pub validate_all: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("no --content given and {0} does not end in .meta")]
    NoContentPath(PathBuf),
    #[error("invalid --iv: {0}")]
    InvalidIv(CryptoError),
    #[error("invalid metadata: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Decrypt(#[from] DecryptError),
    #[error("plaintext is not UTF-8, use --out to write it to a file")]
    NotUtf8,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("open task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Open {
    fn content_path(&self) -> Result<PathBuf, OpenError> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }
        let is_metadata = self
            .metadata
            .extension()
            .is_some_and(|ext| ext == METADATA_EXTENSION);
        if !is_metadata {
            return Err(OpenError::NoContentPath(self.metadata.clone()));
        }
        Ok(with_suffix(&self.metadata.with_extension(""), CONTENT_EXTENSION))
    }

    fn policy(&self) -> MatchPolicy {
        if self.validate_all {
            MatchPolicy::ValidateAll
        } else {
            MatchPolicy::MatchAndStop
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Open {
    type Error = OpenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let iv = self
            .iv
            .as_deref()
            .map(Iv::from_hex)
            .transpose()
            .map_err(OpenError::InvalidIv)?;

        let metadata = tokio::fs::read(&self.metadata).await?;
        let ciphertext = tokio::fs::read(self.content_path()?).await?;

        let identity = state.identity();
        let key_store = state.key_store();
        let policy = self.policy();

        // key store reads and decryption block
        let (name, plaintext) = tokio::task::spawn_blocking(move || {
            let ctx = Context::new(&identity, &key_store).with_policy(policy);
            let request = parse(&metadata, &ctx)?;
            let plaintext = request.open(iv.as_ref().map(|iv| iv.bytes()), &ciphertext)?;
            Ok::<_, OpenError>((request.name().to_string(), plaintext))
        })
        .await??;

        tracing::info!("opened {:?} ({} bytes)", name, plaintext.len());

        match &self.out {
            Some(out) => {
                tokio::fs::write(out, &plaintext).await?;
                Ok(format!(
                    "Opened {} ({} bytes) -> {}",
                    name,
                    plaintext.len(),
                    out.display()
                ))
            }
            None => String::from_utf8(plaintext).map_err(|_| OpenError::NotUtf8),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cli::op::{Op, OpContext};
    use crate::cli::ops::seal::Seal;
    use ndn_share::state::{AppConfig, AppState};

    struct Setup {
        _tmp: tempfile::TempDir,
        alice: OpContext,
        bob: OpContext,
        eve: OpContext,
        input: PathBuf,
    }

    /// alice seals a file for bob; eve is initialized but not a recipient
    async fn setup(detached_iv: bool) -> (Setup, String) {
        let tmp = tempfile::tempdir().unwrap();
        let mut alice_state =
            AppState::init(Some(tmp.path().join("alice")), AppConfig::new("/alice")).unwrap();
        let bob_state = AppState::init(Some(tmp.path().join("bob")), AppConfig::new("/bob")).unwrap();
        AppState::init(Some(tmp.path().join("eve")), AppConfig::new("/eve")).unwrap();

        alice_state
            .config
            .contacts
            .insert("/bob".to_string(), bob_state.public_key().unwrap());
        alice_state.save().unwrap();

        let input = tmp.path().join("hello.txt");
        std::fs::write(&input, b"hello world").unwrap();

        let alice = OpContext::new(Some(tmp.path().join("alice")));
        let seal = Seal {
            input: input.clone(),
            name: None,
            recipients: vec!["/bob".to_string()],
            include_self: false,
            detached_iv,
            out: None,
        };
        let output = seal.execute(&alice).await.unwrap();

        let setup = Setup {
            alice,
            bob: OpContext::new(Some(tmp.path().join("bob"))),
            eve: OpContext::new(Some(tmp.path().join("eve"))),
            input,
            _tmp: tmp,
        };
        (setup, output)
    }

    fn open_args(metadata: PathBuf) -> Open {
        Open {
            metadata,
            content: None,
            iv: None,
            out: None,
            validate_all: false,
        }
    }

    #[tokio::test]
    async fn test_bob_opens() {
        let (setup, _) = setup(false).await;
        let open = open_args(with_suffix(&setup.input, METADATA_EXTENSION));

        assert_eq!(open.execute(&setup.bob).await.unwrap(), "hello world");

        let mut strict = open.clone();
        strict.validate_all = true;
        assert_eq!(strict.execute(&setup.bob).await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_others_are_not_authorized() {
        let (setup, _) = setup(false).await;
        let open = open_args(with_suffix(&setup.input, METADATA_EXTENSION));

        // the publisher did not include themselves
        for ctx in [&setup.alice, &setup.eve] {
            assert!(matches!(
                open.execute(ctx).await,
                Err(OpenError::Decrypt(DecryptError::NotAuthorized(_)))
            ));
        }
    }

    #[tokio::test]
    async fn test_detached_iv() {
        let (setup, output) = setup(true).await;
        let iv_hex = output
            .lines()
            .find_map(|line| line.strip_prefix("- IV: "))
            .unwrap()
            .to_string();

        let mut open = open_args(with_suffix(&setup.input, METADATA_EXTENSION));
        assert!(matches!(
            open.execute(&setup.bob).await,
            Err(OpenError::Decrypt(DecryptError::MissingIv))
        ));

        open.iv = Some(iv_hex);
        let out = setup.input.with_extension("out");
        open.out = Some(out.clone());
        open.execute(&setup.bob).await.unwrap();
        assert_eq!(std::fs::read(out).unwrap(), b"hello world");
    }

    #[test]
    fn test_content_path() {
        let open = open_args(PathBuf::from("/tmp/hello.txt.meta"));
        assert_eq!(
            open.content_path().unwrap(),
            PathBuf::from("/tmp/hello.txt.enc")
        );

        let open = open_args(PathBuf::from("/tmp/hello.bin"));
        assert!(matches!(
            open.content_path(),
            Err(OpenError::NoContentPath(_))
        ));
    }
}
