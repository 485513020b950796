use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::{KeyStore, KeyStoreError, PrivateKeyHandle};
use crate::crypto::SecretKey;

pub const PRIVATE_KEY_EXTENSION: &str = "privkey";
/// Owner read/write only
#[cfg(unix)]
pub const PRIVATE_KEY_MODE: u32 = 0o600;

/// Key store backed by a directory of PEM files
///
/// Each key lives in `<dir>/<hex(sha256(key name))>.privkey`, so arbitrary
/// key names map to safe file names.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the key named `name` is stored at
    pub fn key_path(&self, name: &str) -> PathBuf {
        let digest = Sha256::digest(name.as_bytes());
        self.dir
            .join(hex::encode(digest))
            .with_extension(PRIVATE_KEY_EXTENSION)
    }

    /// Write `secret` under `name`, creating the directory if needed
    pub fn insert(&self, name: &str, secret: &SecretKey) -> Result<PathBuf, KeyStoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.key_path(name);
        write_private(&path, secret.to_pem().as_bytes())?;
        tracing::debug!("stored key {:?} at {}", name, path.display());
        Ok(path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.key_path(name).is_file()
    }
}

/// Create or truncate `path`, readable by the owner only on unix
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(PRIVATE_KEY_MODE);
    let mut file = options.open(path)?;
    // mode only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(PRIVATE_KEY_MODE))?;
    }
    file.write_all(contents)?;
    file.sync_all()
}

impl KeyStore for FileKeyStore {
    fn key_handle(&self, name: &str) -> Result<PrivateKeyHandle, KeyStoreError> {
        if !self.dir.is_dir() {
            return Err(KeyStoreError::BackendUnavailable(std::io::Error::new(
                ErrorKind::NotFound,
                format!("key directory {} does not exist", self.dir.display()),
            )));
        }

        let path = self.key_path(name);
        let pem = match fs::read_to_string(&path) {
            Ok(pem) => pem,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(KeyStoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let secret = SecretKey::from_pem(&pem).map_err(|e| KeyStoreError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(PrivateKeyHandle::new(name, secret))
    }
}
