use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reclaim_core::ProviderCredentials;
use tokio::sync::Mutex;
use reclaim_crypto::{CryptoError, MasterKey, SealedJson, generate_master_key, parse_master_key};
use tracing::{debug, warn};

use crate::credentials::{CredentialStore, CredentialSupplier};
use crate::error::CredentialError;

/// Encrypted credentials file inside the store directory.
pub const CREDENTIALS_FILE: &str = "credentials.enc";
/// Generated master key, used when no key is supplied explicitly.
pub const KEY_FILE: &str = ".key";

const KID: &str = "local";

/// Credentials persisted as a single AES-256-GCM envelope on disk.
///
/// A file that exists but cannot be decrypted or parsed (for instance
/// because the key changed) loads as absent, the same as a missing file.
/// Other read errors are reported.
///
/// Writes go through a temp file and a rename. `save` and `clear` hold
/// `write_lock` so overlapping writers never rename each other's temp file.
#[derive(Debug)]
pub struct EncryptedFileCredentialStore {
    dir: PathBuf,
    sealer: SealedJson,
    write_lock: Mutex<()>,
}

impl EncryptedFileCredentialStore {
    /// Open a store in `dir`, creating the directory if needed and reusing or
    /// generating the key in `<dir>/.key`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let key = load_or_create_key(&dir.join(KEY_FILE))?;
        Ok(Self::with_master_key(dir, key))
    }

    /// Open a store in `dir` with an externally supplied key. No key file is
    /// read or written.
    pub fn with_master_key(dir: impl Into<PathBuf>, key: MasterKey) -> Self {
        Self {
            dir: dir.into(),
            sealer: SealedJson::new(key).with_kid(KID),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn credentials_path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }
}

fn load_or_create_key(path: &Path) -> Result<MasterKey, CredentialError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(parse_master_key(&raw)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let key = generate_master_key();
            write_private(path, key.to_hex().as_bytes())?;
            debug!(path = %path.display(), "generated credential master key");
            Ok(key)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    std::fs::write(path, contents)
}

#[async_trait]
impl CredentialSupplier for EncryptedFileCredentialStore {
    async fn load(&self) -> Result<Option<ProviderCredentials>, CredentialError> {
        let path = self.credentials_path();
        let sealed = match tokio::fs::read_to_string(&path).await {
            Ok(sealed) => sealed,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match self.sealer.open::<ProviderCredentials>(&sealed) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(e @ (CryptoError::DecryptionFailed | CryptoError::InvalidFormat(_))) => {
                warn!(path = %path.display(), error = %e, "stored credentials unreadable, treating as absent");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CredentialStore for EncryptedFileCredentialStore {
    async fn save(&self, credentials: &ProviderCredentials) -> Result<(), CredentialError> {
        let sealed = self.sealer.seal(credentials)?;
        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write then rename so a crash never leaves a half-written file.
        let path = self.credentials_path();
        let tmp = path.with_extension("enc.tmp");
        tokio::fs::write(&tmp, sealed).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "credentials saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.credentials_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
