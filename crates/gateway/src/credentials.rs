use async_trait::async_trait;
use reclaim_core::ProviderCredentials;
use tokio::sync::RwLock;

use crate::error::CredentialError;

/// Source of provider credentials for scan and remediation requests.
///
/// `Ok(None)` means nothing is configured, which the orchestrators report as
/// `NoCredentials`. An `Err` is a failure of the supplier itself.
#[async_trait]
pub trait CredentialSupplier: Send + Sync {
    async fn load(&self) -> Result<Option<ProviderCredentials>, CredentialError>;
}

/// A [`CredentialSupplier`] that can also persist and forget credentials.
#[async_trait]
pub trait CredentialStore: CredentialSupplier {
    /// Replace whatever is stored with `credentials`.
    async fn save(&self, credentials: &ProviderCredentials) -> Result<(), CredentialError>;

    /// Remove stored credentials. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), CredentialError>;
}

/// In-process credential store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<ProviderCredentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `credentials`.
    pub fn with_credentials(credentials: ProviderCredentials) -> Self {
        Self {
            inner: RwLock::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialSupplier for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<ProviderCredentials>, CredentialError> {
        Ok(self.inner.read().await.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, credentials: &ProviderCredentials) -> Result<(), CredentialError> {
        *self.inner.write().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        self.inner.write().await.take();
        Ok(())
    }
}
