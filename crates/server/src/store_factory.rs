use std::sync::Arc;

use reclaim_crypto::parse_master_key;
use reclaim_gateway::{CredentialStore, EncryptedFileCredentialStore, MemoryCredentialStore};
use tracing::info;

use crate::config::{CredentialBackend, CredentialsConfig, MASTER_KEY_ENV};
use crate::error::ServerError;

/// Build the credential store described by `config`.
///
/// For the file backend the master key comes from `RECLAIM_MASTER_KEY` when
/// set, otherwise from (or into) `<directory>/.key`.
pub fn create_credential_store(
    config: &CredentialsConfig,
) -> Result<Arc<dyn CredentialStore>, ServerError> {
    match config.backend {
        CredentialBackend::Memory => {
            info!("using in-memory credential store");
            Ok(Arc::new(MemoryCredentialStore::new()))
        }
        CredentialBackend::File => {
            let dir = config.resolved_directory();
            let store = match std::env::var(MASTER_KEY_ENV) {
                Ok(raw) => {
                    let key = parse_master_key(&raw)
                        .map_err(|e| ServerError::Config(format!("invalid {MASTER_KEY_ENV}: {e}")))?;
                    std::fs::create_dir_all(&dir)?;
                    EncryptedFileCredentialStore::with_master_key(&dir, key)
                }
                Err(_) => EncryptedFileCredentialStore::open(&dir)?,
            };
            info!(directory = %dir.display(), "using encrypted file credential store");
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use reclaim_core::ProviderCredentials;
    use reclaim_gateway::CredentialSupplier;

    use super::*;

    #[tokio::test]
    async fn memory_backend() {
        let config = CredentialsConfig {
            backend: CredentialBackend::Memory,
            directory: "/nonexistent".into(),
        };
        let store = create_credential_store(&config).unwrap();
        assert!(store.load().await.unwrap().is_none());
        store
            .save(&ProviderCredentials::new("A", "b", "us-east-1"))
            .await
            .unwrap();
        assert!(store.load().await.unwrap().is_some());
    }
}
