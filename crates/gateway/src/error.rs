use reclaim_optimizer::{OptimizerError, RegistryError};
use thiserror::Error;

/// Errors surfaced by the [`Sweeper`](crate::Sweeper) orchestrators.
///
/// Per-resource remediation failures are never reported here; they live in
/// their own `RemediationResult` entry and the batch as a whole succeeds.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The technique id is not in the registry. Raised before any credential
    /// lookup or provider call.
    #[error("Unknown technique: {0}")]
    UnknownTechnique(String),

    /// The credential supplier has nothing stored.
    #[error("No credentials saved")]
    NoCredentials,

    /// The credential supplier itself failed.
    #[error("credential store error: {0}")]
    Credentials(#[from] CredentialError),

    /// Call-level provider failure from `analyze()` or `optimize()`.
    #[error(transparent)]
    Provider(#[from] OptimizerError),

    /// The sweeper was misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<RegistryError> for SweepError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownTechnique(id) => Self::UnknownTechnique(id),
        }
    }
}

/// Errors from a credential store.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading or writing the backing file failed.
    #[error("credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The master key could not be loaded or used.
    #[error("credential encryption error: {0}")]
    Crypto(#[from] reclaim_crypto::CryptoError),
}
