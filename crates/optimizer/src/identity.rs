use async_trait::async_trait;
use reclaim_core::{CallerIdentity, ProviderCredentials};

use crate::error::OptimizerError;

/// Confirms that a credential pair is accepted by the provider before it is
/// stored.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve the identity behind the credentials. Rejected credentials map
    /// to [`OptimizerError::Authentication`] with a user-facing message.
    async fn verify(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<CallerIdentity, OptimizerError>;
}
