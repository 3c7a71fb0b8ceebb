use async_trait::async_trait;
use aws_sdk_ec2::error::ProvideErrorMetadata;
use reclaim_core::{CallerIdentity, DEFAULT_REGION, ProviderCredentials};
use reclaim_optimizer::{IdentityVerifier, OptimizerError};
use tracing::{info, instrument, warn};

use crate::auth::sdk_config;
use crate::error::into_optimizer_error;

/// Verifies credentials with STS `GetCallerIdentity`, which every valid key
/// pair may call regardless of attached policies.
#[derive(Debug, Clone, Default)]
pub struct StsIdentityVerifier {
    endpoint_url: Option<String>,
}

impl StsIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send STS requests to a custom endpoint (e.g. `LocalStack`).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }
}

/// User-facing message for the STS codes that mean "these keys are wrong".
pub fn rejection_message(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "InvalidClientTokenId" => Some("Invalid access key ID"),
        "SignatureDoesNotMatch" => Some("Invalid secret access key"),
        "UnrecognizedClientException" => Some("Invalid credentials format"),
        _ => None,
    }
}

#[async_trait]
impl IdentityVerifier for StsIdentityVerifier {
    #[instrument(skip_all, fields(region = %credentials.region))]
    async fn verify(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<CallerIdentity, OptimizerError> {
        let region = if credentials.region.is_empty() {
            DEFAULT_REGION
        } else {
            credentials.region.as_str()
        };
        let config = sdk_config(credentials, region, self.endpoint_url.as_deref()).await;
        let client = aws_sdk_sts::Client::new(&config);

        match client.get_caller_identity().send().await {
            Ok(output) => {
                let identity = CallerIdentity::from_arn(
                    output.account().unwrap_or_default(),
                    output.arn().unwrap_or_default(),
                );
                info!(account_id = %identity.account_id, user = %identity.user, "credentials verified");
                Ok(identity)
            }
            Err(err) => {
                if let Some(message) = rejection_message(err.code()) {
                    warn!(code = err.code().unwrap_or_default(), "credentials rejected");
                    return Err(OptimizerError::Authentication(message.to_owned()));
                }
                Err(into_optimizer_error(&err))
            }
        }
    }
}
