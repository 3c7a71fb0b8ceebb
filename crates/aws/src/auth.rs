use aws_sdk_sts::config::Credentials;
use reclaim_core::ProviderCredentials;
use reclaim_optimizer::OptimizerBase;
use tracing::debug;

/// Name attached to the static credentials handed to the SDK.
const CREDENTIALS_PROVIDER_NAME: &str = "reclaim-static";

/// Build an AWS SDK configuration for one optimizer run.
///
/// The stored key pair is used as static credentials; the environment
/// credential chain is never consulted. An endpoint override (e.g.
/// `LocalStack`) routes every client built from the result.
pub async fn build_sdk_config(base: &OptimizerBase) -> aws_config::SdkConfig {
    sdk_config(base.credentials(), base.region(), base.endpoint_url()).await
}

/// Build an AWS SDK configuration from explicit credentials and region.
pub async fn sdk_config(
    credentials: &ProviderCredentials,
    region: &str,
    endpoint_url: Option<&str>,
) -> aws_config::SdkConfig {
    let static_credentials = Credentials::new(
        credentials.access_key.clone(),
        credentials.secret_key.clone(),
        None,
        None,
        CREDENTIALS_PROVIDER_NAME,
    );

    let mut loader = aws_config::from_env()
        .region(aws_config::Region::new(region.to_owned()))
        .credentials_provider(static_credentials);

    if let Some(endpoint) = endpoint_url {
        debug!(endpoint = %endpoint, "using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    // `load()` needs a TLS root store, so these only run in integration mode.

    #[tokio::test]
    async fn sdk_config_sets_region() {
        let creds = ProviderCredentials::new("AKIATEST", "secret", "us-east-1");
        let config = sdk_config(&creds, "ap-northeast-1", None).await;
        assert_eq!(config.region().map(|r| r.as_ref()), Some("ap-northeast-1"));
    }

    #[tokio::test]
    async fn sdk_config_with_endpoint() {
        let creds = ProviderCredentials::new("AKIATEST", "secret", "us-east-1");
        let config = sdk_config(&creds, "us-west-2", Some("http://localhost:4566")).await;
        assert_eq!(config.endpoint_url(), Some("http://localhost:4566"));
    }
}
