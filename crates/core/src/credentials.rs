use serde::{Deserialize, Serialize};

/// Region used when neither the caller nor the configuration names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Static provider credentials supplied by the credential store.
///
/// Whether the keys are actually valid is only discovered when a provider
/// call made with them fails.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Region the credentials were saved with.
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_owned()
}

impl ProviderCredentials {
    /// Create credentials for the given key pair and region.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("access_key", &mask_access_key(&self.access_key))
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

/// Keep the last four characters of an access key id, which is how the
/// provider console displays them.
fn mask_access_key(key: &str) -> String {
    let visible: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{visible}")
}

/// Identity reported by the provider for a set of credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CallerIdentity {
    /// Account the credentials belong to.
    pub account_id: String,
    /// Full principal ARN.
    pub arn: String,
    /// Last path segment of the ARN (user or role session name).
    pub user: String,
}

impl CallerIdentity {
    /// Build an identity from an account id and principal ARN.
    pub fn from_arn(account_id: impl Into<String>, arn: impl Into<String>) -> Self {
        let arn = arn.into();
        let user = arn.rsplit('/').next().unwrap_or_default().to_owned();
        Self {
            account_id: account_id.into(),
            arn,
            user,
        }
    }
}
