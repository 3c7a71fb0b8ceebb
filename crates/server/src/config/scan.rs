use reclaim_core::DEFAULT_REGION;
use reclaim_optimizer::DEFAULT_CONCURRENCY;
use serde::Deserialize;

/// Defaults applied to every scan and remediation request.
#[derive(Debug, Deserialize)]
pub struct ScanConfig {
    /// Region used when a request does not name one.
    #[serde(default = "default_region")]
    pub region: String,
    /// Remediation attempts in flight per batch.
    #[serde(default = "default_concurrency")]
    pub remediation_concurrency: usize,
    /// Custom provider endpoint, e.g. `http://localhost:4566` for `LocalStack`.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            remediation_concurrency: default_concurrency(),
            endpoint_url: None,
        }
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_owned()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
