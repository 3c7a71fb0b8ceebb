use reclaim_core::{DEFAULT_REGION, ProviderCredentials, ScanOutput};
use serde_json::Value;

use crate::findings::FindingsBuffer;

/// Default number of remediation attempts run concurrently within a batch.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// State shared by every optimizer: credentials, target region, the dry-run
/// flag, and the findings buffer for the current `analyze()` call.
///
/// Dry-run starts enabled. An optimizer only performs durable changes after a
/// caller explicitly turns it off.
pub struct OptimizerBase {
    credentials: ProviderCredentials,
    region: String,
    endpoint_url: Option<String>,
    dry_run: bool,
    concurrency: usize,
    findings: FindingsBuffer,
}

impl std::fmt::Debug for OptimizerBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizerBase")
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("dry_run", &self.dry_run)
            .field("concurrency", &self.concurrency)
            .field("findings", &self.findings.len())
            .finish()
    }
}

impl OptimizerBase {
    /// Create a base for the given credentials and region. An empty region
    /// falls back to [`DEFAULT_REGION`].
    pub fn new(credentials: ProviderCredentials, region: impl Into<String>) -> Self {
        let region = region.into();
        let region = if region.trim().is_empty() {
            DEFAULT_REGION.to_owned()
        } else {
            region
        };
        Self {
            credentials,
            region,
            endpoint_url: None,
            dry_run: true,
            concurrency: DEFAULT_CONCURRENCY,
            findings: FindingsBuffer::new(),
        }
    }

    /// Route provider calls to a custom endpoint (e.g. `LocalStack`).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }

    /// Set how many remediation attempts may be in flight at once.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn credentials(&self) -> &ProviderCredentials {
        &self.credentials
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Record a finding. See [`FindingsBuffer::add_finding`].
    pub fn add_finding(
        &mut self,
        resource_id: impl Into<String>,
        resource_type: &str,
        details: Value,
        estimated_savings: f64,
    ) {
        self.findings
            .add_finding(resource_id, resource_type, details, estimated_savings);
    }

    /// Record a finding with no direct cost.
    pub fn add_unpriced_finding(
        &mut self,
        resource_id: impl Into<String>,
        resource_type: &str,
        details: Value,
    ) {
        self.findings
            .add_unpriced_finding(resource_id, resource_type, details);
    }

    /// Record a resource the scan could not evaluate.
    pub fn skip(&mut self, resource_id: impl Into<String>, reason: impl Into<String>) {
        self.findings.skip(resource_id, reason);
    }

    pub fn findings(&self) -> &FindingsBuffer {
        &self.findings
    }

    /// Hand the buffered findings to the caller.
    pub fn take_output(&mut self) -> ScanOutput {
        self.findings.take_output()
    }
}
