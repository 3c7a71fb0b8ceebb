use std::sync::Arc;

use reclaim_core::{
    DEFAULT_REGION, ProviderCredentials, RemediationReport, ScanReport, TechniqueInfo,
};
use reclaim_optimizer::{DEFAULT_CONCURRENCY, OptimizerBase, OptimizerRegistry};
use serde::{Deserialize, Serialize};
use tracing::{Span, error, info, instrument, warn};

use crate::credentials::CredentialSupplier;
use crate::error::SweepError;
use crate::metrics::SweepMetrics;

/// Body of a scan request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScanRequest {
    /// Region to scan. Defaults to the configured region.
    #[serde(default)]
    pub region: Option<String>,
}

/// Body of a remediation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RemediationRequest {
    /// Ids to remediate, in the order results should be reported.
    #[serde(default)]
    pub resource_ids: Vec<String>,
    /// Validate without making changes. Enabled unless explicitly `false`.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    #[serde(default)]
    pub region: Option<String>,
}

fn default_dry_run() -> bool {
    true
}

impl Default for RemediationRequest {
    fn default() -> Self {
        Self {
            resource_ids: Vec::new(),
            dry_run: true,
            region: None,
        }
    }
}

impl RemediationRequest {
    pub fn new(resource_ids: Vec<String>) -> Self {
        Self {
            resource_ids,
            ..Self::default()
        }
    }
}

/// Runs scans and remediation batches against registered optimizers.
///
/// Each call resolves the technique, loads credentials, builds a fresh
/// optimizer, uses it once and drops it. Nothing is shared between calls
/// except the credential supplier and the metrics counters.
pub struct Sweeper {
    registry: OptimizerRegistry,
    credentials: Arc<dyn CredentialSupplier>,
    default_region: String,
    endpoint_url: Option<String>,
    concurrency: usize,
    metrics: Arc<SweepMetrics>,
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("registry", &self.registry)
            .field("default_region", &self.default_region)
            .field("endpoint_url", &self.endpoint_url)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl Sweeper {
    pub fn builder() -> SweeperBuilder {
        SweeperBuilder::new()
    }

    /// Scan one technique and aggregate its findings.
    #[instrument(name = "sweeper.scan", skip(self, request), fields(region = tracing::field::Empty))]
    pub async fn scan(&self, technique: &str, request: ScanRequest) -> Result<ScanReport, SweepError> {
        let result = self.run_scan(technique, request).await;
        match &result {
            Ok(report) => self.metrics.record_scan(report.count),
            Err(_) => self.metrics.increment_scans_failed(),
        }
        result
    }

    async fn run_scan(&self, technique: &str, request: ScanRequest) -> Result<ScanReport, SweepError> {
        let technique = self.registry.resolve(technique)?;
        let credentials = self.load_credentials().await?;
        let region = self.region_for(request.region);
        Span::current().record("region", region.as_str());

        let mut optimizer = self
            .registry
            .build(technique, self.optimizer_base(credentials, region))?;
        let output = optimizer.analyze().await.inspect_err(|e| {
            error!(%technique, error = %e, "scan failed");
        })?;

        let report = ScanReport::new(technique, output);
        info!(
            %technique,
            count = report.count,
            skipped = report.skipped_count,
            total_monthly_savings = report.total_monthly_savings,
            "scan complete"
        );
        Ok(report)
    }

    /// Remediate a batch of resource ids for one technique.
    ///
    /// Per-id failures are part of a successful report. Only call-level
    /// failures are returned as errors.
    #[instrument(
        name = "sweeper.remediate",
        skip(self, request),
        fields(
            dry_run = request.dry_run,
            resources = request.resource_ids.len(),
            region = tracing::field::Empty,
        )
    )]
    pub async fn remediate(
        &self,
        technique: &str,
        request: RemediationRequest,
    ) -> Result<RemediationReport, SweepError> {
        let result = self.run_remediation(technique, request).await;
        match &result {
            Ok(report) => self
                .metrics
                .record_remediation(report.summary.success, report.summary.failed),
            Err(_) => self.metrics.increment_remediations_failed(),
        }
        result
    }

    async fn run_remediation(
        &self,
        technique: &str,
        request: RemediationRequest,
    ) -> Result<RemediationReport, SweepError> {
        let technique = self.registry.resolve(technique)?;
        let credentials = self.load_credentials().await?;
        let region = self.region_for(request.region);
        Span::current().record("region", region.as_str());

        let mut optimizer = self
            .registry
            .build(technique, self.optimizer_base(credentials, region))?;
        optimizer.set_dry_run(request.dry_run);
        let dry_run = optimizer.dry_run();

        let results = optimizer
            .optimize(&request.resource_ids)
            .await
            .inspect_err(|e| error!(%technique, error = %e, "remediation failed"))?;

        let report = RemediationReport::new(technique, dry_run, results);
        if report.summary.failed > 0 {
            warn!(
                %technique,
                failed = report.summary.failed,
                total = report.summary.total,
                "some resources could not be remediated"
            );
        }
        info!(
            %technique,
            dry_run,
            total = report.summary.total,
            success = report.summary.success,
            failed = report.summary.failed,
            "remediation complete"
        );
        Ok(report)
    }

    /// Catalog entries for every registered technique, in catalog order.
    pub fn techniques(&self) -> Vec<TechniqueInfo> {
        self.registry
            .techniques()
            .into_iter()
            .map(|t| t.info())
            .collect()
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialSupplier> {
        &self.credentials
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    pub fn metrics(&self) -> &Arc<SweepMetrics> {
        &self.metrics
    }

    async fn load_credentials(&self) -> Result<ProviderCredentials, SweepError> {
        self.credentials.load().await?.ok_or(SweepError::NoCredentials)
    }

    fn region_for(&self, requested: Option<String>) -> String {
        requested
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| self.default_region.clone())
    }

    fn optimizer_base(&self, credentials: ProviderCredentials, region: String) -> OptimizerBase {
        OptimizerBase::new(credentials, region)
            .with_endpoint_url(self.endpoint_url.clone())
            .with_concurrency(self.concurrency)
    }
}

/// Fluent builder for a [`Sweeper`].
///
/// A registry and a credential supplier are required; everything else has a
/// default.
pub struct SweeperBuilder {
    registry: Option<OptimizerRegistry>,
    credentials: Option<Arc<dyn CredentialSupplier>>,
    default_region: String,
    endpoint_url: Option<String>,
    concurrency: usize,
    metrics: Option<Arc<SweepMetrics>>,
}

impl Default for SweeperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SweeperBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            credentials: None,
            default_region: DEFAULT_REGION.to_owned(),
            endpoint_url: None,
            concurrency: DEFAULT_CONCURRENCY,
            metrics: None,
        }
    }

    #[must_use]
    pub fn registry(mut self, registry: OptimizerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn credentials(mut self, supplier: Arc<dyn CredentialSupplier>) -> Self {
        self.credentials = Some(supplier);
        self
    }

    /// Region used when a request does not name one.
    #[must_use]
    pub fn default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    /// Send every provider call to this endpoint (e.g. `LocalStack`).
    #[must_use]
    pub fn endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }

    /// Maximum remediation attempts in flight per batch.
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Share an existing metrics instance.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<SweepMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<Sweeper, SweepError> {
        let registry = self
            .registry
            .ok_or_else(|| SweepError::Configuration("optimizer registry is required".into()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| SweepError::Configuration("credential supplier is required".into()))?;
        let default_region = if self.default_region.trim().is_empty() {
            DEFAULT_REGION.to_owned()
        } else {
            self.default_region
        };

        Ok(Sweeper {
            registry,
            credentials,
            default_region,
            endpoint_url: self.endpoint_url,
            concurrency: self.concurrency.max(1),
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}
