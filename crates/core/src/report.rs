use serde::{Deserialize, Serialize};

use crate::finding::{Finding, ScanOutput, SkippedResource};
use crate::remediation::{RemediationResult, RemediationStatus};
use crate::technique::Technique;

/// Round a monetary amount to two decimal places.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Aggregated response for one scan of one technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScanReport {
    pub technique: Technique,
    pub findings: Vec<Finding>,
    /// Number of findings.
    pub count: usize,
    /// Sum of `estimated_savings` over `findings`, rounded to cents.
    pub total_monthly_savings: f64,
    /// Number of resources that could not be evaluated.
    pub skipped_count: usize,
    pub skipped: Vec<SkippedResource>,
}

impl ScanReport {
    /// Aggregate the output of a single `analyze()` call.
    pub fn new(technique: Technique, output: ScanOutput) -> Self {
        let total: f64 = output.findings.iter().map(|f| f.estimated_savings).sum();
        Self {
            technique,
            count: output.findings.len(),
            total_monthly_savings: round_currency(total),
            skipped_count: output.skipped.len(),
            findings: output.findings,
            skipped: output.skipped,
        }
    }
}

/// Success/failure tallies for a remediation batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RemediationSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

impl RemediationSummary {
    /// Tally a result list. `success + failed == total` always holds because
    /// the status set is closed.
    pub fn from_results(results: &[RemediationResult]) -> Self {
        let success = results
            .iter()
            .filter(|r| r.status() == RemediationStatus::Success)
            .count();
        Self {
            total: results.len(),
            success,
            failed: results.len() - success,
        }
    }
}

/// Aggregated response for one remediation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RemediationReport {
    pub technique: Technique,
    pub dry_run: bool,
    pub results: Vec<RemediationResult>,
    pub summary: RemediationSummary,
}

impl RemediationReport {
    pub fn new(technique: Technique, dry_run: bool, results: Vec<RemediationResult>) -> Self {
        let summary = RemediationSummary::from_results(&results);
        Self {
            technique,
            dry_run,
            results,
            summary,
        }
    }
}
