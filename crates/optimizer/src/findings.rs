use reclaim_core::{Finding, ScanOutput, SkippedResource};
use serde_json::Value;
use tracing::{debug, warn};

/// Append-only buffer of findings for a single `analyze()` call.
///
/// Every finding enters through [`add_finding`](Self::add_finding), so the
/// buffer only ever holds well-formed, timestamped findings.
#[derive(Debug, Default)]
pub struct FindingsBuffer {
    findings: Vec<Finding>,
    skipped: Vec<SkippedResource>,
}

impl FindingsBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and append a finding.
    pub fn add_finding(
        &mut self,
        resource_id: impl Into<String>,
        resource_type: &str,
        details: Value,
        estimated_savings: f64,
    ) {
        let finding = Finding::new(resource_id, resource_type, details, estimated_savings);
        debug!(
            resource_id = %finding.resource_id,
            resource_type = %finding.resource_type,
            estimated_savings = finding.estimated_savings,
            "finding recorded"
        );
        self.findings.push(finding);
    }

    /// Append a finding for a resource with no direct cost.
    pub fn add_unpriced_finding(
        &mut self,
        resource_id: impl Into<String>,
        resource_type: &str,
        details: Value,
    ) {
        self.add_finding(resource_id, resource_type, details, 0.0);
    }

    /// Record a resource that could not be evaluated.
    pub fn skip(&mut self, resource_id: impl Into<String>, reason: impl Into<String>) {
        let skipped = SkippedResource::new(resource_id, reason);
        warn!(
            resource_id = %skipped.resource_id,
            reason = %skipped.reason,
            "resource skipped during scan"
        );
        self.skipped.push(skipped);
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn skipped(&self) -> &[SkippedResource] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Drain the buffer into a [`ScanOutput`], leaving it empty.
    pub fn take_output(&mut self) -> ScanOutput {
        ScanOutput {
            findings: std::mem::take(&mut self.findings),
            skipped: std::mem::take(&mut self.skipped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn findings_keep_emission_order() {
        let mut buf = FindingsBuffer::new();
        buf.add_finding("vol-1", "EBS Volume", serde_json::json!({"size_gb": 1}), 0.1);
        buf.add_finding("vol-2", "EBS Volume", serde_json::json!({"size_gb": 2}), 0.2);
        buf.add_unpriced_finding("sg-1", "Security Group", serde_json::json!({}));

        let ids: Vec<_> = buf.findings().iter().map(|f| f.resource_id.as_str()).collect();
        assert_eq!(ids, ["vol-1", "vol-2", "sg-1"]);
        assert_eq!(buf.findings()[2].estimated_savings, 0.0);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn take_output_drains() {
        let mut buf = FindingsBuffer::new();
        buf.add_finding("a", "AMI", serde_json::json!({}), 1.0);
        buf.skip("b", "throttled");

        let out = buf.take_output();
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.skipped, vec![SkippedResource::new("b", "throttled")]);
        assert!(buf.is_empty());
        assert!(buf.skipped().is_empty());
    }
}
