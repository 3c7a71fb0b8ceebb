use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking scan and remediation outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct SweepMetrics {
    /// Scans that returned a report.
    pub scans: AtomicU64,
    /// Scans that ended in an error response.
    pub scans_failed: AtomicU64,
    /// Findings returned across all scans.
    pub findings: AtomicU64,
    /// Remediation batches that returned a report.
    pub remediations: AtomicU64,
    /// Remediation batches that ended in an error response.
    pub remediations_failed: AtomicU64,
    /// Per-resource attempts that succeeded (including dry-run validations).
    pub resources_remediated: AtomicU64,
    /// Per-resource attempts that failed.
    pub resources_failed: AtomicU64,
}

impl SweepMetrics {
    pub fn record_scan(&self, findings: usize) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.findings.fetch_add(findings as u64, Ordering::Relaxed);
    }

    pub fn increment_scans_failed(&self) {
        self.scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remediation(&self, success: usize, failed: usize) {
        self.remediations.fetch_add(1, Ordering::Relaxed);
        self.resources_remediated
            .fetch_add(success as u64, Ordering::Relaxed);
        self.resources_failed.fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn increment_remediations_failed(&self) {
        self.remediations_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scans: self.scans.load(Ordering::Relaxed),
            scans_failed: self.scans_failed.load(Ordering::Relaxed),
            findings: self.findings.load(Ordering::Relaxed),
            remediations: self.remediations.load(Ordering::Relaxed),
            remediations_failed: self.remediations_failed.load(Ordering::Relaxed),
            resources_remediated: self.resources_remediated.load(Ordering::Relaxed),
            resources_failed: self.resources_failed.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`SweepMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MetricsSnapshot {
    pub scans: u64,
    pub scans_failed: u64,
    pub findings: u64,
    pub remediations: u64,
    pub remediations_failed: u64,
    pub resources_remediated: u64,
    pub resources_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = SweepMetrics::default();
        metrics.record_scan(3);
        metrics.record_scan(0);
        metrics.increment_scans_failed();
        metrics.record_remediation(2, 1);
        metrics.increment_remediations_failed();

        let snap = metrics.snapshot();
        assert_eq!(snap.scans, 2);
        assert_eq!(snap.findings, 3);
        assert_eq!(snap.scans_failed, 1);
        assert_eq!(snap.remediations, 1);
        assert_eq!(snap.resources_remediated, 2);
        assert_eq!(snap.resources_failed, 1);
        assert_eq!(snap.remediations_failed, 1);
    }
}
