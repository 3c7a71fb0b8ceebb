//! Core types shared by every Reclaim crate.
//!
//! - [`Finding`] and [`ScanOutput`]: what a scan produces.
//! - [`RemediationResult`]: one entry per resource id a caller asked to remediate.
//! - [`Technique`]: the closed catalog of resource kinds that can be scanned.
//! - [`ScanReport`] / [`RemediationReport`]: the aggregated responses.

pub mod credentials;
pub mod finding;
pub mod remediation;
pub mod report;
pub mod technique;

pub use credentials::{CallerIdentity, DEFAULT_REGION, ProviderCredentials};
pub use finding::{Finding, ScanOutput, SkippedResource};
pub use remediation::{RemediationOutcome, RemediationResult, RemediationStatus};
pub use report::{RemediationReport, RemediationSummary, ScanReport, round_currency};
pub use technique::{Technique, TechniqueInfo, UnknownTechnique, catalog};
