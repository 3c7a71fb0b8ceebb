#![allow(clippy::needless_for_each)]

use reclaim_core::{
    Finding, RemediationOutcome, RemediationReport, RemediationResult, RemediationSummary,
    ScanReport, SkippedResource, Technique, TechniqueInfo,
};
use reclaim_gateway::{MetricsSnapshot, RemediationRequest, ScanRequest};

use super::schemas::{
    ClearCredentialsResponse, CredentialStatus, ErrorResponse, HealthResponse,
    ValidateCredentialsRequest,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Reclaim API",
        version = "0.1.0",
        description = "Find idle cloud resources, estimate what they cost, and remove them.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health and metrics"),
        (name = "Techniques", description = "Catalog of scannable resource kinds"),
        (name = "Scan", description = "Idle resource scans and remediation"),
        (name = "Credentials", description = "Provider credential management")
    ),
    paths(
        super::health::health,
        super::health::metrics,
        super::techniques::list_techniques,
        super::scan::analyze,
        super::scan::optimize,
        super::credentials::validate,
        super::credentials::check,
        super::credentials::clear,
    ),
    components(schemas(
        ErrorResponse,
        HealthResponse,
        MetricsSnapshot,
        Technique,
        TechniqueInfo,
        ScanRequest,
        ScanReport,
        Finding,
        SkippedResource,
        RemediationRequest,
        RemediationReport,
        RemediationResult,
        RemediationOutcome,
        RemediationSummary,
        ValidateCredentialsRequest,
        CredentialStatus,
        ClearCredentialsResponse,
    ))
)]
pub struct ApiDoc;
