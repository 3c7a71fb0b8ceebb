use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use reclaim_core::{RemediationReport, ScanReport};
use reclaim_gateway::{RemediationRequest, ScanRequest};
use serde::de::DeserializeOwned;

use super::AppState;
use super::schemas::ErrorResponse;
use crate::error::ServerError;

/// Parse an optional JSON body. An empty body or `null` yields the default.
pub(crate) fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice::<Option<T>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ServerError::BadRequest(format!("invalid request body: {e}")))
}

/// `POST /api/analyze/{technique}` -- scan one technique.
#[utoipa::path(
    post,
    path = "/api/analyze/{technique}",
    tag = "Scan",
    summary = "Scan for idle resources",
    description = "Runs a read-only scan for one technique and returns the findings with estimated monthly savings. The body is optional.",
    params(("technique" = String, Path, description = "Technique id, e.g. `ebs`")),
    request_body(content = Option<ScanRequest>, description = "Optional region override"),
    responses(
        (status = 200, description = "Scan report", body = ScanReport),
        (status = 400, description = "Unknown technique or malformed body", body = ErrorResponse),
        (status = 401, description = "No credentials saved", body = ErrorResponse),
        (status = 500, description = "Provider failure", body = ErrorResponse)
    )
)]
pub async fn analyze(
    State(state): State<AppState>,
    Path(technique): Path<String>,
    body: Bytes,
) -> Result<Json<ScanReport>, ServerError> {
    let request: ScanRequest = optional_body(&body)?;
    let report = state.sweeper.scan(&technique, request).await?;
    Ok(Json(report))
}

/// `POST /api/optimize/{technique}` -- remediate resources by id.
///
/// Dry-run stays enabled unless the body sets `"dry_run": false`.
#[utoipa::path(
    post,
    path = "/api/optimize/{technique}",
    tag = "Scan",
    summary = "Remediate resources",
    description = "Attempts one remediation per resource id and reports each outcome in input order. Per-resource failures do not fail the request.",
    params(("technique" = String, Path, description = "Technique id, e.g. `ebs`")),
    request_body(content = RemediationRequest, description = "Resource ids and dry-run flag"),
    responses(
        (status = 200, description = "Remediation report", body = RemediationReport),
        (status = 400, description = "Unknown technique or malformed body", body = ErrorResponse),
        (status = 401, description = "No credentials saved", body = ErrorResponse),
        (status = 500, description = "Provider failure", body = ErrorResponse)
    )
)]
pub async fn optimize(
    State(state): State<AppState>,
    Path(technique): Path<String>,
    body: Bytes,
) -> Result<Json<RemediationReport>, ServerError> {
    let request: RemediationRequest = optional_body(&body)?;
    let report = state.sweeper.remediate(&technique, request).await?;
    Ok(Json(report))
}
