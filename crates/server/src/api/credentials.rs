use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use reclaim_core::{DEFAULT_REGION, ProviderCredentials};
use reclaim_gateway::{CredentialStore, CredentialSupplier};
use reclaim_optimizer::OptimizerError;
use tracing::{info, instrument};

use super::AppState;
use super::scan::optional_body;
use super::schemas::{
    ClearCredentialsResponse, CredentialStatus, ErrorResponse, ValidateCredentialsRequest,
};
use crate::error::ServerError;

fn rejection_text(err: &OptimizerError) -> String {
    match err {
        OptimizerError::Authentication(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// `POST /api/credentials/validate` -- verify credentials and store them on
/// success.
#[utoipa::path(
    post,
    path = "/api/credentials/validate",
    tag = "Credentials",
    summary = "Validate and save credentials",
    request_body(content = ValidateCredentialsRequest, description = "Access key pair and optional region"),
    responses(
        (status = 200, description = "Credentials valid and saved", body = CredentialStatus),
        (status = 400, description = "Missing access key or secret key", body = ErrorResponse),
        (status = 401, description = "Credentials rejected", body = CredentialStatus),
        (status = 500, description = "Credential store failure", body = ErrorResponse)
    )
)]
#[instrument(name = "api.credentials.validate", skip_all)]
pub async fn validate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CredentialStatus>), ServerError> {
    let request: ValidateCredentialsRequest = optional_body(&body)?;
    let (Some(access_key), Some(secret_key)) = (
        request.access_key.filter(|k| !k.is_empty()),
        request.secret_key.filter(|k| !k.is_empty()),
    ) else {
        return Err(ServerError::BadRequest("Missing credentials".into()));
    };
    let region = request
        .region
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_owned());
    let credentials = ProviderCredentials::new(access_key, secret_key, region);

    match state.verifier.verify(&credentials).await {
        Ok(identity) => {
            state.credentials.save(&credentials).await?;
            info!(account_id = %identity.account_id, "credentials saved");
            Ok((StatusCode::OK, Json(CredentialStatus::valid(identity))))
        }
        Err(e) => Ok((
            StatusCode::UNAUTHORIZED,
            Json(CredentialStatus::invalid(rejection_text(&e))),
        )),
    }
}

/// `GET /api/credentials/check` -- re-verify the stored credentials.
#[utoipa::path(
    get,
    path = "/api/credentials/check",
    tag = "Credentials",
    summary = "Check stored credentials",
    responses(
        (status = 200, description = "Verification result for the stored credentials", body = CredentialStatus),
        (status = 404, description = "No credentials saved", body = CredentialStatus),
        (status = 500, description = "Credential store failure", body = ErrorResponse)
    )
)]
#[instrument(name = "api.credentials.check", skip_all)]
pub async fn check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CredentialStatus>), ServerError> {
    let Some(credentials) = state.credentials.load().await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(CredentialStatus::invalid("No credentials saved")),
        ));
    };

    let status = match state.verifier.verify(&credentials).await {
        Ok(identity) => CredentialStatus::valid(identity),
        Err(e) => CredentialStatus::invalid(rejection_text(&e)),
    };
    Ok((StatusCode::OK, Json(status)))
}

/// `POST /api/credentials/clear` -- forget stored credentials.
#[utoipa::path(
    post,
    path = "/api/credentials/clear",
    tag = "Credentials",
    summary = "Clear stored credentials",
    responses(
        (status = 200, description = "Credentials cleared", body = ClearCredentialsResponse),
        (status = 500, description = "Credential store failure", body = ErrorResponse)
    )
)]
pub async fn clear(State(state): State<AppState>) -> Result<Json<ClearCredentialsResponse>, ServerError> {
    state.credentials.clear().await?;
    info!("credentials cleared");
    Ok(Json(ClearCredentialsResponse {
        status: "success".into(),
        message: "Credentials cleared".into(),
    }))
}
