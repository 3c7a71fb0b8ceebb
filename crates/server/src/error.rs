use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reclaim_gateway::{CredentialError, SweepError};
use thiserror::Error;

/// Errors that can occur when running the Reclaim server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request body was malformed or incomplete.
    #[error("{0}")]
    BadRequest(String),

    /// Scan or remediation failure from the sweeper.
    #[error(transparent)]
    Sweep(#[from] SweepError),

    /// The credential store failed.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Sweep(SweepError::UnknownTechnique(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Sweep(SweepError::NoCredentials) => StatusCode::UNAUTHORIZED,
            Self::Config(_) | Self::Io(_) | Self::Sweep(_) | Self::Credentials(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use reclaim_optimizer::OptimizerError;

    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServerError::from(SweepError::UnknownTechnique("foo".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(SweepError::NoCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::from(SweepError::Provider(OptimizerError::Timeout)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::BadRequest("Missing credentials".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn messages_pass_through() {
        let err = ServerError::from(SweepError::UnknownTechnique("foo".into()));
        assert_eq!(err.to_string(), "Unknown technique: foo");
        let err = ServerError::from(SweepError::NoCredentials);
        assert_eq!(err.to_string(), "No credentials saved");
    }
}
