use serde::Serialize;
use thiserror::Error;

/// Call-level failure of an `analyze()` or `optimize()` invocation.
///
/// This is the error-report shape: it replaces the whole result. Failures of
/// individual remediation attempts are never reported through this type; they
/// live inside their `RemediationResult` entry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum OptimizerError {
    /// The provider rejected the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The credentials are valid but lack permission for the call.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The provider did not respond in time.
    #[error("provider request timed out")]
    Timeout,

    /// The provider throttled the request.
    #[error("rate limited")]
    RateLimited,

    /// The provider returned a service error.
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider response could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The optimizer was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl OptimizerError {
    /// Returns `true` if the error is transient and a caller-side retry may
    /// succeed. The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection(_) | Self::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(OptimizerError::Timeout.is_retryable());
        assert!(OptimizerError::Connection("reset".into()).is_retryable());
        assert!(OptimizerError::RateLimited.is_retryable());
    }

    #[test]
    fn non_retryable_errors() {
        assert!(!OptimizerError::Authentication("bad key".into()).is_retryable());
        assert!(!OptimizerError::AccessDenied("x".into()).is_retryable());
        assert!(!OptimizerError::Provider("x".into()).is_retryable());
        assert!(!OptimizerError::MalformedResponse("x".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = OptimizerError::Authentication("Invalid access key ID".into());
        assert_eq!(err.to_string(), "authentication failed: Invalid access key ID");

        assert_eq!(OptimizerError::RateLimited.to_string(), "rate limited");
    }

    #[test]
    fn serializes_as_tagged_value() {
        let json = serde_json::to_value(OptimizerError::AccessDenied("ec2:DescribeVolumes".into()))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "access_denied", "message": "ec2:DescribeVolumes"})
        );
        let json = serde_json::to_value(OptimizerError::Timeout).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "timeout"}));
    }
}
