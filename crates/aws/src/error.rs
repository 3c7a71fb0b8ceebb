use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use reclaim_optimizer::OptimizerError;
use thiserror::Error;

/// Errors specific to AWS optimizer operations.
#[derive(Debug, Error)]
pub enum AwsOptimizerError {
    /// The AWS SDK returned an error from the service.
    #[error("AWS service error: {0}")]
    ServiceError(String),

    /// AWS rejected the credentials.
    #[error("AWS authentication failed: {0}")]
    AuthFailure(String),

    /// The credentials lack permission for the call.
    #[error("AWS access denied: {0}")]
    AccessDenied(String),

    /// The request was throttled by the AWS service.
    #[error("AWS request throttled")]
    Throttled,

    /// A network or connection error occurred communicating with AWS.
    #[error("AWS connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("AWS request timed out")]
    Timeout,

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl From<AwsOptimizerError> for OptimizerError {
    fn from(err: AwsOptimizerError) -> Self {
        match err {
            AwsOptimizerError::ServiceError(msg) => OptimizerError::Provider(msg),
            AwsOptimizerError::AuthFailure(msg) => OptimizerError::Authentication(msg),
            AwsOptimizerError::AccessDenied(msg) => OptimizerError::AccessDenied(msg),
            AwsOptimizerError::Throttled => OptimizerError::RateLimited,
            AwsOptimizerError::Connection(msg) => OptimizerError::Connection(msg),
            AwsOptimizerError::Timeout => OptimizerError::Timeout,
            AwsOptimizerError::Configuration(msg) => OptimizerError::Configuration(msg),
        }
    }
}

const AUTH_CODES: &[&str] = &[
    "AuthFailure",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
    "ExpiredToken",
    "InvalidAccessKeyId",
];

const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "UnauthorizedAccess",
];

const THROTTLE_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "SlowDown",
];

/// Classify an AWS SDK error string into the appropriate [`AwsOptimizerError`].
///
/// This helper inspects the error message for common patterns (throttling,
/// timeout, connection) and maps them to the correct variant.
pub fn classify_sdk_error(error_str: &str) -> AwsOptimizerError {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl") || lower.contains("rate exceed") || lower.contains("too many") {
        AwsOptimizerError::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AwsOptimizerError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
        || lower.contains("dispatch failure")
    {
        AwsOptimizerError::Connection(error_str.to_owned())
    } else {
        AwsOptimizerError::ServiceError(error_str.to_owned())
    }
}

/// Classify an SDK error, using the AWS error code when the service sent one
/// and falling back to message inspection otherwise.
pub fn classify<E>(err: &E) -> AwsOptimizerError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = sdk_error_message(err);
    match err.code() {
        Some(code) if AUTH_CODES.contains(&code) => AwsOptimizerError::AuthFailure(message),
        Some(code) if ACCESS_DENIED_CODES.contains(&code) => {
            AwsOptimizerError::AccessDenied(message)
        }
        Some(code) if THROTTLE_CODES.contains(&code) => AwsOptimizerError::Throttled,
        _ => classify_sdk_error(&message),
    }
}

/// Classify an SDK error straight into the call-level error report.
pub fn into_optimizer_error<E>(err: &E) -> OptimizerError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    classify(err).into()
}

/// Human-readable message for an SDK error: `"<Code>: <message>"` when the
/// service sent a structured error, the full error chain otherwise.
pub fn sdk_error_message<E>(err: &E) -> String
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_owned(),
        _ => DisplayErrorContext(err).to_string(),
    }
}

/// An EC2 call issued with `DryRun=true` reports success as the
/// `DryRunOperation` error.
pub fn is_dry_run_success<E: ProvideErrorMetadata>(err: &E) -> bool {
    err.code() == Some("DryRunOperation")
}
