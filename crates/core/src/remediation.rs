use serde::{Deserialize, Serialize};

/// Result of one remediation attempt for one requested resource id.
///
/// Serializes flat as `{"resource_id", "status": "success", "message"}` or
/// `{"resource_id", "status": "failed", "error"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RemediationResult {
    /// The id exactly as the caller supplied it.
    pub resource_id: String,
    #[serde(flatten)]
    pub outcome: RemediationOutcome,
}

/// Success message or failure reason; never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemediationOutcome {
    Success { message: String },
    Failed { error: String },
}

/// Closed set of remediation statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    Success,
    Failed,
}

impl RemediationResult {
    /// A successful (or dry-run validated) attempt.
    pub fn success(resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            outcome: RemediationOutcome::Success {
                message: message.into(),
            },
        }
    }

    /// A failed attempt.
    pub fn failed(resource_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            outcome: RemediationOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn status(&self) -> RemediationStatus {
        match self.outcome {
            RemediationOutcome::Success { .. } => RemediationStatus::Success,
            RemediationOutcome::Failed { .. } => RemediationStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == RemediationStatus::Success
    }

    /// The success message, if any.
    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            RemediationOutcome::Success { message } => Some(message),
            RemediationOutcome::Failed { .. } => None,
        }
    }

    /// The failure reason, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            RemediationOutcome::Failed { error } => Some(error),
            RemediationOutcome::Success { .. } => None,
        }
    }
}
