use aws_sdk_ec2::error::ProvideErrorMetadata;
use reclaim_core::RemediationResult;
use tracing::{debug, warn};

use crate::error::{is_dry_run_success, sdk_error_message};

/// How a remediation action is described in result messages.
#[derive(Debug, Clone, Copy)]
pub struct ActionLabel {
    /// Past tense, e.g. `"Deleted EBS volume"`.
    pub done: &'static str,
    /// Imperative, e.g. `"delete EBS volume"`.
    pub planned: &'static str,
}

impl ActionLabel {
    pub const fn new(done: &'static str, planned: &'static str) -> Self {
        Self { done, planned }
    }

    pub fn completed(&self, resource_id: String) -> RemediationResult {
        let message = format!("{} {resource_id}", self.done);
        RemediationResult::success(resource_id, message)
    }

    pub fn validated(&self, resource_id: String) -> RemediationResult {
        let message = format!("Dry run validated: would {} {resource_id}", self.planned);
        RemediationResult::success(resource_id, message)
    }
}

/// Turn the outcome of one provider call into a result entry.
///
/// In dry-run mode the call was either an EC2 request carrying `DryRun=true`
/// or a read-only existence check, so both `Ok` and `DryRunOperation` count
/// as validated. Any other error fails only this entry.
pub fn remediation_outcome<T, E>(
    resource_id: String,
    label: ActionLabel,
    dry_run: bool,
    outcome: Result<T, E>,
) -> RemediationResult
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match outcome {
        Ok(_) if dry_run => label.validated(resource_id),
        Ok(_) => {
            debug!(resource_id = %resource_id, action = label.planned, "remediation applied");
            label.completed(resource_id)
        }
        Err(err) if dry_run && is_dry_run_success(&err) => label.validated(resource_id),
        Err(err) => {
            let message = sdk_error_message(&err);
            warn!(resource_id = %resource_id, action = label.planned, error = %message, "remediation failed");
            RemediationResult::failed(resource_id, message)
        }
    }
}

/// Result entry for an id whose lookup found nothing.
pub fn not_found(resource_id: String, kind: &str) -> RemediationResult {
    warn!(resource_id = %resource_id, kind, "remediation target not found");
    let error = format!("{kind} {resource_id} not found");
    RemediationResult::failed(resource_id, error)
}
