use aws_sdk_elasticbeanstalk::Client;
use aws_sdk_elasticbeanstalk::types::{EnvironmentDescription, EnvironmentStatus};
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::{into_optimizer_error, sdk_error_message};
use crate::outcome::{ActionLabel, not_found};
use crate::pricing;
use crate::time::iso_or_empty;

const TERMINATE_ENVIRONMENT: ActionLabel =
    ActionLabel::new("Terminated environment", "terminate environment");

/// Environments that are terminated or on their way out.
#[derive(Debug)]
pub struct ElasticBeanstalkOptimizer {
    base: OptimizerBase,
}

impl ElasticBeanstalkOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

pub fn is_winding_down(status: Option<&EnvironmentStatus>) -> bool {
    matches!(
        status,
        Some(EnvironmentStatus::Terminated | EnvironmentStatus::Terminating)
    )
}

pub fn terminated_environment(env: &EnvironmentDescription) -> Option<Candidate> {
    let env_id = env.environment_id()?;
    if !is_winding_down(env.status()) {
        return None;
    }
    Some(Candidate::new(
        env_id,
        json!({
            "environment_id": env_id,
            "environment_name": env.environment_name().unwrap_or_default(),
            "status": env.status().map(|s| s.as_str()).unwrap_or_default(),
            "platform": env.platform_arn().unwrap_or_default(),
            "date_created": iso_or_empty(env.date_created()),
            "date_updated": iso_or_empty(env.date_updated()),
        }),
        pricing::BEANSTALK_ENVIRONMENT_MONTHLY,
    ))
}

async fn terminate_environment(client: Client, dry_run: bool, env_id: String) -> RemediationResult {
    let lookup = client
        .describe_environments()
        .environment_ids(&env_id)
        .send()
        .await;
    let env_name = match lookup {
        Ok(output) => output
            .environments()
            .first()
            .map(|e| e.environment_name().unwrap_or_default().to_owned()),
        Err(err) => return RemediationResult::failed(env_id, sdk_error_message(&err)),
    };
    let Some(env_name) = env_name else {
        return not_found(env_id, "Environment");
    };
    if dry_run {
        return TERMINATE_ENVIRONMENT.validated(env_id);
    }

    match client
        .terminate_environment()
        .environment_id(&env_id)
        .force_terminate(true)
        .send()
        .await
    {
        Ok(_) => RemediationResult::success(env_id, format!("Terminated environment {env_name}")),
        Err(err) => {
            let message = sdk_error_message(&err);
            warn!(resource_id = %env_id, error = %message, "environment termination failed");
            RemediationResult::failed(env_id, message)
        }
    }
}

impl Optimizer for ElasticBeanstalkOptimizer {
    fn technique(&self) -> Technique {
        Technique::ElasticBeanstalk
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "elastic-beanstalk", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let output = client
            .describe_environments()
            .send()
            .await
            .map_err(|e| into_optimizer_error(&e))?;

        let candidates: Vec<_> = output
            .environments()
            .iter()
            .filter_map(terminated_environment)
            .collect();
        info!(
            scanned = output.environments().len(),
            idle = candidates.len(),
            "Elastic Beanstalk scan complete"
        );
        record(&mut self.base, Technique::ElasticBeanstalk, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "elastic-beanstalk", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            terminate_environment(client.clone(), dry_run, id)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(id: &str, status: EnvironmentStatus) -> EnvironmentDescription {
        EnvironmentDescription::builder()
            .environment_id(id)
            .environment_name("staging")
            .status(status)
            .build()
    }

    #[test]
    fn terminated_environment_is_flagged() {
        let c = terminated_environment(&env("e-1", EnvironmentStatus::Terminated)).unwrap();
        assert_eq!(c.resource_id, "e-1");
        assert_eq!(c.details["environment_name"], "staging");
        assert_eq!(c.details["status"], "Terminated");
        assert!((c.monthly_cost - 20.0).abs() < 1e-9);
        assert!(terminated_environment(&env("e-2", EnvironmentStatus::Terminating)).is_some());
    }

    #[test]
    fn ready_environment_is_kept() {
        assert!(terminated_environment(&env("e-3", EnvironmentStatus::Ready)).is_none());
    }
}
