use aws_sdk_ecs::Client;
use aws_sdk_ecs::types::{TaskDefinition, TaskDefinitionStatus};
use futures::StreamExt;
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::{into_optimizer_error, sdk_error_message};
use crate::outcome::{ActionLabel, remediation_outcome};
use crate::time::iso_or_empty;

const DEREGISTER: ActionLabel =
    ActionLabel::new("Deregistered task definition", "deregister task definition");

/// Inactive task definition revisions. They cost nothing but clutter the
/// registry.
#[derive(Debug)]
pub struct EcsTaskDefinitionOptimizer {
    base: OptimizerBase,
}

impl EcsTaskDefinitionOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

pub fn inactive_task_definition(arn: &str, td: &TaskDefinition) -> Candidate {
    Candidate::new(
        arn,
        json!({
            "family": td.family().unwrap_or_default(),
            "revision": td.revision(),
            "status": td.status().map(|s| s.as_str()).unwrap_or_default(),
            "cpu": td.cpu().unwrap_or_default(),
            "memory": td.memory().unwrap_or_default(),
            "registered_at": iso_or_empty(td.registered_at()),
            "container_count": td.container_definitions().len(),
        }),
        0.0,
    )
}

async fn describe(client: &Client, arn: &str) -> Result<TaskDefinition, String> {
    let output = client
        .describe_task_definition()
        .task_definition(arn)
        .send()
        .await
        .map_err(|e| sdk_error_message(&e))?;
    output
        .task_definition
        .ok_or_else(|| "task definition missing from response".to_owned())
}

async fn deregister(client: Client, dry_run: bool, arn: String) -> RemediationResult {
    if dry_run {
        let outcome = client
            .describe_task_definition()
            .task_definition(&arn)
            .send()
            .await;
        return remediation_outcome(arn, DEREGISTER, true, outcome);
    }
    let outcome = client
        .deregister_task_definition()
        .task_definition(&arn)
        .send()
        .await;
    remediation_outcome(arn, DEREGISTER, false, outcome)
}

impl Optimizer for EcsTaskDefinitionOptimizer {
    fn technique(&self) -> Technique {
        Technique::EcsTaskDefinitions
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "ecs-task-definitions", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let pages = client
            .list_task_definitions()
            .status(TaskDefinitionStatus::Inactive)
            .into_paginator()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;
        let arns: Vec<String> = pages
            .into_iter()
            .flat_map(|page| page.task_definition_arns.unwrap_or_default())
            .collect();

        let lookups: Vec<_> = arns.iter().map(|arn| describe(&client, arn)).collect();
        let details: Vec<_> = futures::stream::iter(lookups)
            .buffered(self.base.concurrency())
            .collect()
            .await;

        let mut candidates = Vec::new();
        for (arn, detail) in arns.iter().zip(details) {
            match detail {
                Ok(td) => candidates.push(inactive_task_definition(arn, &td)),
                Err(reason) => self.base.skip(arn.as_str(), reason),
            }
        }
        info!(
            scanned = arns.len(),
            idle = candidates.len(),
            "ECS task definition scan complete"
        );
        record(&mut self.base, Technique::EcsTaskDefinitions, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "ecs-task-definitions", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |arn| {
            deregister(client.clone(), dry_run, arn)
        })
        .await)
    }
}
