use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::VpcEndpoint;
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::into_optimizer_error;
use crate::outcome::{ActionLabel, remediation_outcome};
use crate::pricing;
use crate::time::iso_or_empty;

/// Endpoint states that mean the endpoint serves no traffic.
pub const DEAD_STATES: [&str; 3] = ["failed", "expired", "deleted"];

const DELETE_ENDPOINT: ActionLabel =
    ActionLabel::new("Deleted VPC endpoint", "delete VPC endpoint");

/// VPC endpoints stuck in a failed, expired, or deleted state.
#[derive(Debug)]
pub struct VpcEndpointOptimizer {
    base: OptimizerBase,
}

impl VpcEndpointOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

/// EC2 reports endpoint states in either case depending on the API version.
pub fn is_dead_state(state: &str) -> bool {
    DEAD_STATES.iter().any(|s| s.eq_ignore_ascii_case(state))
}

pub fn dead_endpoint(endpoint: &VpcEndpoint) -> Option<Candidate> {
    let endpoint_id = endpoint.vpc_endpoint_id()?;
    let state = endpoint.state().map(|s| s.as_str()).unwrap_or_default();
    if !is_dead_state(state) {
        return None;
    }
    Some(Candidate::new(
        endpoint_id,
        json!({
            "endpoint_id": endpoint_id,
            "service_name": endpoint.service_name().unwrap_or_default(),
            "state": state,
            "vpc_id": endpoint.vpc_id().unwrap_or_default(),
            "type": endpoint.vpc_endpoint_type().map(|t| t.as_str()).unwrap_or_default(),
            "creation_timestamp": iso_or_empty(endpoint.creation_timestamp()),
        }),
        pricing::hourly_to_monthly(pricing::VPC_ENDPOINT_HOURLY),
    ))
}

async fn delete_endpoint(client: Client, dry_run: bool, endpoint_id: String) -> RemediationResult {
    let outcome = client
        .delete_vpc_endpoints()
        .vpc_endpoint_ids(&endpoint_id)
        .dry_run(dry_run)
        .send()
        .await;

    // The batch API reports per-endpoint failures in the response body.
    if let Ok(output) = &outcome {
        if let Some(item) = output.unsuccessful().first() {
            let error = item
                .error()
                .and_then(|e| e.message())
                .unwrap_or("VPC endpoint deletion was rejected")
                .to_owned();
            warn!(resource_id = %endpoint_id, error = %error, "VPC endpoint deletion failed");
            return RemediationResult::failed(endpoint_id, error);
        }
    }
    remediation_outcome(endpoint_id, DELETE_ENDPOINT, dry_run, outcome)
}

impl Optimizer for VpcEndpointOptimizer {
    fn technique(&self) -> Technique {
        Technique::VpcEndpoints
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "vpc-endpoints", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let endpoints = client
            .describe_vpc_endpoints()
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;

        let candidates: Vec<_> = endpoints.iter().filter_map(dead_endpoint).collect();
        info!(
            scanned = endpoints.len(),
            idle = candidates.len(),
            "VPC endpoint scan complete"
        );
        record(&mut self.base, Technique::VpcEndpoints, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "vpc-endpoints", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            delete_endpoint(client.clone(), dry_run, id)
        })
        .await)
    }
}
