use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Filter, Volume};
use chrono::{DateTime, Utc};
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::into_optimizer_error;
use crate::outcome::{ActionLabel, remediation_outcome};
use crate::pricing;
use crate::time::{days_since, to_utc};

const DELETE_VOLUME: ActionLabel = ActionLabel::new("Deleted EBS volume", "delete EBS volume");

/// Unattached EBS volumes.
#[derive(Debug)]
pub struct EbsOptimizer {
    base: OptimizerBase,
}

impl EbsOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

/// A volume in the `available` state is attached to nothing.
pub fn idle_volume(volume: &Volume, now: DateTime<Utc>) -> Option<Candidate> {
    let volume_id = volume.volume_id()?;
    let size = volume.size().unwrap_or(0);
    let created = volume.create_time().and_then(to_utc);

    Some(Candidate::new(
        volume_id,
        json!({
            "size_gb": size,
            "created": created.map(|c| c.to_rfc3339()),
            "days_old": created.map(|c| days_since(c, now)),
            "availability_zone": volume.availability_zone().unwrap_or_default(),
            "state": volume.state().map(|s| s.as_str()).unwrap_or_default(),
        }),
        pricing::per_gb(size, pricing::EBS_GB_MONTH),
    ))
}

async fn delete_volume(client: Client, dry_run: bool, volume_id: String) -> RemediationResult {
    let outcome = client
        .delete_volume()
        .volume_id(&volume_id)
        .dry_run(dry_run)
        .send()
        .await;
    remediation_outcome(volume_id, DELETE_VOLUME, dry_run, outcome)
}

impl Optimizer for EbsOptimizer {
    fn technique(&self) -> Technique {
        Technique::Ebs
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "ebs", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let volumes = client
            .describe_volumes()
            .filters(Filter::builder().name("status").values("available").build())
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;

        let now = Utc::now();
        let candidates: Vec<_> = volumes.iter().filter_map(|v| idle_volume(v, now)).collect();
        info!(scanned = volumes.len(), idle = candidates.len(), "EBS scan complete");
        record(&mut self.base, Technique::Ebs, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "ebs", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            delete_volume(client.clone(), dry_run, id)
        })
        .await)
    }
}
