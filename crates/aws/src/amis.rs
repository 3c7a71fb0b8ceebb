use std::collections::HashSet;

use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Image, Instance, InstanceStateName, Reservation};
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
use crate::time::{days_since, parse_iso8601};

/// Images younger than this are never flagged.
pub const MIN_AGE_DAYS: i64 = 30;

const DEREGISTER_IMAGE: ActionLabel = ActionLabel::new("Deleted AMI", "deregister AMI");

/// Old account-owned AMIs that no live instance was launched from.
#[derive(Debug)]
pub struct AmiOptimizer {
    base: OptimizerBase,
}

impl AmiOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

pub fn is_live(instance: &Instance) -> bool {
    instance.state().and_then(|s| s.name()) != Some(&InstanceStateName::Terminated)
}

/// AMI ids referenced by non-terminated instances.
pub fn images_in_use<'a>(instances: impl IntoIterator<Item = &'a Instance>) -> HashSet<String> {
    instances
        .into_iter()
        .filter(|i| is_live(i))
        .filter_map(Instance::image_id)
        .map(str::to_owned)
        .collect()
}

pub fn unused_image(
    image: &Image,
    in_use: &HashSet<String>,
    now: DateTime<Utc>,
) -> Option<Candidate> {
    let image_id = image.image_id()?;
    if in_use.contains(image_id) {
        return None;
    }
    let created = image.creation_date().and_then(parse_iso8601)?;
    let days_old = days_since(created, now);
    if days_old <= MIN_AGE_DAYS {
        return None;
    }
    Some(Candidate::new(
        image_id,
        json!({
            "name": image.name().unwrap_or_default(),
            "ami_id": image_id,
            "created": created.to_rfc3339(),
            "days_old": days_old,
            "architecture": image.architecture().map(|a| a.as_str()).unwrap_or_default(),
            "root_device_type": image.root_device_type().map(|d| d.as_str()).unwrap_or_default(),
            "state": image.state().map(|s| s.as_str()).unwrap_or_default(),
        }),
        pricing::AMI_MONTHLY,
    ))
}

async fn deregister_image(client: Client, dry_run: bool, image_id: String) -> RemediationResult {
    let outcome = client
        .deregister_image()
        .image_id(&image_id)
        .dry_run(dry_run)
        .send()
        .await;
    remediation_outcome(image_id, DEREGISTER_IMAGE, dry_run, outcome)
}

impl Optimizer for AmiOptimizer {
    fn technique(&self) -> Technique {
        Technique::Amis
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "amis", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let (images, reservations) = futures::try_join!(
            async {
                client
                    .describe_images()
                    .owners("self")
                    .send()
                    .await
                    .map_err(|e| into_optimizer_error(&e))
            },
            async {
                client
                    .describe_instances()
                    .into_paginator()
                    .items()
                    .send()
                    .try_collect()
                    .await
                    .map_err(|e| into_optimizer_error(&e))
            },
        )?;

        let in_use = images_in_use(reservations.iter().flat_map(Reservation::instances));
        let now = Utc::now();
        let candidates: Vec<_> = images
            .images()
            .iter()
            .filter_map(|image| unused_image(image, &in_use, now))
            .collect();
        info!(
            scanned = images.images().len(),
            in_use = in_use.len(),
            idle = candidates.len(),
            "AMI scan complete"
        );
        record(&mut self.base, Technique::Amis, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "amis", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            deregister_image(client.clone(), dry_run, id)
        })
        .await)
    }
}
