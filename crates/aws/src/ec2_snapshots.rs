use std::collections::HashSet;

use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Image, Snapshot};
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

/// Snapshots younger than this are never flagged.
pub const MIN_AGE_DAYS: i64 = 30;

const DELETE_SNAPSHOT: ActionLabel = ActionLabel::new("Deleted snapshot", "delete snapshot");

/// Old account-owned snapshots that back none of the account's AMIs.
#[derive(Debug)]
pub struct Ec2SnapshotOptimizer {
    base: OptimizerBase,
}

impl Ec2SnapshotOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

/// Snapshot ids referenced by the block device mappings of `images`.
pub fn snapshots_in_use(images: &[Image]) -> HashSet<String> {
    images
        .iter()
        .flat_map(Image::block_device_mappings)
        .filter_map(|m| m.ebs().and_then(|ebs| ebs.snapshot_id()))
        .map(str::to_owned)
        .collect()
}

/// Check one snapshot. `Err` carries the reason a snapshot without a usable
/// start time could not be aged.
pub fn unused_snapshot(
    snapshot: &Snapshot,
    in_use: &HashSet<String>,
    now: DateTime<Utc>,
) -> Result<Option<Candidate>, String> {
    let Some(snapshot_id) = snapshot.snapshot_id() else {
        return Ok(None);
    };
    if in_use.contains(snapshot_id) {
        return Ok(None);
    }
    let Some(started) = snapshot.start_time().and_then(to_utc) else {
        return Err(format!("start time not reported for {snapshot_id}"));
    };
    let days_old = days_since(started, now);
    if days_old <= MIN_AGE_DAYS {
        return Ok(None);
    }
    let size = snapshot.volume_size().unwrap_or(0);

    Ok(Some(Candidate::new(
        snapshot_id,
        json!({
            "size_gb": size,
            "created": started.to_rfc3339(),
            "days_old": days_old,
            "description": snapshot.description().unwrap_or_default(),
            "state": snapshot.state().map(|s| s.as_str()).unwrap_or_default(),
        }),
        pricing::per_gb(size, pricing::EC2_SNAPSHOT_GB_MONTH),
    )))
}

async fn delete_snapshot(client: Client, dry_run: bool, snapshot_id: String) -> RemediationResult {
    let outcome = client
        .delete_snapshot()
        .snapshot_id(&snapshot_id)
        .dry_run(dry_run)
        .send()
        .await;
    remediation_outcome(snapshot_id, DELETE_SNAPSHOT, dry_run, outcome)
}

impl Optimizer for Ec2SnapshotOptimizer {
    fn technique(&self) -> Technique {
        Technique::Ec2Snapshots
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "ec2-snapshots", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);

        let (snapshots, images) = futures::try_join!(
            async {
                client
                    .describe_snapshots()
                    .owner_ids("self")
                    .into_paginator()
                    .items()
                    .send()
                    .try_collect()
                    .await
                    .map_err(|e| into_optimizer_error(&e))
            },
            async {
                client
                    .describe_images()
                    .owners("self")
                    .send()
                    .await
                    .map_err(|e| into_optimizer_error(&e))
            },
        )?;

        let in_use = snapshots_in_use(images.images());
        let now = Utc::now();
        let mut candidates = Vec::new();
        for snapshot in &snapshots {
            match unused_snapshot(snapshot, &in_use, now) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(reason) => self.base.skip(snapshot.snapshot_id().unwrap_or_default(), reason),
            }
        }
        info!(
            scanned = snapshots.len(),
            referenced = in_use.len(),
            idle = candidates.len(),
            "snapshot scan complete"
        );
        record(&mut self.base, Technique::Ec2Snapshots, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "ec2-snapshots", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            delete_snapshot(client.clone(), dry_run, id)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_ec2::primitives::DateTime as SmithyDateTime;
    use aws_sdk_ec2::types::{BlockDeviceMapping, EbsBlockDevice};
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn snapshot(id: &str, age_days: i64, size: i32) -> Snapshot {
        let started = now() - Duration::days(age_days);
        Snapshot::builder()
            .snapshot_id(id)
            .volume_size(size)
            .start_time(SmithyDateTime::from_secs(started.timestamp()))
            .description("nightly")
            .build()
    }

    fn image_using(snapshot_id: &str) -> Image {
        Image::builder()
            .image_id("ami-1")
            .block_device_mappings(
                BlockDeviceMapping::builder()
                    .device_name("/dev/xvda")
                    .ebs(EbsBlockDevice::builder().snapshot_id(snapshot_id).build())
                    .build(),
            )
            .build()
    }

    #[test]
    fn collects_ami_snapshot_references() {
        let images = vec![image_using("snap-a"), Image::builder().image_id("ami-2").build()];
        let in_use = snapshots_in_use(&images);
        assert_eq!(in_use.len(), 1);
        assert!(in_use.contains("snap-a"));
    }

    #[test]
    fn old_unreferenced_snapshot_is_flagged() {
        let in_use = HashSet::new();
        let c = unused_snapshot(&snapshot("snap-old", 45, 20), &in_use, now())
            .unwrap()
            .unwrap();
        assert_eq!(c.resource_id, "snap-old");
        assert!((c.monthly_cost - 1.0).abs() < 1e-9);
        assert_eq!(c.details["days_old"], 45);
    }

    #[test]
    fn young_snapshot_is_not_flagged() {
        let in_use = HashSet::new();
        assert!(
            unused_snapshot(&snapshot("snap-new", 30, 20), &in_use, now())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn referenced_snapshot_is_not_flagged() {
        let in_use: HashSet<String> = ["snap-ami".to_owned()].into_iter().collect();
        assert!(
            unused_snapshot(&snapshot("snap-ami", 400, 8), &in_use, now())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn snapshot_without_start_time_cannot_be_aged() {
        let undated = Snapshot::builder().snapshot_id("snap-undated").volume_size(8).build();
        let reason = unused_snapshot(&undated, &HashSet::new(), now()).unwrap_err();
        assert!(reason.contains("snap-undated"));
    }

    #[test]
    fn referenced_snapshot_without_start_time_is_ignored() {
        let undated = Snapshot::builder().snapshot_id("snap-ami").build();
        let in_use: HashSet<String> = ["snap-ami".to_owned()].into_iter().collect();
        assert_eq!(unused_snapshot(&undated, &in_use, now()), Ok(None));
    }
}
