use aws_sdk_s3::Client;
use aws_sdk_s3::types::Bucket;
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

const DELETE_BUCKET: ActionLabel = ActionLabel::new("Deleted bucket", "delete bucket");

/// Buckets that contain no objects.
#[derive(Debug)]
pub struct S3BucketOptimizer {
    base: OptimizerBase,
}

impl S3BucketOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

/// Build an S3 client. Custom endpoints need path-style addressing.
async fn s3_client(base: &OptimizerBase) -> Client {
    let sdk_config = build_sdk_config(base).await;
    let config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(base.endpoint_url().is_some())
        .build();
    Client::from_conf(config)
}

pub fn empty_bucket(bucket: &Bucket, object_count: usize) -> Option<Candidate> {
    let name = bucket.name()?;
    if object_count > 0 {
        return None;
    }
    Some(Candidate::new(
        name,
        json!({
            "bucket_name": name,
            "created": iso_or_empty(bucket.creation_date()),
            "object_count": 0,
            "is_empty": true,
        }),
        0.0,
    ))
}

/// Number of objects seen when listing at most one key.
async fn probe_objects(client: &Client, bucket: &Bucket) -> Result<usize, String> {
    let Some(name) = bucket.name() else {
        return Err("bucket has no name".to_owned());
    };
    let output = client
        .list_objects_v2()
        .bucket(name)
        .max_keys(1)
        .send()
        .await
        .map_err(|e| sdk_error_message(&e))?;
    Ok(output.contents().len())
}

async fn delete_bucket(client: Client, dry_run: bool, name: String) -> RemediationResult {
    if dry_run {
        let outcome = client.head_bucket().bucket(&name).send().await;
        return remediation_outcome(name, DELETE_BUCKET, true, outcome);
    }
    let outcome = client.delete_bucket().bucket(&name).send().await;
    remediation_outcome(name, DELETE_BUCKET, false, outcome)
}

impl Optimizer for S3BucketOptimizer {
    fn technique(&self) -> Technique {
        Technique::S3Buckets
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "s3-buckets", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = s3_client(&self.base).await;
        let output = client
            .list_buckets()
            .send()
            .await
            .map_err(|e| into_optimizer_error(&e))?;
        let buckets = output.buckets();

        let probes: Vec<_> = buckets.iter().map(|b| probe_objects(&client, b)).collect();
        let counts: Vec<_> = futures::stream::iter(probes)
            .buffered(self.base.concurrency())
            .collect()
            .await;

        let mut candidates = Vec::new();
        for (bucket, count) in buckets.iter().zip(counts) {
            match count {
                Ok(count) => candidates.extend(empty_bucket(bucket, count)),
                Err(reason) => self.base.skip(bucket.name().unwrap_or_default(), reason),
            }
        }
        info!(
            scanned = buckets.len(),
            idle = candidates.len(),
            "S3 bucket scan complete"
        );
        record(&mut self.base, Technique::S3Buckets, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "s3-buckets", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = s3_client(&self.base).await;
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |name| {
            delete_bucket(client.clone(), dry_run, name)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bucket_is_flagged_at_zero_cost() {
        let bucket = Bucket::builder().name("old-artifacts").build();
        let c = empty_bucket(&bucket, 0).unwrap();
        assert_eq!(c.resource_id, "old-artifacts");
        assert_eq!(c.details["is_empty"], true);
        assert_eq!(c.details["created"], "");
        assert_eq!(c.monthly_cost, 0.0);
    }

    #[test]
    fn bucket_with_objects_is_kept() {
        let bucket = Bucket::builder().name("data").build();
        assert!(empty_bucket(&bucket, 1).is_none());
    }
}
