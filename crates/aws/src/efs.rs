use aws_sdk_efs::Client;
use aws_sdk_efs::types::FileSystemDescription;
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::into_optimizer_error;
use crate::outcome::{ActionLabel, remediation_outcome};
use crate::pricing;

const DELETE_FILE_SYSTEM: ActionLabel = ActionLabel::new("Deleted EFS", "delete EFS");

/// Elastic file systems with no mount targets, which nothing can reach.
#[derive(Debug)]
pub struct EfsOptimizer {
    base: OptimizerBase,
}

impl EfsOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

/// The parts of a file system description the predicate looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemSummary {
    pub file_system_id: String,
    pub name: String,
    pub size_bytes: i64,
    pub mount_targets: i32,
    pub performance_mode: String,
    pub throughput_mode: String,
}

impl From<&FileSystemDescription> for FileSystemSummary {
    fn from(fs: &FileSystemDescription) -> Self {
        Self {
            file_system_id: fs.file_system_id().to_owned(),
            name: fs.name().unwrap_or_default().to_owned(),
            size_bytes: fs.size_in_bytes().map_or(0, |s| s.value()),
            mount_targets: fs.number_of_mount_targets(),
            performance_mode: fs.performance_mode().as_str().to_owned(),
            throughput_mode: fs
                .throughput_mode()
                .map(|t| t.as_str().to_owned())
                .unwrap_or_default(),
        }
    }
}

pub fn unmounted_file_system(fs: &FileSystemSummary) -> Option<Candidate> {
    if fs.mount_targets > 0 || fs.file_system_id.is_empty() {
        return None;
    }
    Some(Candidate::new(
        fs.file_system_id.clone(),
        json!({
            "filesystem_id": fs.file_system_id,
            "name": fs.name,
            "size_bytes": fs.size_bytes,
            "performance_mode": fs.performance_mode,
            "throughput_mode": fs.throughput_mode,
            "mount_targets": fs.mount_targets,
        }),
        pricing::bytes_to_gib(fs.size_bytes) * pricing::EFS_GB_MONTH,
    ))
}

async fn delete_file_system(client: Client, dry_run: bool, fs_id: String) -> RemediationResult {
    if dry_run {
        let outcome = client.describe_file_systems().file_system_id(&fs_id).send().await;
        return remediation_outcome(fs_id, DELETE_FILE_SYSTEM, true, outcome);
    }
    let outcome = client.delete_file_system().file_system_id(&fs_id).send().await;
    remediation_outcome(fs_id, DELETE_FILE_SYSTEM, false, outcome)
}

impl Optimizer for EfsOptimizer {
    fn technique(&self) -> Technique {
        Technique::Efs
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "efs", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let pages = client
            .describe_file_systems()
            .into_paginator()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;
        let file_systems: Vec<FileSystemSummary> = pages
            .iter()
            .flat_map(|page| page.file_systems())
            .map(FileSystemSummary::from)
            .collect();

        let candidates: Vec<_> = file_systems.iter().filter_map(unmounted_file_system).collect();
        info!(
            scanned = file_systems.len(),
            idle = candidates.len(),
            "EFS scan complete"
        );
        record(&mut self.base, Technique::Efs, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "efs", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            delete_file_system(client.clone(), dry_run, id)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, mount_targets: i32, size_bytes: i64) -> FileSystemSummary {
        FileSystemSummary {
            file_system_id: id.to_owned(),
            name: "shared".to_owned(),
            size_bytes,
            mount_targets,
            performance_mode: "generalPurpose".to_owned(),
            throughput_mode: "bursting".to_owned(),
        }
    }

    #[test]
    fn unmounted_file_system_is_priced_per_gib() {
        let ten_gib = 10 * 1024 * 1024 * 1024;
        let c = unmounted_file_system(&summary("fs-1", 0, ten_gib)).unwrap();
        assert_eq!(c.resource_id, "fs-1");
        assert_eq!(c.details["mount_targets"], 0);
        assert!((c.monthly_cost - 3.0).abs() < 1e-9);
    }

    #[test]
    fn mounted_file_system_is_kept() {
        assert!(unmounted_file_system(&summary("fs-2", 2, 0)).is_none());
    }
}
