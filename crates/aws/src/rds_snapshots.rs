use aws_sdk_rds::Client;
use aws_sdk_rds::types::DbSnapshot;
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

const DELETE_DB_SNAPSHOT: ActionLabel =
    ActionLabel::new("Deleted RDS snapshot", "delete RDS snapshot");

/// Old manual RDS snapshots. Automated snapshots expire on their own and
/// cannot be deleted directly, so they are not listed.
#[derive(Debug)]
pub struct RdsSnapshotOptimizer {
    base: OptimizerBase,
}

impl RdsSnapshotOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

pub fn old_snapshot(snapshot: &DbSnapshot, now: DateTime<Utc>) -> Option<Candidate> {
    let snapshot_id = snapshot.db_snapshot_identifier()?;
    let created = snapshot.snapshot_create_time().and_then(to_utc)?;
    let days_old = days_since(created, now);
    if days_old <= MIN_AGE_DAYS {
        return None;
    }
    let size = snapshot.allocated_storage().unwrap_or(0);
    Some(Candidate::new(
        snapshot_id,
        json!({
            "snapshot_id": snapshot_id,
            "db_instance": snapshot.db_instance_identifier().unwrap_or_default(),
            "created": created.to_rfc3339(),
            "days_old": days_old,
            "size_gb": size,
            "status": snapshot.status().unwrap_or_default(),
            "engine": snapshot.engine().unwrap_or_default(),
        }),
        pricing::per_gb(size, pricing::RDS_SNAPSHOT_GB_MONTH),
    ))
}

async fn delete_db_snapshot(client: Client, dry_run: bool, snapshot_id: String) -> RemediationResult {
    if dry_run {
        let outcome = client
            .describe_db_snapshots()
            .db_snapshot_identifier(&snapshot_id)
            .send()
            .await;
        return remediation_outcome(snapshot_id, DELETE_DB_SNAPSHOT, true, outcome);
    }
    let outcome = client
        .delete_db_snapshot()
        .db_snapshot_identifier(&snapshot_id)
        .send()
        .await;
    remediation_outcome(snapshot_id, DELETE_DB_SNAPSHOT, false, outcome)
}

impl Optimizer for RdsSnapshotOptimizer {
    fn technique(&self) -> Technique {
        Technique::RdsSnapshots
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "rds-snapshots", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let pages = client
            .describe_db_snapshots()
            .snapshot_type("manual")
            .into_paginator()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;
        let snapshots: Vec<DbSnapshot> = pages
            .into_iter()
            .flat_map(|page| page.db_snapshots.unwrap_or_default())
            .collect();

        let now = Utc::now();
        let candidates: Vec<_> = snapshots.iter().filter_map(|s| old_snapshot(s, now)).collect();
        info!(
            scanned = snapshots.len(),
            idle = candidates.len(),
            "RDS snapshot scan complete"
        );
        record(&mut self.base, Technique::RdsSnapshots, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "rds-snapshots", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            delete_db_snapshot(client.clone(), dry_run, id)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_rds::primitives::DateTime as SmithyDateTime;
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn snapshot(id: &str, age_days: i64) -> DbSnapshot {
        let created = now() - Duration::days(age_days);
        DbSnapshot::builder()
            .db_snapshot_identifier(id)
            .db_instance_identifier("orders-db")
            .snapshot_create_time(SmithyDateTime::from_secs(created.timestamp()))
            .allocated_storage(200)
            .engine("postgres")
            .status("available")
            .build()
    }

    #[test]
    fn old_snapshot_is_priced_by_allocated_storage() {
        let c = old_snapshot(&snapshot("orders-2024-01", 90), now()).unwrap();
        assert_eq!(c.resource_id, "orders-2024-01");
        assert_eq!(c.details["engine"], "postgres");
        assert!((c.monthly_cost - 19.0).abs() < 1e-9);
    }

    #[test]
    fn young_snapshot_is_kept() {
        assert!(old_snapshot(&snapshot("orders-recent", 10), now()).is_none());
    }
}
