use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::types::{LogGroup, OrderBy};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::{into_optimizer_error, sdk_error_message};
use crate::outcome::{ActionLabel, not_found, remediation_outcome};
use crate::pricing;
use crate::time::{days_since, from_millis};

/// Groups with activity in this many days are left alone.
pub const MAX_IDLE_DAYS: i64 = 30;

/// Reported as `days_since_activity` for groups that never received events.
pub const NEVER_ACTIVE_DAYS: i64 = 999;

const DELETE_LOG_GROUP: ActionLabel =
    ActionLabel::new("Deleted log group", "delete log group");

/// Log groups with no events in the last month.
#[derive(Debug)]
pub struct CloudWatchLogsOptimizer {
    base: OptimizerBase,
}

impl CloudWatchLogsOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

pub fn inactive_log_group(
    group: &LogGroup,
    last_event: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<Candidate> {
    let name = group.log_group_name()?;
    let days_since_activity = last_event.map_or(NEVER_ACTIVE_DAYS, |t| days_since(t, now));
    if days_since_activity <= MAX_IDLE_DAYS {
        return None;
    }
    let stored_bytes = group.stored_bytes().unwrap_or(0);
    let stored_gb = pricing::bytes_to_gib(stored_bytes);
    Some(Candidate::new(
        name,
        json!({
            "log_group_name": name,
            "created": group.creation_time().and_then(from_millis).map(|c| c.to_rfc3339()),
            "days_since_activity": days_since_activity,
            "stored_bytes": stored_bytes,
            "stored_gb": (stored_gb * 100.0).round() / 100.0,
            "retention_days": group.retention_in_days(),
        }),
        stored_gb * pricing::LOGS_GB_MONTH,
    ))
}

/// Timestamp of the most recent event in any stream of the group.
async fn last_event(client: &Client, group_name: &str) -> Result<Option<DateTime<Utc>>, String> {
    let output = client
        .describe_log_streams()
        .log_group_name(group_name)
        .order_by(OrderBy::LastEventTime)
        .descending(true)
        .limit(1)
        .send()
        .await
        .map_err(|e| sdk_error_message(&e))?;
    Ok(output
        .log_streams()
        .first()
        .and_then(|s| s.last_event_timestamp())
        .and_then(from_millis))
}

async fn group_activity(client: &Client, group: &LogGroup) -> Result<Option<DateTime<Utc>>, String> {
    match group.log_group_name() {
        Some(name) => last_event(client, name).await,
        None => Err("log group has no name".to_owned()),
    }
}

async fn delete_log_group(client: Client, dry_run: bool, name: String) -> RemediationResult {
    if dry_run {
        let lookup = client
            .describe_log_groups()
            .log_group_name_prefix(&name)
            .send()
            .await;
        return match lookup {
            Ok(output)
                if output
                    .log_groups()
                    .iter()
                    .any(|g| g.log_group_name() == Some(name.as_str())) =>
            {
                DELETE_LOG_GROUP.validated(name)
            }
            Ok(_) => not_found(name, "Log group"),
            Err(err) => RemediationResult::failed(name, sdk_error_message(&err)),
        };
    }
    let outcome = client.delete_log_group().log_group_name(&name).send().await;
    remediation_outcome(name, DELETE_LOG_GROUP, false, outcome)
}

impl Optimizer for CloudWatchLogsOptimizer {
    fn technique(&self) -> Technique {
        Technique::CloudwatchLogs
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "cloudwatch-logs", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let pages = client
            .describe_log_groups()
            .into_paginator()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;
        let groups: Vec<LogGroup> = pages
            .into_iter()
            .flat_map(|page| page.log_groups.unwrap_or_default())
            .collect();

        let checks: Vec<_> = groups.iter().map(|g| group_activity(&client, g)).collect();
        let activity: Vec<_> = futures::stream::iter(checks)
            .buffered(self.base.concurrency())
            .collect()
            .await;

        let now = Utc::now();
        let mut candidates = Vec::new();
        for (group, last) in groups.iter().zip(activity) {
            match last {
                Ok(last) => candidates.extend(inactive_log_group(group, last, now)),
                Err(reason) => {
                    self.base.skip(group.log_group_name().unwrap_or_default(), reason);
                }
            }
        }
        info!(
            scanned = groups.len(),
            idle = candidates.len(),
            "log group scan complete"
        );
        record(&mut self.base, Technique::CloudwatchLogs, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "cloudwatch-logs", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |name| {
            delete_log_group(client.clone(), dry_run, name)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn group(name: &str, stored_bytes: i64) -> LogGroup {
        LogGroup::builder()
            .log_group_name(name)
            .stored_bytes(stored_bytes)
            .creation_time(1_600_000_000_000)
            .build()
    }

    #[test]
    fn never_active_group_is_flagged() {
        let two_gib = 2 * 1024 * 1024 * 1024;
        let c = inactive_log_group(&group("/aws/lambda/old", two_gib), None, now()).unwrap();
        assert_eq!(c.resource_id, "/aws/lambda/old");
        assert_eq!(c.details["days_since_activity"], 999);
        assert_eq!(c.details["stored_gb"], 2.0);
        assert!(c.details["retention_days"].is_null());
        assert!((c.monthly_cost - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stale_group_is_flagged() {
        let last = now() - Duration::days(45);
        let c = inactive_log_group(&group("/app/batch", 0), Some(last), now()).unwrap();
        assert_eq!(c.details["days_since_activity"], 45);
        assert_eq!(c.monthly_cost, 0.0);
    }

    #[test]
    fn active_group_is_kept() {
        let last = now() - Duration::days(2);
        assert!(inactive_log_group(&group("/app/api", 10), Some(last), now()).is_none());
    }
}
