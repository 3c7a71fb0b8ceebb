use std::collections::BTreeMap;
use std::sync::LazyLock;

use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Filter, Instance, Reservation};
use chrono::{DateTime, Utc};
use regex::Regex;
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::into_optimizer_error;
use crate::outcome::{ActionLabel, remediation_outcome};
use crate::pricing;
use crate::time::{days_since, iso_or_empty, parse_gmt};

/// Instances stopped for this many days or fewer are left alone.
pub const MIN_STOPPED_DAYS: i64 = 7;

const TERMINATE_INSTANCE: ActionLabel =
    ActionLabel::new("Terminated instance", "terminate instance");

/// EC2 embeds the stop time in the transition reason, e.g.
/// `User initiated (2024-02-10 08:15:00 GMT)`.
static STOP_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) GMT\)")
        .expect("stop time regex is valid")
});

/// Instances that have been stopped for more than a week.
#[derive(Debug)]
pub struct Ec2InstanceOptimizer {
    base: OptimizerBase,
}

impl Ec2InstanceOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

/// Extract the stop time from an instance's state transition reason.
pub fn stopped_at(state_transition_reason: &str) -> Option<DateTime<Utc>> {
    let captures = STOP_TIME_RE.captures(state_transition_reason)?;
    parse_gmt(captures.get(1)?.as_str())
}

/// Outcome of evaluating one stopped instance.
#[derive(Debug, PartialEq)]
pub enum StoppedInstance {
    Idle(Candidate),
    Recent,
    /// The stop time could not be determined; carries the reason text.
    Unknown(String),
}

pub fn evaluate_stopped(instance: &Instance, now: DateTime<Utc>) -> Option<StoppedInstance> {
    let instance_id = instance.instance_id()?;
    let reason = instance.state_transition_reason().unwrap_or_default();
    let Some(stopped) = stopped_at(reason) else {
        return Some(StoppedInstance::Unknown(format!(
            "stop time not reported for {instance_id} (reason: {reason:?})"
        )));
    };
    let days_stopped = days_since(stopped, now);
    if days_stopped <= MIN_STOPPED_DAYS {
        return Some(StoppedInstance::Recent);
    }

    let tags: BTreeMap<&str, &str> = instance
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?, t.value().unwrap_or_default())))
        .collect();

    Some(StoppedInstance::Idle(Candidate::new(
        instance_id,
        json!({
            "instance_type": instance.instance_type().map_or("Unknown", |t| t.as_str()),
            "state": instance
                .state()
                .and_then(|s| s.name())
                .map(|n| n.as_str())
                .unwrap_or_default(),
            "stopped_time": stopped.to_rfc3339(),
            "days_stopped": days_stopped,
            "tags": tags,
            "launch_time": iso_or_empty(instance.launch_time()),
        }),
        pricing::hourly_to_monthly(pricing::STOPPED_INSTANCE_HOURLY),
    )))
}

async fn terminate_instance(client: Client, dry_run: bool, instance_id: String) -> RemediationResult {
    let outcome = client
        .terminate_instances()
        .instance_ids(&instance_id)
        .dry_run(dry_run)
        .send()
        .await;
    remediation_outcome(instance_id, TERMINATE_INSTANCE, dry_run, outcome)
}

impl Optimizer for Ec2InstanceOptimizer {
    fn technique(&self) -> Technique {
        Technique::Ec2Instances
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "ec2-instances", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let reservations: Vec<Reservation> = client
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("instance-state-name")
                    .values("stopped")
                    .build(),
            )
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;

        let now = Utc::now();
        let mut candidates = Vec::new();
        for instance in reservations.iter().flat_map(Reservation::instances) {
            match evaluate_stopped(instance, now) {
                Some(StoppedInstance::Idle(candidate)) => candidates.push(candidate),
                Some(StoppedInstance::Unknown(reason)) => {
                    let id = instance.instance_id().unwrap_or_default();
                    self.base.skip(id, reason);
                }
                Some(StoppedInstance::Recent) | None => {}
            }
        }
        info!(idle = candidates.len(), "stopped instance scan complete");
        record(&mut self.base, Technique::Ec2Instances, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "ec2-instances", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            terminate_instance(client.clone(), dry_run, id)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_ec2::types::{InstanceState, InstanceStateName, InstanceType, Tag};
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn stopped_instance(id: &str, reason: &str) -> Instance {
        Instance::builder()
            .instance_id(id)
            .instance_type(InstanceType::T2Micro)
            .state(
                InstanceState::builder()
                    .name(InstanceStateName::Stopped)
                    .build(),
            )
            .state_transition_reason(reason)
            .tags(Tag::builder().key("Name").value("web").build())
            .build()
    }

    #[test]
    fn parses_user_initiated_stop() {
        let at = stopped_at("User initiated (2024-02-10 08:15:00 GMT)").unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 2, 10, 8, 15, 0).unwrap());
        assert!(stopped_at("").is_none());
        assert!(stopped_at("Server.SpotInstanceTermination").is_none());
    }

    #[test]
    fn long_stopped_instance_is_flagged() {
        let instance = stopped_instance("i-1", "User initiated (2024-02-01 00:00:00 GMT)");
        let Some(StoppedInstance::Idle(c)) = evaluate_stopped(&instance, now()) else {
            panic!("expected idle instance");
        };
        assert_eq!(c.resource_id, "i-1");
        assert_eq!(c.details["days_stopped"], 29);
        assert_eq!(c.details["instance_type"], "t2.micro");
        assert_eq!(c.details["state"], "stopped");
        assert_eq!(c.details["tags"]["Name"], "web");
        assert!((c.monthly_cost - 36.0).abs() < 1e-9);
    }

    #[test]
    fn recently_stopped_instance_is_kept() {
        let instance = stopped_instance("i-2", "User initiated (2024-02-25 00:00:00 GMT)");
        assert_eq!(
            evaluate_stopped(&instance, now()),
            Some(StoppedInstance::Recent)
        );
    }

    #[test]
    fn unknown_stop_time_is_reported() {
        let instance = stopped_instance("i-3", "");
        assert!(matches!(
            evaluate_stopped(&instance, now()),
            Some(StoppedInstance::Unknown(_))
        ));
    }
}
