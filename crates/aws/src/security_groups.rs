use std::collections::HashSet;

use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Instance, Reservation, SecurityGroup};
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument};

use crate::amis::is_live;
use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::into_optimizer_error;
use crate::outcome::{ActionLabel, remediation_outcome};

const DELETE_GROUP: ActionLabel =
    ActionLabel::new("Deleted security group", "delete security group");

/// Security groups not referenced by any live instance. The VPC `default`
/// group cannot be deleted and is never flagged.
#[derive(Debug)]
pub struct SecurityGroupOptimizer {
    base: OptimizerBase,
}

impl SecurityGroupOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

/// Security group ids attached to non-terminated instances.
pub fn groups_in_use<'a>(instances: impl IntoIterator<Item = &'a Instance>) -> HashSet<String> {
    instances
        .into_iter()
        .filter(|i| is_live(i))
        .flat_map(Instance::security_groups)
        .filter_map(|g| g.group_id())
        .map(str::to_owned)
        .collect()
}

pub fn unused_group(group: &SecurityGroup, in_use: &HashSet<String>) -> Option<Candidate> {
    let group_id = group.group_id()?;
    let name = group.group_name().unwrap_or_default();
    if name == "default" || in_use.contains(group_id) {
        return None;
    }
    Some(Candidate::new(
        group_id,
        json!({
            "name": name,
            "group_id": group_id,
            "description": group.description().unwrap_or_default(),
            "vpc_id": group.vpc_id().unwrap_or_default(),
            "inbound_rules": group.ip_permissions().len(),
            "outbound_rules": group.ip_permissions_egress().len(),
        }),
        0.0,
    ))
}

async fn delete_group(client: Client, dry_run: bool, group_id: String) -> RemediationResult {
    let outcome = client
        .delete_security_group()
        .group_id(&group_id)
        .dry_run(dry_run)
        .send()
        .await;
    remediation_outcome(group_id, DELETE_GROUP, dry_run, outcome)
}

impl Optimizer for SecurityGroupOptimizer {
    fn technique(&self) -> Technique {
        Technique::SecurityGroups
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "security-groups", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let (groups, reservations): (Vec<SecurityGroup>, Vec<Reservation>) = futures::try_join!(
            async {
                client
                    .describe_security_groups()
                    .into_paginator()
                    .items()
                    .send()
                    .try_collect()
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

        let in_use = groups_in_use(reservations.iter().flat_map(Reservation::instances));
        let candidates: Vec<_> = groups
            .iter()
            .filter_map(|g| unused_group(g, &in_use))
            .collect();
        info!(
            scanned = groups.len(),
            in_use = in_use.len(),
            idle = candidates.len(),
            "security group scan complete"
        );
        record(&mut self.base, Technique::SecurityGroups, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "security-groups", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            delete_group(client.clone(), dry_run, id)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_ec2::types::{GroupIdentifier, InstanceState, InstanceStateName, IpPermission};

    use super::*;

    fn group(id: &str, name: &str) -> SecurityGroup {
        SecurityGroup::builder()
            .group_id(id)
            .group_name(name)
            .vpc_id("vpc-1")
            .ip_permissions(IpPermission::builder().ip_protocol("tcp").build())
            .build()
    }

    fn instance_with(group_id: &str, state: InstanceStateName) -> Instance {
        Instance::builder()
            .state(InstanceState::builder().name(state).build())
            .security_groups(GroupIdentifier::builder().group_id(group_id).build())
            .build()
    }

    #[test]
    fn unreferenced_group_is_flagged_at_zero_cost() {
        let c = unused_group(&group("sg-1", "old-web"), &HashSet::new()).unwrap();
        assert_eq!(c.resource_id, "sg-1");
        assert_eq!(c.details["inbound_rules"], 1);
        assert_eq!(c.details["outbound_rules"], 0);
        assert_eq!(c.monthly_cost, 0.0);
    }

    #[test]
    fn default_group_is_never_flagged() {
        assert!(unused_group(&group("sg-d", "default"), &HashSet::new()).is_none());
    }

    #[test]
    fn groups_on_live_instances_are_in_use() {
        let instances = [
            instance_with("sg-live", InstanceStateName::Running),
            instance_with("sg-dead", InstanceStateName::Terminated),
        ];
        let in_use = groups_in_use(&instances);
        assert!(in_use.contains("sg-live"));
        assert!(!in_use.contains("sg-dead"));
        assert!(unused_group(&group("sg-live", "app"), &in_use).is_none());
        assert!(unused_group(&group("sg-dead", "app"), &in_use).is_some());
    }
}
