use aws_sdk_elasticloadbalancingv2::Client;
use aws_sdk_elasticloadbalancingv2::types::LoadBalancer;
use futures::StreamExt;
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::{into_optimizer_error, sdk_error_message};
use crate::outcome::{ActionLabel, not_found, remediation_outcome};
use crate::pricing;
use crate::time::iso_or_empty;

const DELETE_LOAD_BALANCER: ActionLabel =
    ActionLabel::new("Deleted load balancer", "delete load balancer");

/// Load balancers with no registered targets in any of their target groups.
///
/// Findings are keyed by load balancer name.
#[derive(Debug)]
pub struct LoadBalancerOptimizer {
    base: OptimizerBase,
}

impl LoadBalancerOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

/// Target registration summary for one load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetUsage {
    pub target_groups: usize,
    pub registered_targets: usize,
}

pub fn monthly_cost(lb_type: &str) -> f64 {
    if lb_type == "network" {
        pricing::NETWORK_LB_MONTHLY
    } else {
        pricing::APPLICATION_LB_MONTHLY
    }
}

pub fn idle_load_balancer(lb: &LoadBalancer, usage: TargetUsage) -> Option<Candidate> {
    let name = lb.load_balancer_name()?;
    if usage.registered_targets > 0 {
        return None;
    }
    let lb_type = lb.r#type().map(|t| t.as_str()).unwrap_or_default();
    Some(Candidate::new(
        name,
        json!({
            "name": name,
            "type": lb_type,
            "arn": lb.load_balancer_arn().unwrap_or_default(),
            "scheme": lb.scheme().map(|s| s.as_str()).unwrap_or_default(),
            "vpc_id": lb.vpc_id().unwrap_or_default(),
            "created_time": iso_or_empty(lb.created_time()),
            "target_groups": usage.target_groups,
        }),
        monthly_cost(lb_type),
    ))
}

/// Count registered targets across the load balancer's target groups,
/// stopping at the first group that has any.
async fn target_usage(client: &Client, lb_arn: &str) -> Result<TargetUsage, String> {
    let groups = client
        .describe_target_groups()
        .load_balancer_arn(lb_arn)
        .send()
        .await
        .map_err(|e| sdk_error_message(&e))?;

    let mut usage = TargetUsage {
        target_groups: groups.target_groups().len(),
        registered_targets: 0,
    };
    for group in groups.target_groups() {
        let Some(group_arn) = group.target_group_arn() else {
            continue;
        };
        let health = client
            .describe_target_health()
            .target_group_arn(group_arn)
            .send()
            .await
            .map_err(|e| sdk_error_message(&e))?;
        usage.registered_targets += health.target_health_descriptions().len();
        if usage.registered_targets > 0 {
            break;
        }
    }
    Ok(usage)
}

async fn load_balancer_usage(client: &Client, lb: &LoadBalancer) -> Result<TargetUsage, String> {
    match lb.load_balancer_arn() {
        Some(arn) => target_usage(client, arn).await,
        None => Err("load balancer has no ARN".to_owned()),
    }
}

async fn delete_load_balancer(client: Client, dry_run: bool, name: String) -> RemediationResult {
    let lookup = client.describe_load_balancers().names(&name).send().await;
    let arn = match lookup {
        Ok(output) => output
            .load_balancers()
            .first()
            .and_then(|lb| lb.load_balancer_arn())
            .map(str::to_owned),
        Err(err) => return RemediationResult::failed(name, sdk_error_message(&err)),
    };
    let Some(arn) = arn else {
        return not_found(name, "Load balancer");
    };
    if dry_run {
        return DELETE_LOAD_BALANCER.validated(name);
    }
    let outcome = client.delete_load_balancer().load_balancer_arn(arn).send().await;
    remediation_outcome(name, DELETE_LOAD_BALANCER, false, outcome)
}

impl Optimizer for LoadBalancerOptimizer {
    fn technique(&self) -> Technique {
        Technique::LoadBalancers
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "load-balancers", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let pages = client
            .describe_load_balancers()
            .into_paginator()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;
        let load_balancers: Vec<LoadBalancer> = pages
            .into_iter()
            .flat_map(|page| page.load_balancers.unwrap_or_default())
            .collect();

        let checks: Vec<_> = load_balancers
            .iter()
            .map(|lb| load_balancer_usage(&client, lb))
            .collect();
        let usages: Vec<Result<TargetUsage, String>> = futures::stream::iter(checks)
            .buffered(self.base.concurrency())
            .collect()
            .await;

        let mut candidates = Vec::new();
        for (lb, usage) in load_balancers.iter().zip(usages) {
            let name = lb.load_balancer_name().unwrap_or_default();
            match usage {
                Ok(usage) => {
                    debug!(name, ?usage, "target usage");
                    candidates.extend(idle_load_balancer(lb, usage));
                }
                Err(reason) => self.base.skip(name, reason),
            }
        }
        info!(
            scanned = load_balancers.len(),
            idle = candidates.len(),
            "load balancer scan complete"
        );
        record(&mut self.base, Technique::LoadBalancers, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "load-balancers", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |name| {
            delete_load_balancer(client.clone(), dry_run, name)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_elasticloadbalancingv2::types::{LoadBalancerSchemeEnum, LoadBalancerTypeEnum};

    use super::*;

    fn lb(name: &str, lb_type: LoadBalancerTypeEnum) -> LoadBalancer {
        LoadBalancer::builder()
            .load_balancer_name(name)
            .load_balancer_arn(format!("arn:aws:elasticloadbalancing:us-east-1:1:loadbalancer/{name}"))
            .r#type(lb_type)
            .scheme(LoadBalancerSchemeEnum::InternetFacing)
            .vpc_id("vpc-1")
            .build()
    }

    #[test]
    fn network_lb_costs_more() {
        assert!((monthly_cost("network") - 32.40).abs() < 1e-9);
        assert!((monthly_cost("application") - 22.86).abs() < 1e-9);
        assert!((monthly_cost("gateway") - 22.86).abs() < 1e-9);
    }

    #[test]
    fn lb_without_targets_is_flagged() {
        let usage = TargetUsage {
            target_groups: 2,
            registered_targets: 0,
        };
        let c = idle_load_balancer(&lb("api", LoadBalancerTypeEnum::Network), usage).unwrap();
        assert_eq!(c.resource_id, "api");
        assert_eq!(c.details["type"], "network");
        assert_eq!(c.details["scheme"], "internet-facing");
        assert_eq!(c.details["target_groups"], 2);
        assert!((c.monthly_cost - 32.40).abs() < 1e-9);
    }

    #[test]
    fn lb_with_targets_is_kept() {
        let usage = TargetUsage {
            target_groups: 1,
            registered_targets: 3,
        };
        assert!(idle_load_balancer(&lb("web", LoadBalancerTypeEnum::Application), usage).is_none());
    }
}
