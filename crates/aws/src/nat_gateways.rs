use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{NatGateway, NatGatewayState};
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::into_optimizer_error;
use crate::outcome::{ActionLabel, remediation_outcome};
use crate::pricing;
use crate::time::iso_or_empty;

const DELETE_NAT_GATEWAY: ActionLabel =
    ActionLabel::new("Deleted NAT Gateway", "delete NAT Gateway");

/// Available NAT gateways, which bill hourly whether or not traffic flows.
#[derive(Debug)]
pub struct NatGatewayOptimizer {
    base: OptimizerBase,
}

impl NatGatewayOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

pub fn monthly_cost() -> f64 {
    pricing::hourly_to_monthly(pricing::NAT_GATEWAY_HOURLY) + pricing::NAT_GATEWAY_DATA_MONTHLY
}

pub fn billable_gateway(nat: &NatGateway) -> Option<Candidate> {
    let nat_id = nat.nat_gateway_id()?;
    if nat.state() != Some(&NatGatewayState::Available) {
        return None;
    }
    let public_ip = nat
        .nat_gateway_addresses()
        .first()
        .and_then(|a| a.public_ip())
        .unwrap_or_default();
    Some(Candidate::new(
        nat_id,
        json!({
            "nat_gateway_id": nat_id,
            "state": "available",
            "subnet_id": nat.subnet_id().unwrap_or_default(),
            "vpc_id": nat.vpc_id().unwrap_or_default(),
            "public_ip": public_ip,
            "create_time": iso_or_empty(nat.create_time()),
        }),
        monthly_cost(),
    ))
}

async fn delete_nat_gateway(client: Client, dry_run: bool, nat_id: String) -> RemediationResult {
    let outcome = client
        .delete_nat_gateway()
        .nat_gateway_id(&nat_id)
        .dry_run(dry_run)
        .send()
        .await;
    remediation_outcome(nat_id, DELETE_NAT_GATEWAY, dry_run, outcome)
}

impl Optimizer for NatGatewayOptimizer {
    fn technique(&self) -> Technique {
        Technique::NatGateways
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "nat-gateways", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let gateways = client
            .describe_nat_gateways()
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| into_optimizer_error(&e))?;

        let candidates: Vec<_> = gateways.iter().filter_map(billable_gateway).collect();
        info!(
            scanned = gateways.len(),
            idle = candidates.len(),
            "NAT gateway scan complete"
        );
        record(&mut self.base, Technique::NatGateways, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "nat-gateways", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |id| {
            delete_nat_gateway(client.clone(), dry_run, id)
        })
        .await)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_ec2::types::NatGatewayAddress;

    use super::*;

    #[test]
    fn available_gateway_is_flagged() {
        let nat = NatGateway::builder()
            .nat_gateway_id("nat-1")
            .state(NatGatewayState::Available)
            .subnet_id("subnet-1")
            .vpc_id("vpc-1")
            .nat_gateway_addresses(NatGatewayAddress::builder().public_ip("3.3.3.3").build())
            .build();
        let c = billable_gateway(&nat).unwrap();
        assert_eq!(c.resource_id, "nat-1");
        assert_eq!(c.details["public_ip"], "3.3.3.3");
        assert!((c.monthly_cost - 42.4).abs() < 1e-9);
    }

    #[test]
    fn deleted_gateway_is_ignored() {
        let nat = NatGateway::builder()
            .nat_gateway_id("nat-2")
            .state(NatGatewayState::Deleted)
            .build();
        assert!(billable_gateway(&nat).is_none());
    }

    #[test]
    fn gateway_without_addresses_has_empty_ip() {
        let nat = NatGateway::builder()
            .nat_gateway_id("nat-3")
            .state(NatGatewayState::Available)
            .build();
        assert_eq!(billable_gateway(&nat).unwrap().details["public_ip"], "");
    }
}
