use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::Address;
use reclaim_core::{RemediationResult, ScanOutput, Technique};
use reclaim_optimizer::{Optimizer, OptimizerBase, OptimizerError, remediate_in_order};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::build_sdk_config;
use crate::candidate::{Candidate, record};
use crate::error::{into_optimizer_error, sdk_error_message};
use crate::outcome::{ActionLabel, not_found, remediation_outcome};
use crate::pricing;

const RELEASE_ADDRESS: ActionLabel =
    ActionLabel::new("Released Elastic IP", "release Elastic IP");

/// Elastic IPs that are not associated with an instance or interface.
///
/// Findings are keyed by public IP; remediation looks the allocation up again
/// before releasing it.
#[derive(Debug)]
pub struct ElasticIpOptimizer {
    base: OptimizerBase,
}

impl ElasticIpOptimizer {
    pub fn new(base: OptimizerBase) -> Self {
        Self { base }
    }
}

pub fn is_associated(address: &Address) -> bool {
    address.instance_id().is_some_and(|id| !id.is_empty())
        || address.association_id().is_some_and(|id| !id.is_empty())
}

pub fn unattached_address(address: &Address) -> Option<Candidate> {
    let public_ip = address.public_ip()?;
    if is_associated(address) {
        return None;
    }
    Some(Candidate::new(
        public_ip,
        json!({
            "public_ip": public_ip,
            "allocation_id": address.allocation_id().unwrap_or_default(),
            "domain": address.domain().map(|d| d.as_str()).unwrap_or_default(),
            "associated": false,
            "network_border_group": address.network_border_group().unwrap_or_default(),
        }),
        pricing::hourly_to_monthly(pricing::ELASTIC_IP_HOURLY),
    ))
}

async fn release_address(client: Client, dry_run: bool, public_ip: String) -> RemediationResult {
    let lookup = client.describe_addresses().public_ips(&public_ip).send().await;
    let address = match lookup {
        Ok(output) => output.addresses().first().cloned(),
        Err(err) => return RemediationResult::failed(public_ip, sdk_error_message(&err)),
    };
    let Some(address) = address else {
        return not_found(public_ip, "Elastic IP");
    };

    let request = client.release_address().dry_run(dry_run);
    let request = match address.allocation_id() {
        Some(allocation_id) => request.allocation_id(allocation_id),
        None => request.public_ip(&public_ip),
    };
    let outcome = request.send().await;
    remediation_outcome(public_ip, RELEASE_ADDRESS, dry_run, outcome)
}

impl Optimizer for ElasticIpOptimizer {
    fn technique(&self) -> Technique {
        Technique::ElasticIp
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    #[instrument(skip(self), fields(technique = "elastic-ip", region = %self.base.region()))]
    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let output = client
            .describe_addresses()
            .send()
            .await
            .map_err(|e| into_optimizer_error(&e))?;

        let candidates: Vec<_> = output
            .addresses()
            .iter()
            .filter_map(unattached_address)
            .collect();
        info!(
            scanned = output.addresses().len(),
            idle = candidates.len(),
            "Elastic IP scan complete"
        );
        record(&mut self.base, Technique::ElasticIp, candidates);
        Ok(self.base.take_output())
    }

    #[instrument(skip_all, fields(technique = "elastic-ip", count = resource_ids.len(), dry_run = self.base.dry_run()))]
    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        let client = Client::new(&build_sdk_config(&self.base).await);
        let dry_run = self.base.dry_run();
        Ok(remediate_in_order(resource_ids, self.base.concurrency(), |ip| {
            release_address(client.clone(), dry_run, ip)
        })
        .await)
    }
}
