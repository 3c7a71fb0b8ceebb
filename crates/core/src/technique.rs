use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of resource kinds Reclaim knows how to scan and remediate.
///
/// Adding a resource kind means adding a variant here and registering an
/// optimizer for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum Technique {
    Ebs,
    Ec2Snapshots,
    Ec2Instances,
    ElasticIp,
    LoadBalancers,
    Amis,
    SecurityGroups,
    NatGateways,
    RdsSnapshots,
    Efs,
    CloudwatchLogs,
    S3Buckets,
    ElasticBeanstalk,
    VpcEndpoints,
    EcsTaskDefinitions,
}

/// Returned when a technique id is not part of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown technique: {0}")]
pub struct UnknownTechnique(pub String);

impl Technique {
    /// Every technique, in catalog order.
    pub const ALL: [Self; 15] = [
        Self::Ebs,
        Self::Ec2Snapshots,
        Self::Ec2Instances,
        Self::ElasticIp,
        Self::LoadBalancers,
        Self::Amis,
        Self::SecurityGroups,
        Self::NatGateways,
        Self::RdsSnapshots,
        Self::Efs,
        Self::CloudwatchLogs,
        Self::S3Buckets,
        Self::ElasticBeanstalk,
        Self::VpcEndpoints,
        Self::EcsTaskDefinitions,
    ];

    /// The wire identifier, e.g. `"ec2-snapshots"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ebs => "ebs",
            Self::Ec2Snapshots => "ec2-snapshots",
            Self::Ec2Instances => "ec2-instances",
            Self::ElasticIp => "elastic-ip",
            Self::LoadBalancers => "load-balancers",
            Self::Amis => "amis",
            Self::SecurityGroups => "security-groups",
            Self::NatGateways => "nat-gateways",
            Self::RdsSnapshots => "rds-snapshots",
            Self::Efs => "efs",
            Self::CloudwatchLogs => "cloudwatch-logs",
            Self::S3Buckets => "s3-buckets",
            Self::ElasticBeanstalk => "elastic-beanstalk",
            Self::VpcEndpoints => "vpc-endpoints",
            Self::EcsTaskDefinitions => "ecs-task-definitions",
        }
    }

    /// The `resource_type` label used on findings of this kind.
    pub fn resource_type(self) -> &'static str {
        match self {
            Self::Ebs => "EBS Volume",
            Self::Ec2Snapshots => "EC2 Snapshot",
            Self::Ec2Instances => "EC2 Instance",
            Self::ElasticIp => "Elastic IP",
            Self::LoadBalancers => "Load Balancer",
            Self::Amis => "AMI",
            Self::SecurityGroups => "Security Group",
            Self::NatGateways => "NAT Gateway",
            Self::RdsSnapshots => "RDS Snapshot",
            Self::Efs => "EFS",
            Self::CloudwatchLogs => "CloudWatch Log Group",
            Self::S3Buckets => "S3 Bucket",
            Self::ElasticBeanstalk => "Elastic Beanstalk Environment",
            Self::VpcEndpoints => "VPC Endpoint",
            Self::EcsTaskDefinitions => "ECS Task Definition",
        }
    }

    /// Descriptive catalog entry for this technique.
    pub fn info(self) -> TechniqueInfo {
        let (display_name, description, icon) = match self {
            Self::Ebs => (
                "Remove Unused EBS Volumes",
                "Deletes unattached EBS volumes",
                "💾",
            ),
            Self::Ec2Snapshots => (
                "Remove Unused EC2 Snapshots",
                "Cleans up old snapshots not associated with AMIs",
                "📸",
            ),
            Self::Ec2Instances => (
                "Terminate Stopped EC2 Instances",
                "Removes instances that have been stopped for extended periods",
                "🖥️",
            ),
            Self::ElasticIp => (
                "Delete Unattached Elastic IPs",
                "Releases Elastic IPs not associated with resources",
                "🌐",
            ),
            Self::LoadBalancers => (
                "Remove Unused Load Balancers",
                "Deletes load balancers with no active targets",
                "⚖️",
            ),
            Self::Amis => (
                "Delete Old/Unused AMIs",
                "Removes AMI images that are no longer in use",
                "🖼️",
            ),
            Self::SecurityGroups => (
                "Remove Unused Security Groups",
                "Cleans up security groups not attached to any resources",
                "🔐",
            ),
            Self::NatGateways => (
                "Delete Unused NAT Gateways",
                "Removes NAT Gateways not being used",
                "🚪",
            ),
            Self::RdsSnapshots => (
                "Remove Unused RDS Snapshots",
                "Deletes old RDS database snapshots",
                "🗄️",
            ),
            Self::Efs => (
                "Delete Unused Elastic File Systems (EFS)",
                "Removes EFS with no mount targets",
                "📁",
            ),
            Self::CloudwatchLogs => (
                "Remove Unused CloudWatch Log Groups",
                "Cleans up log groups with no recent activity",
                "📋",
            ),
            Self::S3Buckets => (
                "Delete Empty/Unused S3 Buckets",
                "Removes empty S3 buckets",
                "🪣",
            ),
            Self::ElasticBeanstalk => (
                "Terminate Unused Elastic Beanstalk Environments",
                "Cleans up terminated environments",
                "🌱",
            ),
            Self::VpcEndpoints => (
                "Remove Unused VPC Endpoints",
                "Deletes unused VPC endpoints",
                "🔗",
            ),
            Self::EcsTaskDefinitions => (
                "Delete Unused ECS Task Definitions",
                "Removes task definitions not in use",
                "📦",
            ),
        };
        TechniqueInfo {
            id: self.as_str(),
            display_name,
            description,
            icon,
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = UnknownTechnique;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTechnique(s.to_owned()))
    }
}

/// Static, purely descriptive catalog metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TechniqueInfo {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub id: &'static str,
    #[serde(rename = "name")]
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub display_name: &'static str,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub description: &'static str,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub icon: &'static str,
}

/// The full technique catalog in display order.
pub fn catalog() -> Vec<TechniqueInfo> {
    Technique::ALL.into_iter().map(Technique::info).collect()
}
