//! AWS optimizers for Reclaim.
//!
//! One optimizer per technique, each scanning a single resource kind with
//! read-only SDK calls and remediating by id:
//!
//! - **EC2**: EBS volumes, snapshots, stopped instances, Elastic IPs, AMIs,
//!   security groups, NAT gateways, VPC endpoints
//! - **ELBv2**: load balancers without targets
//! - **RDS**: old manual snapshots
//! - **EFS**: file systems without mount targets
//! - **CloudWatch Logs**: inactive log groups
//! - **S3**: empty buckets
//! - **Elastic Beanstalk**: terminated environments
//! - **ECS**: inactive task definitions
//!
//! Clients are built per call from the stored static credentials; see
//! [`auth::build_sdk_config`]. [`aws_registry`] wires every optimizer into an
//! [`OptimizerRegistry`](reclaim_optimizer::OptimizerRegistry).

pub mod auth;
pub mod candidate;
pub mod error;
pub mod identity;
pub mod outcome;
pub mod pricing;
pub mod registry;
pub mod time;

pub mod amis;
pub mod cloudwatch_logs;
pub mod ebs;
pub mod ec2_instances;
pub mod ec2_snapshots;
pub mod ecs_task_definitions;
pub mod efs;
pub mod elastic_beanstalk;
pub mod elastic_ip;
pub mod load_balancers;
pub mod nat_gateways;
pub mod rds_snapshots;
pub mod s3_buckets;
pub mod security_groups;
pub mod vpc_endpoints;

// Re-exports for convenience.
pub use error::AwsOptimizerError;
pub use identity::StsIdentityVerifier;
pub use registry::aws_registry;

pub use amis::AmiOptimizer;
pub use cloudwatch_logs::CloudWatchLogsOptimizer;
pub use ebs::EbsOptimizer;
pub use ec2_instances::Ec2InstanceOptimizer;
pub use ec2_snapshots::Ec2SnapshotOptimizer;
pub use ecs_task_definitions::EcsTaskDefinitionOptimizer;
pub use efs::EfsOptimizer;
pub use elastic_beanstalk::ElasticBeanstalkOptimizer;
pub use elastic_ip::ElasticIpOptimizer;
pub use load_balancers::LoadBalancerOptimizer;
pub use nat_gateways::NatGatewayOptimizer;
pub use rds_snapshots::RdsSnapshotOptimizer;
pub use s3_buckets::S3BucketOptimizer;
pub use security_groups::SecurityGroupOptimizer;
pub use vpc_endpoints::VpcEndpointOptimizer;
