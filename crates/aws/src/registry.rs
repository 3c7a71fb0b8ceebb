use reclaim_core::Technique;
use reclaim_optimizer::{DynOptimizer, OptimizerBase, OptimizerRegistry};

use crate::amis::AmiOptimizer;
use crate::cloudwatch_logs::CloudWatchLogsOptimizer;
use crate::ebs::EbsOptimizer;
use crate::ec2_instances::Ec2InstanceOptimizer;
use crate::ec2_snapshots::Ec2SnapshotOptimizer;
use crate::ecs_task_definitions::EcsTaskDefinitionOptimizer;
use crate::efs::EfsOptimizer;
use crate::elastic_beanstalk::ElasticBeanstalkOptimizer;
use crate::elastic_ip::ElasticIpOptimizer;
use crate::load_balancers::LoadBalancerOptimizer;
use crate::nat_gateways::NatGatewayOptimizer;
use crate::rds_snapshots::RdsSnapshotOptimizer;
use crate::s3_buckets::S3BucketOptimizer;
use crate::security_groups::SecurityGroupOptimizer;
use crate::vpc_endpoints::VpcEndpointOptimizer;

fn boxed<T>(
    build: fn(OptimizerBase) -> T,
) -> impl Fn(OptimizerBase) -> Box<dyn DynOptimizer> + Send + Sync + 'static
where
    T: DynOptimizer + 'static,
{
    move |base| -> Box<dyn DynOptimizer> { Box::new(build(base)) }
}

/// A registry with an AWS optimizer for every technique.
pub fn aws_registry() -> OptimizerRegistry {
    let mut registry = OptimizerRegistry::new();
    registry.register(Technique::Ebs, boxed(EbsOptimizer::new));
    registry.register(Technique::Ec2Snapshots, boxed(Ec2SnapshotOptimizer::new));
    registry.register(Technique::Ec2Instances, boxed(Ec2InstanceOptimizer::new));
    registry.register(Technique::ElasticIp, boxed(ElasticIpOptimizer::new));
    registry.register(Technique::LoadBalancers, boxed(LoadBalancerOptimizer::new));
    registry.register(Technique::Amis, boxed(AmiOptimizer::new));
    registry.register(Technique::SecurityGroups, boxed(SecurityGroupOptimizer::new));
    registry.register(Technique::NatGateways, boxed(NatGatewayOptimizer::new));
    registry.register(Technique::RdsSnapshots, boxed(RdsSnapshotOptimizer::new));
    registry.register(Technique::Efs, boxed(EfsOptimizer::new));
    registry.register(Technique::CloudwatchLogs, boxed(CloudWatchLogsOptimizer::new));
    registry.register(Technique::S3Buckets, boxed(S3BucketOptimizer::new));
    registry.register(Technique::ElasticBeanstalk, boxed(ElasticBeanstalkOptimizer::new));
    registry.register(Technique::VpcEndpoints, boxed(VpcEndpointOptimizer::new));
    registry.register(Technique::EcsTaskDefinitions, boxed(EcsTaskDefinitionOptimizer::new));
    registry
}
