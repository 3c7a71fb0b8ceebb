//! Flat-rate monthly cost estimates.
//!
//! These are list-price approximations for `us-east-1`. They exist to rank
//! findings, not to reproduce a bill.

pub const HOURS_PER_MONTH: f64 = 24.0 * 30.0;
pub const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub const EBS_GB_MONTH: f64 = 0.10;
pub const EC2_SNAPSHOT_GB_MONTH: f64 = 0.05;
pub const STOPPED_INSTANCE_HOURLY: f64 = 0.05;
pub const ELASTIC_IP_HOURLY: f64 = 0.005;
pub const NETWORK_LB_MONTHLY: f64 = 32.40;
pub const APPLICATION_LB_MONTHLY: f64 = 22.86;
pub const AMI_MONTHLY: f64 = 1.0;
pub const NAT_GATEWAY_HOURLY: f64 = 0.045;
pub const NAT_GATEWAY_DATA_MONTHLY: f64 = 10.0;
pub const RDS_SNAPSHOT_GB_MONTH: f64 = 0.095;
pub const EFS_GB_MONTH: f64 = 0.30;
pub const LOGS_GB_MONTH: f64 = 0.50;
pub const BEANSTALK_ENVIRONMENT_MONTHLY: f64 = 20.0;
pub const VPC_ENDPOINT_HOURLY: f64 = 0.02;

pub fn hourly_to_monthly(hourly: f64) -> f64 {
    hourly * HOURS_PER_MONTH
}

/// Byte count as GiB. Negative counts are treated as zero.
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_gib(bytes: i64) -> f64 {
    bytes.max(0) as f64 / BYTES_PER_GIB
}

/// Monthly storage cost for `size_gb` at `rate` per GB-month.
pub fn per_gb(size_gb: i32, rate: f64) -> f64 {
    f64::from(size_gb.max(0)) * rate
}
