use async_trait::async_trait;
use reclaim_core::{RemediationResult, ScanOutput, Technique};

use crate::base::OptimizerBase;
use crate::error::OptimizerError;

/// Strongly-typed optimizer trait with native `async fn`.
///
/// An optimizer owns one cleanup technique: it discovers idle resources of a
/// single kind (`analyze`) and remediates them by id (`optimize`).
///
/// This trait is **not** object-safe because it uses native `async fn` methods.
/// Use [`DynOptimizer`] for dynamic dispatch; every `Optimizer` implements it
/// through a blanket implementation.
pub trait Optimizer: Send + Sync {
    /// The technique this optimizer implements.
    fn technique(&self) -> Technique;

    /// Shared state: credentials, region, dry-run flag, findings buffer.
    fn base(&self) -> &OptimizerBase;

    fn base_mut(&mut self) -> &mut OptimizerBase;

    /// Scan the account for idle resources.
    ///
    /// Repeated calls on the same instance never accumulate findings from
    /// earlier calls.
    fn analyze(
        &mut self,
    ) -> impl std::future::Future<Output = Result<ScanOutput, OptimizerError>> + Send;

    /// Remediate the given resources, one result per id, in input order.
    ///
    /// Per-resource failures are reported inside the returned list. Only
    /// call-level failures (e.g. the provider client cannot be built) are
    /// returned as `Err`.
    fn optimize(
        &self,
        resource_ids: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<RemediationResult>, OptimizerError>> + Send;

    fn dry_run(&self) -> bool {
        self.base().dry_run()
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.base_mut().set_dry_run(dry_run);
    }
}

/// Object-safe optimizer trait for use behind `Box<dyn DynOptimizer>`.
///
/// Implement [`Optimizer`] and rely on the blanket implementation rather than
/// implementing this trait directly.
#[async_trait]
pub trait DynOptimizer: Send + Sync {
    fn technique(&self) -> Technique;

    fn dry_run(&self) -> bool;

    fn set_dry_run(&mut self, dry_run: bool);

    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError>;

    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError>;
}

#[async_trait]
impl<T: Optimizer> DynOptimizer for T {
    fn technique(&self) -> Technique {
        Optimizer::technique(self)
    }

    fn dry_run(&self) -> bool {
        Optimizer::dry_run(self)
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        Optimizer::set_dry_run(self, dry_run);
    }

    async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
        Optimizer::analyze(self).await
    }

    async fn optimize(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<RemediationResult>, OptimizerError> {
        Optimizer::optimize(self, resource_ids).await
    }
}
