pub mod base;
pub mod batch;
pub mod error;
pub mod findings;
pub mod identity;
pub mod optimizer;
pub mod registry;

pub use base::{DEFAULT_CONCURRENCY, OptimizerBase};
pub use batch::remediate_in_order;
pub use error::OptimizerError;
pub use findings::FindingsBuffer;
pub use identity::IdentityVerifier;
pub use optimizer::{DynOptimizer, Optimizer};
pub use registry::{OptimizerConstructor, OptimizerRegistry, RegistryError};
