use std::collections::HashMap;
use std::sync::Arc;

use reclaim_core::Technique;
use thiserror::Error;

use crate::base::OptimizerBase;
use crate::optimizer::DynOptimizer;

/// Builds a fresh optimizer for one request.
pub type OptimizerConstructor =
    Arc<dyn Fn(OptimizerBase) -> Box<dyn DynOptimizer> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown technique: {0}")]
    UnknownTechnique(String),
}

/// Maps technique ids to optimizer constructors.
///
/// The registry is populated once at startup and read concurrently after
/// that. Each lookup constructs a new optimizer, so no scan state is shared
/// between requests.
#[derive(Default, Clone)]
pub struct OptimizerRegistry {
    constructors: HashMap<Technique, OptimizerConstructor>,
}

impl OptimizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor, replacing any previous one for the technique.
    pub fn register<F>(&mut self, technique: Technique, constructor: F)
    where
        F: Fn(OptimizerBase) -> Box<dyn DynOptimizer> + Send + Sync + 'static,
    {
        self.constructors.insert(technique, Arc::new(constructor));
    }

    /// Resolve a technique id to its constructor.
    pub fn resolve(&self, id: &str) -> Result<Technique, RegistryError> {
        let technique: Technique = id
            .parse()
            .map_err(|_| RegistryError::UnknownTechnique(id.to_owned()))?;
        if self.constructors.contains_key(&technique) {
            Ok(technique)
        } else {
            Err(RegistryError::UnknownTechnique(id.to_owned()))
        }
    }

    /// Construct an optimizer for a registered technique.
    pub fn build(
        &self,
        technique: Technique,
        base: OptimizerBase,
    ) -> Result<Box<dyn DynOptimizer>, RegistryError> {
        let constructor = self
            .constructors
            .get(&technique)
            .ok_or_else(|| RegistryError::UnknownTechnique(technique.to_string()))?;
        Ok(constructor(base))
    }

    pub fn contains(&self, technique: Technique) -> bool {
        self.constructors.contains_key(&technique)
    }

    /// Registered techniques in catalog order.
    pub fn techniques(&self) -> Vec<Technique> {
        Technique::ALL
            .into_iter()
            .filter(|t| self.constructors.contains_key(t))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl std::fmt::Debug for OptimizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizerRegistry")
            .field("techniques", &self.techniques())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use reclaim_core::{ProviderCredentials, RemediationResult, ScanOutput};

    use super::*;
    use crate::error::OptimizerError;
    use crate::optimizer::Optimizer;

    struct Noop {
        base: OptimizerBase,
        technique: Technique,
    }

    impl Optimizer for Noop {
        fn technique(&self) -> Technique {
            self.technique
        }

        fn base(&self) -> &OptimizerBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut OptimizerBase {
            &mut self.base
        }

        async fn analyze(&mut self) -> Result<ScanOutput, OptimizerError> {
            Ok(self.base.take_output())
        }

        async fn optimize(
            &self,
            resource_ids: &[String],
        ) -> Result<Vec<RemediationResult>, OptimizerError> {
            Ok(resource_ids
                .iter()
                .map(|id| RemediationResult::success(id.clone(), "noop"))
                .collect())
        }
    }

    fn base() -> OptimizerBase {
        OptimizerBase::new(ProviderCredentials::new("AKIA", "s", "us-east-1"), "us-east-1")
    }

    fn registry() -> OptimizerRegistry {
        let mut reg = OptimizerRegistry::new();
        reg.register(Technique::Ebs, |base| {
            Box::new(Noop {
                base,
                technique: Technique::Ebs,
            })
        });
        reg.register(Technique::NatGateways, |base| {
            Box::new(Noop {
                base,
                technique: Technique::NatGateways,
            })
        });
        reg
    }

    #[test]
    fn resolve_known_technique() {
        let reg = registry();
        assert_eq!(reg.resolve("ebs").unwrap(), Technique::Ebs);
        assert_eq!(reg.resolve("nat-gateways").unwrap(), Technique::NatGateways);
    }

    #[test]
    fn resolve_unknown_id() {
        let reg = registry();
        let err = reg.resolve("bogus").unwrap_err();
        assert_eq!(err.to_string(), "Unknown technique: bogus");
    }

    #[test]
    fn resolve_unregistered_technique() {
        let reg = registry();
        let err = reg.resolve("amis").unwrap_err();
        assert_eq!(err, RegistryError::UnknownTechnique("amis".into()));
    }

    #[test]
    fn build_constructs_fresh_instances() {
        let reg = registry();
        let mut a = reg.build(Technique::Ebs, base()).unwrap();
        let b = reg.build(Technique::Ebs, base()).unwrap();
        a.set_dry_run(false);
        assert!(!a.dry_run());
        assert!(b.dry_run());
        assert_eq!(a.technique(), Technique::Ebs);
    }

    #[test]
    fn techniques_in_catalog_order() {
        let reg = registry();
        assert_eq!(reg.techniques(), vec![Technique::Ebs, Technique::NatGateways]);
        assert_eq!(reg.len(), 2);
        assert!(reg.contains(Technique::Ebs));
        assert!(!reg.contains(Technique::Amis));
        assert!(!OptimizerRegistry::new().contains(Technique::Ebs));
    }
}
