use reclaim_core::Technique;
use reclaim_optimizer::OptimizerBase;
use serde_json::Value;

/// A resource that matched its technique's waste predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub resource_id: String,
    pub details: Value,
    pub monthly_cost: f64,
}

impl Candidate {
    pub fn new(resource_id: impl Into<String>, details: Value, monthly_cost: f64) -> Self {
        Self {
            resource_id: resource_id.into(),
            details,
            monthly_cost,
        }
    }
}

/// Record candidates as findings of the given technique, in order.
pub fn record(base: &mut OptimizerBase, technique: Technique, candidates: Vec<Candidate>) {
    for candidate in candidates {
        base.add_finding(
            candidate.resource_id,
            technique.resource_type(),
            candidate.details,
            candidate.monthly_cost,
        );
    }
}
