use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One flagged, presumably wasteful resource discovered by a scan.
///
/// `details` is opaque passthrough data: its schema depends on the resource
/// kind and is never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Finding {
    /// Provider-specific identifier (ID, name, or ARN).
    pub resource_id: String,
    /// Human-readable category, e.g. `"EBS Volume"`.
    pub resource_type: String,
    /// Why the resource was flagged (age, size, state, tags, ...).
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub details: Map<String, Value>,
    /// Estimated monthly savings in account currency. Never negative.
    pub estimated_savings: f64,
    /// When the finding was emitted.
    pub timestamp: DateTime<Utc>,
}

impl Finding {
    /// Create a finding stamped with the current time.
    ///
    /// Non-object `details` are wrapped under a `"value"` key; negative or
    /// non-finite savings are clamped to zero.
    pub fn new(
        resource_id: impl Into<String>,
        resource_type: impl Into<String>,
        details: Value,
        estimated_savings: f64,
    ) -> Self {
        let details = match details {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_owned(), other);
                map
            }
        };
        let estimated_savings = if estimated_savings.is_finite() {
            estimated_savings.max(0.0)
        } else {
            0.0
        };
        Self {
            resource_id: resource_id.into(),
            resource_type: resource_type.into(),
            details,
            estimated_savings,
            timestamp: Utc::now(),
        }
    }

    /// Compare everything except the emission timestamp.
    pub fn same_resource_state(&self, other: &Self) -> bool {
        self.resource_id == other.resource_id
            && self.resource_type == other.resource_type
            && self.details == other.details
            && (self.estimated_savings - other.estimated_savings).abs() < f64::EPSILON
    }
}

/// A resource the scan saw but could not evaluate.
///
/// Recorded instead of silently dropping the resource when a per-resource
/// detail query fails; the rest of the scan continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SkippedResource {
    /// Identifier of the resource that could not be evaluated.
    pub resource_id: String,
    /// Provider error or reason text.
    pub reason: String,
}

impl SkippedResource {
    pub fn new(resource_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            reason: reason.into(),
        }
    }
}

/// Successful result of one `analyze()` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOutput {
    /// Findings in emission order.
    pub findings: Vec<Finding>,
    /// Resources that could not be evaluated.
    #[serde(default)]
    pub skipped: Vec<SkippedResource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_finding_keeps_object_details() {
        let f = Finding::new(
            "vol-123",
            "EBS Volume",
            serde_json::json!({"size_gb": 8, "state": "available"}),
            0.8,
        );
        assert_eq!(f.details["size_gb"], 8);
        assert_eq!(f.details["state"], "available");
        assert!((f.estimated_savings - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn scalar_details_are_wrapped() {
        let f = Finding::new("x", "Thing", serde_json::json!("note"), 0.0);
        assert_eq!(f.details["value"], "note");

        let f = Finding::new("x", "Thing", Value::Null, 0.0);
        assert!(f.details.is_empty());
    }

    #[test]
    fn savings_are_never_negative() {
        assert_eq!(Finding::new("a", "T", Value::Null, -3.0).estimated_savings, 0.0);
        assert_eq!(Finding::new("a", "T", Value::Null, f64::NAN).estimated_savings, 0.0);
    }

    #[test]
    fn same_resource_state_ignores_timestamp() {
        let a = Finding::new("ami-1", "AMI", serde_json::json!({"days_old": 40}), 1.0);
        let mut b = a.clone();
        b.timestamp = a.timestamp + chrono::Duration::seconds(5);
        assert!(a.same_resource_state(&b));

        b.estimated_savings = 2.0;
        assert!(!a.same_resource_state(&b));
    }

    #[test]
    fn finding_serializes_with_flat_fields() {
        let f = Finding::new("sg-1", "Security Group", serde_json::json!({"name": "web"}), 0.0);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["resource_id"], "sg-1");
        assert_eq!(json["resource_type"], "Security Group");
        assert_eq!(json["details"]["name"], "web");
        assert!(json["timestamp"].is_string());
    }
}
