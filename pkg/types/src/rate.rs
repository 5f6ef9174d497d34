use pkg_constants::algorithm::RATE_UNKNOWN;
use pkg_constants::k8s::LABEL_INSTANCE_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scalar in `[0, 1]` attached to the instance type named by its selector.
/// A value of [`RATE_UNKNOWN`] means no measurement exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedRate {
    #[serde(default)]
    pub selector: HashMap<String, String>,
    pub value: f64,
}

/// Historical probability that an instance of a type is reclaimed.
pub type WeightedInteruptionRate = WeightedRate;

/// Normalized latency penalty of an instance type (0 best, 1 worst).
pub type WeightedLatencyRate = WeightedRate;

impl WeightedRate {
    pub fn unknown() -> Self {
        Self {
            selector: HashMap::new(),
            value: RATE_UNKNOWN,
        }
    }

    pub fn for_instance_type(instance_type: &str, value: f64) -> Self {
        Self {
            selector: HashMap::from([(LABEL_INSTANCE_TYPE.to_string(), instance_type.to_string())]),
            value,
        }
    }

    pub fn instance_type(&self) -> Option<&str> {
        self.selector.get(LABEL_INSTANCE_TYPE).map(String::as_str)
    }

    /// Negative values are the "unknown" sentinel.
    pub fn is_known(&self) -> bool {
        self.value >= 0.0
    }

    /// The measured value, or `0` when unknown.
    pub fn value_or_zero(&self) -> f64 {
        if self.is_known() { self.value } else { 0.0 }
    }
}

impl Default for WeightedRate {
    fn default() -> Self {
        Self::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_is_unknown() {
        let rate = WeightedRate::default();
        assert!(!rate.is_known());
        assert_eq!(rate.value, RATE_UNKNOWN);
        assert_eq!(rate.value_or_zero(), 0.0);
    }

    #[test]
    fn rate_for_instance_type() {
        let rate = WeightedRate::for_instance_type("ultron.durable", 0.3);
        assert_eq!(rate.instance_type(), Some("ultron.durable"));
        assert!(rate.is_known());
        assert_eq!(rate.value_or_zero(), 0.3);
    }
}
