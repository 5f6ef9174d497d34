use pkg_constants::k8s::{PRIORITY_HIGH, PRIORITY_LOW, SELECTOR_POD_NAME, SELECTOR_POD_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- Priority ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Low,
}

impl Priority {
    /// Parse the value of the `ultron.io/priority` annotation.
    /// Accepts both `PriorityHigh` and the short `High` form, case-insensitively.
    pub fn from_annotation(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(PRIORITY_HIGH) || value.eq_ignore_ascii_case("high") {
            Some(Priority::High)
        } else if value.eq_ignore_ascii_case(PRIORITY_LOW) || value.eq_ignore_ascii_case("low") {
            Some(Priority::Low)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

// --- Weighted pod ---

/// Scheduling-relevant projection of a pod. CPU in cores, memory and storage in GiB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedPod {
    pub requested_cpu: f64,
    pub requested_memory: f64,
    pub requested_storage: f64,
    pub requested_disk_type: String,
    pub requested_network_type: String,
    pub limit_cpu: f64,
    pub limit_memory: f64,
    pub priority: Priority,
    /// Identity of the pod (name and namespace).
    pub selector: HashMap<String, String>,
}

impl WeightedPod {
    pub fn name(&self) -> Option<&str> {
        self.selector.get(SELECTOR_POD_NAME).map(String::as_str)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.selector.get(SELECTOR_POD_NAMESPACE).map(String::as_str)
    }
}
