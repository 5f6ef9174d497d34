use pkg_constants::k8s::{LABEL_HOSTNAME, LABEL_INSTANCE_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::rate::{WeightedInteruptionRate, WeightedLatencyRate};

/// Scheduling-relevant projection of a cluster node, or of a VM class that
/// does not exist yet. CPU in cores, memory and storage in GiB.
///
/// An empty `selector` marks "no node".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedNode {
    pub available_cpu: f64,
    pub total_cpu: f64,
    pub available_memory: f64,
    pub total_memory: f64,
    pub available_storage: f64,
    pub total_storage: f64,
    pub disk_type: String,
    pub network_type: String,
    /// Last known unit price of this node.
    pub price: f64,
    /// Mean price of the catalog entries comparable to this node.
    pub median_price: f64,
    pub instance_type: String,
    pub interruption_rate: WeightedInteruptionRate,
    pub latency_rate: WeightedLatencyRate,
    /// Node selector that pins a pod to this node.
    pub selector: HashMap<String, String>,
}

impl WeightedNode {
    pub fn is_empty(&self) -> bool {
        self.selector.is_empty()
    }

    /// Human-readable identity for logs: hostname, then instance type.
    pub fn display_name(&self) -> &str {
        self.selector
            .get(LABEL_HOSTNAME)
            .or_else(|| self.selector.get(LABEL_INSTANCE_TYPE))
            .map(String::as_str)
            .unwrap_or(self.instance_type.as_str())
    }

    /// Take `cpu` cores and `memory` GiB out of the available capacity, never below zero.
    pub fn reserve(&mut self, cpu: f64, memory: f64) {
        self.available_cpu = (self.available_cpu - cpu).max(0.0);
        self.available_memory = (self.available_memory - memory).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_node_is_empty_with_unknown_rates() {
        let node = WeightedNode::default();
        assert!(node.is_empty());
        assert!(!node.interruption_rate.is_known());
        assert!(!node.latency_rate.is_known());
    }

    #[test]
    fn reserve_clamps_at_zero() {
        let mut node = WeightedNode {
            available_cpu: 2.0,
            available_memory: 4.0,
            ..Default::default()
        };
        node.reserve(0.5, 8.0);
        assert_eq!(node.available_cpu, 1.5);
        assert_eq!(node.available_memory, 0.0);
    }

    #[test]
    fn display_name_prefers_hostname() {
        let node = WeightedNode {
            instance_type: "m5.large".to_string(),
            selector: HashMap::from([
                (LABEL_HOSTNAME.to_string(), "worker-1".to_string()),
                (LABEL_INSTANCE_TYPE.to_string(), "m5.large".to_string()),
            ]),
            ..Default::default()
        };
        assert_eq!(node.display_name(), "worker-1");
    }
}
