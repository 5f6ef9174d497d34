//! Multi-criterion scoring of a (node, pod) pair.
//!
//! Every criterion is a pure function; [`total_score`] combines them with the
//! fixed weights from `pkg_constants::algorithm`. Higher totals are better.

use pkg_constants::algorithm::{ALPHA, BETA, DELTA, EPSILON, GAMMA, ZETA};
use pkg_types::node::WeightedNode;
use pkg_types::pod::{Priority, WeightedPod};
use serde::Serialize;

/// Headroom left on the node after placing the pod, as a fraction of total
/// CPU plus a fraction of total memory. A zero total contributes nothing.
pub fn resource_score(node: &WeightedNode, pod: &WeightedPod) -> f64 {
    let cpu = if node.total_cpu > 0.0 {
        (node.available_cpu - pod.requested_cpu) / node.total_cpu
    } else {
        0.0
    };
    let memory = if node.total_memory > 0.0 {
        (node.available_memory - pod.requested_memory) / node.total_memory
    } else {
        0.0
    };
    cpu + memory
}

/// `1` when the node's disk class is the one the pod asked for.
pub fn storage_score(node: &WeightedNode, pod: &WeightedPod) -> f64 {
    if node.disk_type == pod.requested_disk_type {
        1.0
    } else {
        0.0
    }
}

/// `1 - latency` when the network class matches. Unknown latency does not discount.
pub fn network_score(node: &WeightedNode, pod: &WeightedPod) -> f64 {
    if node.network_type != pod.requested_network_type {
        return 0.0;
    }
    (1.0 - node.latency_rate.value_or_zero()).clamp(0.0, 1.0)
}

/// Rewards nodes priced below the market mean of comparable catalog entries.
pub fn price_score(node: &WeightedNode) -> f64 {
    if node.price > 0.0 {
        1.0 - node.median_price / node.price
    } else {
        0.0
    }
}

/// Instability penalty: interruption rate scaled by how expensive the node is
/// relative to the market. Subtracted from the total.
pub fn node_score(node: &WeightedNode) -> f64 {
    if node.price > 0.0 && node.median_price > 0.0 {
        node.interruption_rate.value_or_zero() * (node.price / node.median_price)
    } else {
        0.0
    }
}

pub fn pod_score(pod: &WeightedPod) -> f64 {
    match pod.priority {
        Priority::High => 1.0,
        Priority::Low => 0.0,
    }
}

/// Per-criterion scores of one (node, pod) pair, unweighted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub resource: f64,
    pub storage: f64,
    pub network: f64,
    pub price: f64,
    pub node: f64,
    pub pod: f64,
}

impl ScoreBreakdown {
    pub fn of(node: &WeightedNode, pod: &WeightedPod) -> Self {
        Self {
            resource: resource_score(node, pod),
            storage: storage_score(node, pod),
            network: network_score(node, pod),
            price: price_score(node),
            node: node_score(node),
            pod: pod_score(pod),
        }
    }

    pub fn total(&self) -> f64 {
        ALPHA * self.resource + BETA * self.storage + GAMMA * self.network + DELTA * self.price
            - EPSILON * self.node
            + ZETA * self.pod
    }
}

/// `α·Resource + β·Storage + γ·Network + δ·Price − ε·Node + ζ·Pod`.
pub fn total_score(node: &WeightedNode, pod: &WeightedPod) -> f64 {
    ScoreBreakdown::of(node, pod).total()
}
