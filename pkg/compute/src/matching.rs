//! Pure selection over already-fetched snapshots. Every scan keeps input
//! order and replaces the incumbent only on a strict improvement, so the
//! first-seen candidate wins ties.

use pkg_algorithm::total_score;
use pkg_constants::k8s::LABEL_INSTANCE_TYPE;
use pkg_types::compute::ComputeConfiguration;
use pkg_types::node::WeightedNode;
use pkg_types::pod::WeightedPod;
use pkg_types::rate::WeightedRate;

/// What a catalog entry must cover: CPU cores, memory/storage GiB and classes.
#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
    pub disk_type: String,
    pub network_type: String,
}

impl Demand {
    pub fn of_pod(pod: &WeightedPod) -> Self {
        Self {
            cpu: pod.requested_cpu,
            memory: pod.requested_memory,
            storage: pod.requested_storage,
            disk_type: pod.requested_disk_type.clone(),
            network_type: pod.requested_network_type.clone(),
        }
    }

    /// The node's available capacity, used to find its market price.
    pub fn of_node(node: &WeightedNode) -> Self {
        Self {
            cpu: node.available_cpu,
            memory: node.available_memory,
            storage: node.available_storage,
            disk_type: node.disk_type.clone(),
            network_type: node.network_type.clone(),
        }
    }

    /// `cfg.resource ≥ demand` for every resource, same volume type, and
    /// the network class offered. Entries with missing or zero numerics never cover.
    pub fn is_covered_by(&self, cfg: &ComputeConfiguration) -> bool {
        let Some((cpu, memory, storage)) = cfg.resources() else {
            return false;
        };
        cpu >= self.cpu
            && memory >= self.memory
            && storage >= self.storage
            && cfg.volume_type.as_deref() == Some(self.disk_type.as_str())
            && cfg.supports_network(&self.network_type)
    }
}

/// The node has room for the pod's CPU and memory requests.
pub fn fits(node: &WeightedNode, pod: &WeightedPod) -> bool {
    node.available_cpu >= pod.requested_cpu && node.available_memory >= pod.requested_memory
}

/// Highest-scoring node that fits, with its score.
pub fn select_best_node<'a>(
    nodes: &'a [WeightedNode],
    pod: &WeightedPod,
) -> Option<(&'a WeightedNode, f64)> {
    let mut best: Option<(&WeightedNode, f64)> = None;
    for node in nodes.iter().filter(|n| !n.is_empty() && fits(n, pod)) {
        let score = total_score(node, pod);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((node, score));
        }
    }
    best
}

/// Cheapest priced entry covering the demand.
pub fn cheapest_configuration<'a>(
    configs: &'a [ComputeConfiguration],
    demand: &Demand,
) -> Option<&'a ComputeConfiguration> {
    let mut best: Option<(&ComputeConfiguration, f64)> = None;
    for cfg in configs.iter().filter(|c| demand.is_covered_by(c)) {
        let Some(price) = cfg.price_per_unit() else {
            continue;
        };
        if best.is_none_or(|(_, cheapest)| price < cheapest) {
            best = Some((cfg, price));
        }
    }
    best.map(|(cfg, _)| cfg)
}

/// Mean price of every priced entry covering the demand; `0` when none does.
pub fn mean_price(configs: &[ComputeConfiguration], demand: &Demand) -> f64 {
    let prices: Vec<f64> = configs
        .iter()
        .filter(|c| demand.is_covered_by(c))
        .filter_map(ComputeConfiguration::price_per_unit)
        .collect();
    if prices.is_empty() {
        0.0
    } else {
        prices.iter().sum::<f64>() / prices.len() as f64
    }
}

/// First rate whose selector names `instance_type`.
pub fn find_rate<'a>(rates: &'a [WeightedRate], instance_type: &str) -> Option<&'a WeightedRate> {
    if instance_type.is_empty() {
        return None;
    }
    rates
        .iter()
        .find(|r| r.selector.get(LABEL_INSTANCE_TYPE).map(String::as_str) == Some(instance_type))
}
