use k8s_openapi::api::core::v1::Pod;
use pkg_cache::Cache;
use pkg_constants::k8s::LABEL_INSTANCE_TYPE;
use pkg_mapper::map_pod_to_weighted_pod;
use pkg_types::compute::ComputeConfiguration;
use pkg_types::node::WeightedNode;
use pkg_types::pod::WeightedPod;
use pkg_types::rate::{WeightedInteruptionRate, WeightedLatencyRate, WeightedRate};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::ComputeError;
use crate::matching::{Demand, cheapest_configuration, find_rate, mean_price, select_best_node};

/// Outcome of a successful placement.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// An existing cluster node.
    Cluster(WeightedNode),
    /// A node of a catalog class that the provisioner has to create.
    Catalog {
        node: WeightedNode,
        configuration: ComputeConfiguration,
    },
}

impl Placement {
    pub fn node(&self) -> &WeightedNode {
        match self {
            Placement::Cluster(node) => node,
            Placement::Catalog { node, .. } => node,
        }
    }

    pub fn into_node(self) -> WeightedNode {
        match self {
            Placement::Cluster(node) => node,
            Placement::Catalog { node, .. } => node,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Placement::Cluster(_) => "cluster",
            Placement::Catalog { .. } => "catalog",
        }
    }
}

/// The placement engine. Holds no state of its own; every decision reads
/// the current cache snapshots.
#[derive(Clone)]
pub struct ComputeService {
    cache: Cache,
}

impl ComputeService {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Pick a target for a raw pod. The pod is mapped, matched against the
    /// cluster snapshot, then against the catalog.
    pub async fn match_pod_spec(&self, pod: &Pod) -> Result<WeightedNode, ComputeError> {
        Ok(self.place_pod(pod).await?.into_node())
    }

    pub async fn place_pod(&self, pod: &Pod) -> Result<Placement, ComputeError> {
        let wpod = map_pod_to_weighted_pod(pod)?;
        self.place_weighted_pod(&wpod).await
    }

    /// Two-stage resolution: in-cluster first, catalog second, never interleaved.
    pub async fn place_weighted_pod(&self, wpod: &WeightedPod) -> Result<Placement, ComputeError> {
        let pod_name = wpod.name().unwrap_or_default();

        if let Some(node) = self.match_weighted_pod_to_weighted_node(wpod).await? {
            info!("Pod {} → cluster node {}", pod_name, node.display_name());
            return Ok(Placement::Cluster(node));
        }

        let catalog = self.cache.get_all_compute_configurations().await?;
        if catalog.is_empty() {
            return Err(ComputeError::EmptyCatalog);
        }
        let demand = Demand::of_pod(wpod);
        let Some(configuration) = cheapest_configuration(&catalog, &demand).cloned() else {
            info!(
                "Pod {} has no suitable target (cpu={} memory={}GiB storage={}GiB disk={} network={})",
                pod_name,
                wpod.requested_cpu,
                wpod.requested_memory,
                wpod.requested_storage,
                wpod.requested_disk_type,
                wpod.requested_network_type
            );
            return Err(ComputeError::NoSuitableTarget);
        };

        let mut node = synthesize_node(&configuration, wpod);
        node.median_price = mean_price(&catalog, &Demand::of_node(&node));
        node.interruption_rate = self
            .compute_interuption_rate(&node)
            .await?
            .unwrap_or_else(WeightedRate::unknown);
        node.latency_rate = self
            .compute_latency_rate(&node)
            .await?
            .unwrap_or_else(WeightedRate::unknown);

        info!(
            "Pod {} → new {} node (price={} mean={})",
            pod_name, node.instance_type, node.price, node.median_price
        );
        Ok(Placement::Catalog {
            node,
            configuration,
        })
    }

    /// Best-scoring cached node with room for the pod, `None` if none fits.
    pub async fn match_weighted_pod_to_weighted_node(
        &self,
        wpod: &WeightedPod,
    ) -> Result<Option<WeightedNode>, ComputeError> {
        let nodes = self.cache.get_weighted_nodes().await?;
        let best = select_best_node(&nodes, wpod);
        if let Some((node, score)) = best {
            debug!(
                "Best of {} cached nodes: {} (score {:.4})",
                nodes.len(),
                node.display_name(),
                score
            );
        }
        Ok(best.map(|(node, _)| node.clone()))
    }

    /// Cheapest catalog entry satisfying every pod requirement.
    pub async fn match_weighted_pod_to_compute_configuration(
        &self,
        wpod: &WeightedPod,
    ) -> Result<Option<ComputeConfiguration>, ComputeError> {
        let catalog = self.cache.get_all_compute_configurations().await?;
        Ok(cheapest_configuration(&catalog, &Demand::of_pod(wpod)).cloned())
    }

    /// Cheapest catalog entry covering the node's available capacity.
    pub async fn match_weighted_node_to_compute_configuration(
        &self,
        wnode: &WeightedNode,
    ) -> Result<Option<ComputeConfiguration>, ComputeError> {
        let catalog = self.cache.get_all_compute_configurations().await?;
        Ok(cheapest_configuration(&catalog, &Demand::of_node(wnode)).cloned())
    }

    /// Mean price of the catalog entries covering the node; `0` when none does.
    pub async fn calculate_weighted_node_median_price(
        &self,
        wnode: &WeightedNode,
    ) -> Result<f64, ComputeError> {
        let catalog = self.cache.get_all_compute_configurations().await?;
        Ok(mean_price(&catalog, &Demand::of_node(wnode)))
    }

    pub async fn compute_interuption_rate(
        &self,
        wnode: &WeightedNode,
    ) -> Result<Option<WeightedInteruptionRate>, ComputeError> {
        let rates = self.cache.get_weighted_interuption_rates().await?;
        Ok(find_rate(&rates, &wnode.instance_type).cloned())
    }

    pub async fn compute_latency_rate(
        &self,
        wnode: &WeightedNode,
    ) -> Result<Option<WeightedLatencyRate>, ComputeError> {
        let rates = self.cache.get_weighted_latency_rates().await?;
        Ok(find_rate(&rates, &wnode.instance_type).cloned())
    }

    /// Fill in price, mean market price and rates of a freshly mapped node.
    pub async fn price_weighted_node(
        &self,
        mut wnode: WeightedNode,
    ) -> Result<WeightedNode, ComputeError> {
        let catalog = self.cache.get_all_compute_configurations().await?;
        let demand = Demand::of_node(&wnode);

        if let Some(price) =
            cheapest_configuration(&catalog, &demand).and_then(ComputeConfiguration::price_per_unit)
        {
            wnode.price = price;
        }
        wnode.median_price = mean_price(&catalog, &demand);
        wnode.interruption_rate = self
            .compute_interuption_rate(&wnode)
            .await?
            .unwrap_or_else(WeightedRate::unknown);
        wnode.latency_rate = self
            .compute_latency_rate(&wnode)
            .await?
            .unwrap_or_else(WeightedRate::unknown);
        Ok(wnode)
    }
}

/// Node of the configuration's class, carrying the pod's disk and network classes.
fn synthesize_node(cfg: &ComputeConfiguration, wpod: &WeightedPod) -> WeightedNode {
    let (cpu, memory, storage) = cfg.resources().unwrap_or_default();
    let instance_type = cfg.compute_type.instance_type();
    WeightedNode {
        available_cpu: cpu,
        total_cpu: cpu,
        available_memory: memory,
        total_memory: memory,
        available_storage: storage,
        total_storage: storage,
        disk_type: wpod.requested_disk_type.clone(),
        network_type: wpod.requested_network_type.clone(),
        price: cfg.price_per_unit().unwrap_or_default(),
        median_price: 0.0,
        instance_type: instance_type.to_string(),
        interruption_rate: WeightedRate::unknown(),
        latency_rate: WeightedRate::unknown(),
        selector: HashMap::from([(LABEL_INSTANCE_TYPE.to_string(), instance_type.to_string())]),
    }
}
