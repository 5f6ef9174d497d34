use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use pkg_constants::k8s::{
    ANNOTATION_DISK_TYPE, ANNOTATION_NETWORK_TYPE, LABEL_HOSTNAME, LABEL_INSTANCE_TYPE,
    RESOURCE_CPU, RESOURCE_EPHEMERAL_STORAGE, RESOURCE_MEMORY,
};
use pkg_constants::workload::{DEFAULT_DISK_TYPE, DEFAULT_NETWORK_TYPE};
use pkg_types::node::WeightedNode;
use pkg_types::rate::WeightedRate;
use std::collections::{BTreeMap, HashMap};

use crate::error::MapperError;
use crate::quantity::{cpu_cores, gibibytes};

#[derive(Default)]
struct Resources {
    cpu: f64,
    memory: f64,
    storage: f64,
}

fn read_resources(map: Option<&BTreeMap<String, Quantity>>) -> Result<Resources, MapperError> {
    let Some(map) = map else {
        return Ok(Resources::default());
    };
    Ok(Resources {
        cpu: map
            .get(RESOURCE_CPU)
            .map(|q| cpu_cores(RESOURCE_CPU, q))
            .transpose()?
            .unwrap_or(0.0),
        memory: map
            .get(RESOURCE_MEMORY)
            .map(|q| gibibytes(RESOURCE_MEMORY, q))
            .transpose()?
            .unwrap_or(0.0),
        storage: map
            .get(RESOURCE_EPHEMERAL_STORAGE)
            .map(|q| gibibytes(RESOURCE_EPHEMERAL_STORAGE, q))
            .transpose()?
            .unwrap_or(0.0),
    })
}

/// Keep `0 ≤ available ≤ total` when the total is known.
fn clamp_available(available: f64, total: f64) -> f64 {
    if total > 0.0 {
        available.clamp(0.0, total)
    } else {
        available.max(0.0)
    }
}

/// Project a cluster node onto its weighted form. Allocatable resources are
/// the available capacity, node capacity is the total. Prices start at zero
/// and rates unknown; the snapshot controller fills them in.
pub fn map_node_to_weighted_node(node: &Node) -> Result<WeightedNode, MapperError> {
    let meta = &node.metadata;
    let node_name = meta.name.clone().unwrap_or_default();

    let empty = BTreeMap::new();
    let labels = meta.labels.as_ref().unwrap_or(&empty);
    let annotations = meta.annotations.as_ref().unwrap_or(&empty);

    let mut selector = HashMap::new();
    for key in [LABEL_HOSTNAME, LABEL_INSTANCE_TYPE] {
        if let Some(value) = labels.get(key).filter(|v| !v.is_empty()) {
            selector.insert(key.to_string(), value.clone());
        }
    }
    if selector.is_empty() {
        return Err(MapperError::MissingNodeLabels(node_name));
    }

    let status = node.status.as_ref();
    let available = read_resources(status.and_then(|s| s.allocatable.as_ref()))?;
    let total = read_resources(status.and_then(|s| s.capacity.as_ref()))?;

    let annotation = |key: &str, default: &str| {
        annotations
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    Ok(WeightedNode {
        available_cpu: clamp_available(available.cpu, total.cpu),
        total_cpu: total.cpu,
        available_memory: clamp_available(available.memory, total.memory),
        total_memory: total.memory,
        available_storage: clamp_available(available.storage, total.storage),
        total_storage: total.storage,
        disk_type: annotation(ANNOTATION_DISK_TYPE, DEFAULT_DISK_TYPE),
        network_type: annotation(ANNOTATION_NETWORK_TYPE, DEFAULT_NETWORK_TYPE),
        price: 0.0,
        median_price: 0.0,
        instance_type: labels.get(LABEL_INSTANCE_TYPE).cloned().unwrap_or_default(),
        interruption_rate: WeightedRate::unknown(),
        latency_rate: WeightedRate::unknown(),
        selector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> Node {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_maps_resources_and_labels() {
        let n = node(json!({
            "metadata": {
                "name": "worker-1",
                "labels": {
                    "kubernetes.io/hostname": "worker-1",
                    "node.kubernetes.io/instance-type": "m5.xlarge"
                },
                "annotations": {"ultron.io/network-type": "10G"}
            },
            "status": {
                "allocatable": {"cpu": "3500m", "memory": "14Gi", "ephemeral-storage": "90Gi"},
                "capacity": {"cpu": "4", "memory": "16Gi", "ephemeral-storage": "100Gi"}
            }
        }));

        let w = map_node_to_weighted_node(&n).unwrap();
        assert_eq!(w.available_cpu, 3.5);
        assert_eq!(w.total_cpu, 4.0);
        assert_eq!(w.available_memory, 14.0);
        assert_eq!(w.total_memory, 16.0);
        assert_eq!(w.available_storage, 90.0);
        assert_eq!(w.total_storage, 100.0);
        assert_eq!(w.disk_type, "SSD");
        assert_eq!(w.network_type, "10G");
        assert_eq!(w.instance_type, "m5.xlarge");
        assert_eq!(w.selector.len(), 2);
        assert_eq!(w.price, 0.0);
        assert!(!w.interruption_rate.is_known());
    }

    #[test]
    fn test_hostname_alone_is_enough() {
        let n = node(json!({
            "metadata": {"name": "edge", "labels": {"kubernetes.io/hostname": "edge"}}
        }));
        let w = map_node_to_weighted_node(&n).unwrap();
        assert_eq!(w.instance_type, "");
        assert_eq!(w.selector.get(LABEL_HOSTNAME).map(String::as_str), Some("edge"));
        assert_eq!(w.total_cpu, 0.0);
    }

    #[test]
    fn test_unlabelled_node_fails() {
        let n = node(json!({"metadata": {"name": "ghost", "labels": {"zone": "a"}}}));
        assert!(matches!(
            map_node_to_weighted_node(&n),
            Err(MapperError::MissingNodeLabels(ref name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_available_never_exceeds_total() {
        let n = node(json!({
            "metadata": {"name": "odd", "labels": {"kubernetes.io/hostname": "odd"}},
            "status": {
                "allocatable": {"cpu": "8"},
                "capacity": {"cpu": "4"}
            }
        }));
        assert_eq!(map_node_to_weighted_node(&n).unwrap().available_cpu, 4.0);
    }
}
