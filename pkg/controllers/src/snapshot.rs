use k8s_openapi::api::core::v1::{Node, Pod};
use kube::Client;
use kube::api::{Api, ListParams};
use pkg_cache::CacheValue;
use pkg_compute::ComputeService;
use pkg_constants::cache::{SNAPSHOT_TTL_INTERVALS, WEIGHTED_NODES_KEY};
use pkg_mapper::{map_node_to_weighted_node, pod_requests};
use pkg_types::node::WeightedNode;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pod phases that no longer hold resources on their node.
const TERMINAL_PHASES: [&str; 2] = ["Succeeded", "Failed"];

/// Periodically lists cluster nodes and pods and publishes the weighted
/// node snapshot under `ULTRON_WEIGHTED_NODES`.
pub struct NodeSnapshotController {
    client: Client,
    compute: ComputeService,
    interval: Duration,
}

impl NodeSnapshotController {
    pub fn new(client: Client, compute: ComputeService, interval: Duration) -> Self {
        Self {
            client,
            compute,
            interval,
        }
    }

    /// Start the controller loop as a background task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "NodeSnapshotController started (interval={}s)",
                self.interval.as_secs()
            );
            let mut interval = tokio::time::interval(self.interval);
            loop {
                interval.tick().await;
                if let Err(e) = self.reconcile().await {
                    warn!("NodeSnapshotController reconcile error: {}", e);
                }
            }
        })
    }

    /// One pass: list, map, account for bound pods, price, publish.
    async fn reconcile(&self) -> anyhow::Result<()> {
        let lp = ListParams::default();
        let nodes = Api::<Node>::all(self.client.clone()).list(&lp).await?;
        let pods = Api::<Pod>::all(self.client.clone()).list(&lp).await?;

        let usage = requested_by_node(&pods.items);
        let (snapshot, skipped) = build_snapshot(&nodes.items, &usage);

        let mut priced = Vec::with_capacity(snapshot.len());
        let mut unpriced = false;
        for node in snapshot {
            match self.compute.price_weighted_node(node.clone()).await {
                Ok(n) => priced.push(n),
                Err(e) => {
                    if !unpriced {
                        warn!("Publishing nodes unpriced: {}", e);
                        unpriced = true;
                    }
                    priced.push(node);
                }
            }
        }

        let published = priced.len();
        let ttl = self.interval * SNAPSHOT_TTL_INTERVALS;
        self.compute
            .cache()
            .put(WEIGHTED_NODES_KEY, CacheValue::WeightedNodes(priced), Some(ttl))
            .await?;

        info!(
            "Node snapshot published: nodes={} published={} skipped={}",
            nodes.items.len(),
            published,
            skipped
        );
        Ok(())
    }
}

fn is_terminal(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .is_some_and(|phase| TERMINAL_PHASES.contains(&phase))
}

/// Summed `(cpu, memory GiB)` requests of the live pods bound to each node.
pub fn requested_by_node(pods: &[Pod]) -> HashMap<String, (f64, f64)> {
    let mut usage: HashMap<String, (f64, f64)> = HashMap::new();
    for pod in pods {
        let Some(node_name) = pod.spec.as_ref().and_then(|s| s.node_name.as_deref()) else {
            continue;
        };
        if is_terminal(pod) {
            continue;
        }
        match pod_requests(pod) {
            Ok((cpu, memory)) => {
                let entry = usage.entry(node_name.to_string()).or_default();
                entry.0 += cpu;
                entry.1 += memory;
            }
            Err(e) => warn!(
                "Ignoring requests of pod {}: {}",
                pod.metadata.name.as_deref().unwrap_or_default(),
                e
            ),
        }
    }
    usage
}

/// Map every node and reserve what its pods already request. Returns the
/// snapshot and the number of nodes that could not be mapped.
pub fn build_snapshot(
    nodes: &[Node],
    usage: &HashMap<String, (f64, f64)>,
) -> (Vec<WeightedNode>, usize) {
    let mut snapshot = Vec::with_capacity(nodes.len());
    let mut skipped = 0;
    for node in nodes {
        let name = node.metadata.name.as_deref().unwrap_or_default();
        match map_node_to_weighted_node(node) {
            Ok(mut wnode) => {
                if let Some((cpu, memory)) = usage.get(name) {
                    wnode.reserve(*cpu, *memory);
                }
                debug!(
                    "Node {}: cpu={}/{} memory={}/{}GiB",
                    name,
                    wnode.available_cpu,
                    wnode.total_cpu,
                    wnode.available_memory,
                    wnode.total_memory
                );
                snapshot.push(wnode);
            }
            Err(e) => {
                warn!("Skipping node {}: {}", name, e);
                skipped += 1;
            }
        }
    }
    (snapshot, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(name: &str, cpu: &str, memory: &str) -> Node {
        serde_json::from_value(json!({
            "metadata": {"name": name, "labels": {"kubernetes.io/hostname": name}},
            "status": {
                "allocatable": {"cpu": cpu, "memory": memory},
                "capacity": {"cpu": cpu, "memory": memory}
            }
        }))
        .unwrap()
    }

    fn pod(name: &str, node: Option<&str>, phase: &str, cpu: &str, memory: &str) -> Pod {
        serde_json::from_value(json!({
            "metadata": {"name": name},
            "spec": {
                "nodeName": node,
                "containers": [{
                    "name": "main",
                    "resources": {"requests": {"cpu": cpu, "memory": memory}}
                }]
            },
            "status": {"phase": phase}
        }))
        .unwrap()
    }

    #[test]
    fn test_sums_requests_of_live_bound_pods() {
        let pods = vec![
            pod("a", Some("worker-1"), "Running", "500m", "1Gi"),
            pod("b", Some("worker-1"), "Pending", "1", "2Gi"),
            pod("c", Some("worker-1"), "Succeeded", "2", "4Gi"),
            pod("d", None, "Pending", "2", "4Gi"),
            pod("e", Some("worker-2"), "Running", "250m", "512Mi"),
        ];
        let usage = requested_by_node(&pods);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage["worker-1"], (1.5, 3.0));
        assert_eq!(usage["worker-2"], (0.25, 0.5));
    }

    #[test]
    fn test_snapshot_reserves_usage_and_skips_unlabelled() {
        let unlabelled: Node =
            serde_json::from_value(json!({"metadata": {"name": "ghost"}})).unwrap();
        let nodes = vec![node("worker-1", "4", "8Gi"), unlabelled, node("worker-2", "2", "4Gi")];
        let usage = HashMap::from([
            ("worker-1".to_string(), (1.5, 3.0)),
            ("worker-2".to_string(), (3.0, 1.0)),
        ]);

        let (snapshot, skipped) = build_snapshot(&nodes, &usage);
        assert_eq!(skipped, 1);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].available_cpu, 2.5);
        assert_eq!(snapshot[0].available_memory, 5.0);
        assert_eq!(snapshot[0].total_cpu, 4.0);
        assert_eq!(snapshot[1].available_cpu, 0.0);
        assert_eq!(snapshot[1].available_memory, 3.0);
    }
}
