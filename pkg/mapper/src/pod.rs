use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use pkg_constants::k8s::{
    ANNOTATION_DISK_TYPE, ANNOTATION_NETWORK_TYPE, ANNOTATION_PRIORITY, ANNOTATION_STORAGE_SIZE,
    BYTES_PER_GIB, RESOURCE_CPU, RESOURCE_MEMORY, SELECTOR_POD_NAME, SELECTOR_POD_NAMESPACE,
};
use pkg_constants::workload::{DEFAULT_DISK_TYPE, DEFAULT_NETWORK_TYPE, DEFAULT_STORAGE_GIB};
use pkg_types::pod::{Priority, WeightedPod};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::error::MapperError;
use crate::quantity::{cpu_cores, gibibytes, parse_quantity};

/// `(cpu cores, memory GiB)` of one container resource map.
fn read_resources(map: Option<&BTreeMap<String, Quantity>>) -> Result<(f64, f64), MapperError> {
    let Some(map) = map else {
        return Ok((0.0, 0.0));
    };
    let cpu = match map.get(RESOURCE_CPU) {
        Some(q) => cpu_cores(RESOURCE_CPU, q)?,
        None => 0.0,
    };
    let memory = match map.get(RESOURCE_MEMORY) {
        Some(q) => gibibytes(RESOURCE_MEMORY, q)?,
        None => 0.0,
    };
    Ok((cpu, memory))
}

/// Total `(cpu cores, memory GiB)` requested by the pod's containers.
pub fn pod_requests(pod: &Pod) -> Result<(f64, f64), MapperError> {
    let (requests, _) = pod_resources(pod)?;
    Ok(requests)
}

/// Summed requests and limits. Each container's requests are checked
/// against its own limits; a container without a limit is unbounded.
fn pod_resources(pod: &Pod) -> Result<((f64, f64), (f64, f64)), MapperError> {
    let mut requests = (0.0, 0.0);
    let mut limits = (0.0, 0.0);
    for container in pod.spec.iter().flat_map(|s| s.containers.iter()) {
        let resources = container.resources.as_ref();
        let (req_cpu, req_memory) = read_resources(resources.and_then(|r| r.requests.as_ref()))?;
        let (lim_cpu, lim_memory) = read_resources(resources.and_then(|r| r.limits.as_ref()))?;
        check_limit(RESOURCE_CPU, req_cpu, lim_cpu)?;
        check_limit(RESOURCE_MEMORY, req_memory, lim_memory)?;

        requests.0 += req_cpu;
        requests.1 += req_memory;
        limits.0 += lim_cpu;
        limits.1 += lim_memory;
    }
    Ok((requests, limits))
}

/// Storage annotation in GiB. A bare number is GiB; a suffixed value is a quantity.
fn storage_gib(raw: &str) -> Result<f64, MapperError> {
    if let Ok(gib) = raw.trim().parse::<f64>() {
        if gib >= 0.0 && gib.is_finite() {
            return Ok(gib);
        }
    }
    Ok(parse_quantity(ANNOTATION_STORAGE_SIZE, raw)? / BYTES_PER_GIB)
}

fn check_limit(resource: &'static str, request: f64, limit: f64) -> Result<(), MapperError> {
    if request > 0.0 && limit > 0.0 && request > limit {
        return Err(MapperError::RequestExceedsLimit {
            resource,
            request,
            limit,
        });
    }
    Ok(())
}

/// Project a pod onto the fields the placement engine scores.
pub fn map_pod_to_weighted_pod(pod: &Pod) -> Result<WeightedPod, MapperError> {
    let meta = &pod.metadata;
    let name = meta
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or_else(|| meta.generate_name.as_deref().filter(|n| !n.is_empty()))
        .ok_or(MapperError::MissingIdentity)?;

    let empty = BTreeMap::new();
    let annotations = meta.annotations.as_ref().unwrap_or(&empty);
    let annotation = |key: &str| annotations.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    let ((requested_cpu, requested_memory), (limit_cpu, limit_memory)) = pod_resources(pod)?;

    let requested_storage = match annotation(ANNOTATION_STORAGE_SIZE) {
        Some(raw) => storage_gib(raw)?,
        None => DEFAULT_STORAGE_GIB,
    };

    let priority = match annotation(ANNOTATION_PRIORITY) {
        Some(raw) => Priority::from_annotation(raw).unwrap_or_else(|| {
            warn!("Pod {} has unknown priority {:?}, using Low", name, raw);
            Priority::Low
        }),
        None => Priority::Low,
    };

    let mut selector = HashMap::from([(SELECTOR_POD_NAME.to_string(), name.to_string())]);
    if let Some(ns) = meta.namespace.as_deref().filter(|ns| !ns.is_empty()) {
        selector.insert(SELECTOR_POD_NAMESPACE.to_string(), ns.to_string());
    }

    Ok(WeightedPod {
        requested_cpu,
        requested_memory,
        requested_storage,
        requested_disk_type: annotation(ANNOTATION_DISK_TYPE)
            .unwrap_or(DEFAULT_DISK_TYPE)
            .to_string(),
        requested_network_type: annotation(ANNOTATION_NETWORK_TYPE)
            .unwrap_or(DEFAULT_NETWORK_TYPE)
            .to_string(),
        limit_cpu,
        limit_memory,
        priority,
        selector,
    })
}
