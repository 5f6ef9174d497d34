//! Defaults applied when a pod or node does not annotate its requirements.

pub const DEFAULT_DISK_TYPE: &str = "SSD";
pub const DEFAULT_NETWORK_TYPE: &str = "isolated";

/// Requested storage in GiB when the pod has no storage-size annotation.
pub const DEFAULT_STORAGE_GIB: f64 = 10.0;
