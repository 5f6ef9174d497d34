//! Kubernetes annotation and label names.

// ─── Annotations (pods and nodes) ─────────────────────────────────────────

pub const ANNOTATION_DISK_TYPE: &str = "ultron.io/disk-type";
pub const ANNOTATION_NETWORK_TYPE: &str = "ultron.io/network-type";
pub const ANNOTATION_STORAGE_SIZE: &str = "ultron.io/storage-size";
pub const ANNOTATION_PRIORITY: &str = "ultron.io/priority";

/// Annotation values accepted for [`ANNOTATION_PRIORITY`].
pub const PRIORITY_HIGH: &str = "PriorityHigh";
pub const PRIORITY_LOW: &str = "PriorityLow";

// ─── Labels ───────────────────────────────────────────────────────────────

pub const LABEL_HOSTNAME: &str = "kubernetes.io/hostname";
pub const LABEL_INSTANCE_TYPE: &str = "node.kubernetes.io/instance-type";

/// Instance type stamped on pods that should land on a new durable VM.
pub const DEFAULT_DURABLE_INSTANCE_TYPE: &str = "ultron.durable";

/// Instance type stamped on pods that should land on a new ephemeral (spot) VM.
pub const DEFAULT_EPHEMERAL_INSTANCE_TYPE: &str = "ultron.ephemeral";

/// Selector key carrying the pod identity on a weighted pod.
pub const SELECTOR_POD_NAME: &str = "name";
pub const SELECTOR_POD_NAMESPACE: &str = "namespace";

// ─── Resource names ───────────────────────────────────────────────────────

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";
pub const RESOURCE_EPHEMERAL_STORAGE: &str = "ephemeral-storage";

/// Bytes in one GiB.
pub const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;
