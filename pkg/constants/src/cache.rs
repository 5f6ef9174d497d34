//! Well-known cache keys.

/// Snapshot of every weighted cluster node.
pub const WEIGHTED_NODES_KEY: &str = "ULTRON_WEIGHTED_NODES";

/// Catalog of durable (reserved) VM configurations.
pub const DURABLE_COMPUTE_CONFIGURATIONS_KEY: &str = "ULTRON_DURABLE_VMCONFIGURATION";

/// Catalog of ephemeral (spot) VM configurations.
pub const EPHEMERAL_COMPUTE_CONFIGURATIONS_KEY: &str = "ULTRON_SPOT_VMCONFIGURATION";

/// Latency rates keyed by instance type.
pub const LATENCY_RATES_KEY: &str = "ULTRON_DURABLE_VMCONFIGURATION_LATENCY_RATES";

/// Interruption rates keyed by instance type.
pub const INTERUPTION_RATES_KEY: &str = "ULTRON_SPOT_VMCONFIGURATION_INTERUPTION_RATES";

/// Weighted node snapshots outlive this many refresh intervals before expiring.
pub const SNAPSHOT_TTL_INTERVALS: u32 = 3;

/// Default refresh interval of the out-of-band publishers, in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
