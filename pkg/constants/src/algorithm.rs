//! Weights of the node scoring function.

/// Resource headroom weight (α).
pub const ALPHA: f64 = 1.0;

/// Storage class match weight (β).
pub const BETA: f64 = 0.5;

/// Network class match weight (γ).
pub const GAMMA: f64 = 0.5;

/// Price advantage weight (δ).
pub const DELTA: f64 = 1.0;

/// Node instability penalty weight (ε).
pub const EPSILON: f64 = 1.0;

/// Workload priority weight (ζ).
pub const ZETA: f64 = 0.8;

/// Rate value meaning "not known for this instance type".
pub const RATE_UNKNOWN: f64 = -1.0;
