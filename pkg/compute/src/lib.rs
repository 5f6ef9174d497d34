//! Placement engine: in-cluster matching first, cheapest catalog entry second.

pub mod error;
pub mod matching;
pub mod service;

pub use error::ComputeError;
pub use matching::Demand;
pub use service::{ComputeService, Placement};
