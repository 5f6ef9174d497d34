//! Projection of raw cluster objects into weighted pods and nodes.

pub mod error;
pub mod node;
pub mod pod;
pub mod quantity;

pub use error::MapperError;
pub use node::map_node_to_weighted_node;
pub use pod::{map_pod_to_weighted_pod, pod_requests};
