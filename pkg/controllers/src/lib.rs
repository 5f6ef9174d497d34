//! Background publishers that keep the placement cache fresh.

pub mod catalog;
pub mod snapshot;

pub use catalog::CatalogController;
pub use snapshot::NodeSnapshotController;
