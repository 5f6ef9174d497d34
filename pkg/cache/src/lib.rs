//! Keyed cache for weighted-node snapshots, VM catalogs and rate tables.
//!
//! Values are replaced whole per key. Exactly one backend is active: an
//! in-process map ([`memory::MemoryCache`]) or Redis ([`remote::RedisCache`]).

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;
pub mod remote;

pub use backend::{CacheBackend, CacheValue};
pub use client::Cache;
pub use error::CacheError;
