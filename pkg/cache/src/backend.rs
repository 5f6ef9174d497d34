use async_trait::async_trait;
use pkg_types::compute::ComputeConfiguration;
use pkg_types::node::WeightedNode;
use pkg_types::rate::{WeightedInteruptionRate, WeightedLatencyRate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheError;

/// Everything the cache knows how to hold. Typed accessors on
/// [`crate::Cache`] check the variant before handing data out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheValue {
    WeightedNodes(Vec<WeightedNode>),
    ComputeConfigurations(Vec<ComputeConfiguration>),
    InteruptionRates(Vec<WeightedInteruptionRate>),
    LatencyRates(Vec<WeightedLatencyRate>),
}

impl CacheValue {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::WeightedNodes(_) => "WeightedNodes",
            CacheValue::ComputeConfigurations(_) => "ComputeConfigurations",
            CacheValue::InteruptionRates(_) => "InteruptionRates",
            CacheValue::LatencyRates(_) => "LatencyRates",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CacheValue::WeightedNodes(v) => v.len(),
            CacheValue::ComputeConfigurations(v) => v.len(),
            CacheValue::InteruptionRates(v) => v.len(),
            CacheValue::LatencyRates(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage behind [`crate::Cache`]. A `put` replaces the whole value under
/// `key` in one step; readers never observe a partially written value.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store `value` under `key`. `None` TTL never expires.
    async fn put(&self, key: &str, value: CacheValue, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// Fetch the live value under `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Arc<CacheValue>>, CacheError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
