use pkg_constants::cache::{
    DURABLE_COMPUTE_CONFIGURATIONS_KEY, EPHEMERAL_COMPUTE_CONFIGURATIONS_KEY,
    INTERUPTION_RATES_KEY, LATENCY_RATES_KEY, WEIGHTED_NODES_KEY,
};
use pkg_types::compute::ComputeConfiguration;
use pkg_types::node::WeightedNode;
use pkg_types::rate::{WeightedInteruptionRate, WeightedLatencyRate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::backend::{CacheBackend, CacheValue};
use crate::error::CacheError;
use crate::memory::MemoryCache;
use crate::remote::RedisCache;

/// Shared handle to the active cache backend. Cheap to clone.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    /// Pick the backend: Redis when given, otherwise the in-process map.
    /// With neither, a fresh in-process map is installed.
    pub fn new(memory: Option<MemoryCache>, redis: Option<RedisCache>) -> Self {
        match (memory, redis) {
            (Some(_), Some(redis)) => {
                warn!("Both cache backends supplied, using redis");
                Self::with_backend(Arc::new(redis))
            }
            (None, Some(redis)) => Self::with_backend(Arc::new(redis)),
            (Some(memory), None) => Self::with_backend(Arc::new(memory)),
            (None, None) => Self::with_backend(Arc::new(MemoryCache::new())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None, None)
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        info!("Cache backend: {}", backend.name());
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Replace the value stored under `key`.
    pub async fn put(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.backend.put(key, value, ttl).await
    }

    /// Fetch the value stored under `key`; [`CacheError::Miss`] when absent.
    pub async fn get(&self, key: &str) -> Result<Arc<CacheValue>, CacheError> {
        self.backend
            .get(key)
            .await?
            .ok_or_else(|| CacheError::Miss(key.to_string()))
    }

    pub async fn get_weighted_nodes(&self) -> Result<Vec<WeightedNode>, CacheError> {
        let value = self.get(WEIGHTED_NODES_KEY).await?;
        match value.as_ref() {
            CacheValue::WeightedNodes(nodes) => Ok(nodes.clone()),
            other => Err(wrong_kind(WEIGHTED_NODES_KEY, "WeightedNodes", other)),
        }
    }

    pub async fn get_durable_compute_configurations(
        &self,
    ) -> Result<Vec<ComputeConfiguration>, CacheError> {
        self.get_compute_configurations(DURABLE_COMPUTE_CONFIGURATIONS_KEY)
            .await
    }

    pub async fn get_ephemeral_compute_configurations(
        &self,
    ) -> Result<Vec<ComputeConfiguration>, CacheError> {
        self.get_compute_configurations(EPHEMERAL_COMPUTE_CONFIGURATIONS_KEY)
            .await
    }

    /// Durable entries followed by ephemeral entries.
    pub async fn get_all_compute_configurations(
        &self,
    ) -> Result<Vec<ComputeConfiguration>, CacheError> {
        let mut all = self.get_durable_compute_configurations().await?;
        all.extend(self.get_ephemeral_compute_configurations().await?);
        Ok(all)
    }

    pub async fn get_weighted_interuption_rates(
        &self,
    ) -> Result<Vec<WeightedInteruptionRate>, CacheError> {
        let value = self.get(INTERUPTION_RATES_KEY).await?;
        match value.as_ref() {
            CacheValue::InteruptionRates(rates) => Ok(rates.clone()),
            other => Err(wrong_kind(INTERUPTION_RATES_KEY, "InteruptionRates", other)),
        }
    }

    pub async fn get_weighted_latency_rates(
        &self,
    ) -> Result<Vec<WeightedLatencyRate>, CacheError> {
        let value = self.get(LATENCY_RATES_KEY).await?;
        match value.as_ref() {
            CacheValue::LatencyRates(rates) => Ok(rates.clone()),
            other => Err(wrong_kind(LATENCY_RATES_KEY, "LatencyRates", other)),
        }
    }

    async fn get_compute_configurations(
        &self,
        key: &str,
    ) -> Result<Vec<ComputeConfiguration>, CacheError> {
        let value = self.get(key).await?;
        match value.as_ref() {
            CacheValue::ComputeConfigurations(configs) => Ok(configs.clone()),
            other => Err(wrong_kind(key, "ComputeConfigurations", other)),
        }
    }
}

fn wrong_kind(key: &str, expected: &str, found: &CacheValue) -> CacheError {
    CacheError::corruption(key, format!("expected {}, found {}", expected, found.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::compute::ComputeType;
    use pkg_types::rate::WeightedRate;

    fn config(vcpu: u32, compute_type: ComputeType) -> ComputeConfiguration {
        ComputeConfiguration {
            vcpu: Some(vcpu),
            compute_type,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_default_cache_is_in_memory() {
        let cache = Cache::new(None, None);
        assert_eq!(cache.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_missing_key_is_cache_miss() {
        let cache = Cache::in_memory();
        let err = cache.get_weighted_nodes().await.unwrap_err();
        assert!(matches!(err, CacheError::Miss(ref k) if k == WEIGHTED_NODES_KEY));
    }

    #[tokio::test]
    async fn test_wrong_type_is_corruption() {
        let cache = Cache::in_memory();
        cache
            .put(
                WEIGHTED_NODES_KEY,
                CacheValue::LatencyRates(vec![WeightedRate::unknown()]),
                None,
            )
            .await
            .unwrap();

        let err = cache.get_weighted_nodes().await.unwrap_err();
        assert!(matches!(err, CacheError::Corruption { .. }));
    }

    #[tokio::test]
    async fn test_all_configurations_are_durable_then_ephemeral() {
        let cache = Cache::in_memory();
        cache
            .put(
                EPHEMERAL_COMPUTE_CONFIGURATIONS_KEY,
                CacheValue::ComputeConfigurations(vec![config(1, ComputeType::Ephemeral)]),
                None,
            )
            .await
            .unwrap();
        cache
            .put(
                DURABLE_COMPUTE_CONFIGURATIONS_KEY,
                CacheValue::ComputeConfigurations(vec![
                    config(2, ComputeType::Durable),
                    config(4, ComputeType::Durable),
                ]),
                None,
            )
            .await
            .unwrap();

        let all = cache.get_all_compute_configurations().await.unwrap();
        let vcpus: Vec<_> = all.iter().filter_map(|c| c.vcpu).collect();
        assert_eq!(vcpus, vec![2, 4, 1]);
        assert_eq!(all[2].compute_type, ComputeType::Ephemeral);
    }

    #[tokio::test]
    async fn test_all_configurations_require_both_catalogs() {
        let cache = Cache::in_memory();
        cache
            .put(
                DURABLE_COMPUTE_CONFIGURATIONS_KEY,
                CacheValue::ComputeConfigurations(vec![config(2, ComputeType::Durable)]),
                None,
            )
            .await
            .unwrap();

        let err = cache.get_all_compute_configurations().await.unwrap_err();
        assert!(matches!(err, CacheError::Miss(ref k) if k == EPHEMERAL_COMPUTE_CONFIGURATIONS_KEY));
    }

    #[tokio::test]
    async fn test_rate_tables_are_discriminated() {
        let cache = Cache::in_memory();
        cache
            .put(
                INTERUPTION_RATES_KEY,
                CacheValue::InteruptionRates(vec![WeightedRate::for_instance_type(
                    "ultron.ephemeral",
                    0.2,
                )]),
                None,
            )
            .await
            .unwrap();
        cache
            .put(
                LATENCY_RATES_KEY,
                CacheValue::InteruptionRates(vec![]),
                None,
            )
            .await
            .unwrap();

        assert_eq!(cache.get_weighted_interuption_rates().await.unwrap().len(), 1);
        assert!(matches!(
            cache.get_weighted_latency_rates().await.unwrap_err(),
            CacheError::Corruption { .. }
        ));
    }
}
