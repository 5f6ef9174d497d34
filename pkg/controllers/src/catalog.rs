use pkg_cache::{Cache, CacheError, CacheValue};
use pkg_constants::cache::{
    DURABLE_COMPUTE_CONFIGURATIONS_KEY, EPHEMERAL_COMPUTE_CONFIGURATIONS_KEY,
    INTERUPTION_RATES_KEY, LATENCY_RATES_KEY,
};
use pkg_types::compute::ComputeType;
use pkg_types::config::CatalogFile;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Reloads the provider catalog file and publishes its four cache keys.
pub struct CatalogController {
    cache: Cache,
    path: PathBuf,
    interval: Duration,
}

impl CatalogController {
    pub fn new(cache: Cache, path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            cache,
            path: path.into(),
            interval,
        }
    }

    /// Start the controller loop as a background task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "CatalogController started (path={} interval={}s)",
                self.path.display(),
                self.interval.as_secs()
            );
            let mut interval = tokio::time::interval(self.interval);
            loop {
                interval.tick().await;
                if let Err(e) = self.reconcile().await {
                    warn!("CatalogController keeping previous catalog: {}", e);
                }
            }
        })
    }

    /// One pass. Nothing is published unless the whole file loads.
    async fn reconcile(&self) -> anyhow::Result<()> {
        let catalog = load_catalog(&self.path)?;
        publish_catalog(&self.cache, catalog).await?;
        Ok(())
    }
}

/// Read a YAML (or JSON) catalog and stamp every entry with its compute type.
pub fn load_catalog(path: &Path) -> anyhow::Result<CatalogFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read catalog {}: {}", path.display(), e))?;
    let mut catalog: CatalogFile = serde_yaml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse catalog {}: {}", path.display(), e))?;

    for cfg in &mut catalog.durable {
        cfg.compute_type = ComputeType::Durable;
    }
    for cfg in &mut catalog.ephemeral {
        cfg.compute_type = ComputeType::Ephemeral;
    }
    Ok(catalog)
}

/// Replace the catalog and rate keys, one whole value per key.
pub async fn publish_catalog(cache: &Cache, catalog: CatalogFile) -> Result<(), CacheError> {
    let durable = catalog.durable.len();
    let ephemeral = catalog.ephemeral.len();

    cache
        .put(
            DURABLE_COMPUTE_CONFIGURATIONS_KEY,
            CacheValue::ComputeConfigurations(catalog.durable),
            None,
        )
        .await?;
    cache
        .put(
            EPHEMERAL_COMPUTE_CONFIGURATIONS_KEY,
            CacheValue::ComputeConfigurations(catalog.ephemeral),
            None,
        )
        .await?;
    cache
        .put(
            INTERUPTION_RATES_KEY,
            CacheValue::InteruptionRates(catalog.interruption_rates),
            None,
        )
        .await?;
    cache
        .put(
            LATENCY_RATES_KEY,
            CacheValue::LatencyRates(catalog.latency_rates),
            None,
        )
        .await?;

    info!(
        "Catalog published: durable={} ephemeral={}",
        durable, ephemeral
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
durable:
  - vCpu: 2
    ramGb: 8
    volumeGb: 50
    volumeType: SSD
    cloudNetworkTypes: [isolated]
    cost: { pricePerUnit: 0.2 }
spot:
  - vCpu: 4
    ramGb: 16
    volumeGb: 100
    volumeType: SSD
    cloudNetworkTypes: [isolated]
    cost: { pricePerUnit: 0.1 }
interruption_rates:
  - selector: { node.kubernetes.io/instance-type: ultron.ephemeral }
    value: 0.3
"#;

    fn write(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_stamps_compute_type() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = load_catalog(&write(&dir, CATALOG)).unwrap();
        assert_eq!(catalog.durable[0].compute_type, ComputeType::Durable);
        assert_eq!(catalog.ephemeral[0].compute_type, ComputeType::Ephemeral);
        assert_eq!(catalog.interruption_rates.len(), 1);
        assert!(catalog.latency_rates.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_catalog(&dir.path().join("absent.yaml")).is_err());
    }

    #[tokio::test]
    async fn test_reconcile_publishes_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::in_memory();
        let controller =
            CatalogController::new(cache.clone(), write(&dir, CATALOG), Duration::from_secs(60));
        controller.reconcile().await.unwrap();

        let all = cache.get_all_compute_configurations().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].compute_type, ComputeType::Durable);
        assert_eq!(all[1].compute_type, ComputeType::Ephemeral);
        assert_eq!(cache.get_weighted_interuption_rates().await.unwrap().len(), 1);
        assert!(cache.get_weighted_latency_rates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::in_memory();
        let path = write(&dir, CATALOG);
        let controller = CatalogController::new(cache.clone(), path.clone(), Duration::from_secs(60));
        controller.reconcile().await.unwrap();

        std::fs::write(&path, "durable: [oops").unwrap();
        assert!(controller.reconcile().await.is_err());
        assert_eq!(
            cache.get_durable_compute_configurations().await.unwrap().len(),
            1
        );
    }
}
