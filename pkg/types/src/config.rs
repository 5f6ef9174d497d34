use serde::{Deserialize, Serialize};

use crate::compute::ComputeConfiguration;
use crate::rate::{WeightedInteruptionRate, WeightedLatencyRate};

/// Server configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// address: ":8443"
/// certificate-organization: ultron
/// certificate-common-name: ultron-service.default.svc
/// certificate-dns-names: ultron-service,ultron-service.default.svc
/// certificate-ip-addresses: 127.0.0.1
/// certificate-export-path: /etc/ultron/tls
/// redis-address: redis.ultron:6379
/// redis-database: 0
/// catalog-path: /etc/ultron/catalog.yaml
/// refresh-interval-secs: 60
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfigFile {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "certificate-organization")]
    pub certificate_organization: Option<String>,
    #[serde(default, alias = "certificate-common-name")]
    pub certificate_common_name: Option<String>,
    #[serde(default, alias = "certificate-dns-names")]
    pub certificate_dns_names: Option<String>,
    #[serde(default, alias = "certificate-ip-addresses")]
    pub certificate_ip_addresses: Option<String>,
    #[serde(default, alias = "certificate-export-path")]
    pub certificate_export_path: Option<String>,
    #[serde(default, alias = "redis-address")]
    pub redis_address: Option<String>,
    #[serde(default, alias = "redis-password")]
    pub redis_password: Option<String>,
    #[serde(default, alias = "redis-database")]
    pub redis_database: Option<i64>,
    #[serde(default, alias = "catalog-path")]
    pub catalog_path: Option<String>,
    #[serde(default, alias = "refresh-interval-secs")]
    pub refresh_interval_secs: Option<u64>,
    #[serde(default, alias = "request-timeout-secs")]
    pub request_timeout_secs: Option<u64>,
}

/// Provider catalog snapshot as written by the catalog exporter.
///
/// Example `catalog.yaml`:
/// ```yaml
/// durable:
///   - vCpu: 2
///     ramGb: 8
///     volumeGb: 50
///     volumeType: SSD
///     cloudNetworkTypes: [isolated]
///     cost: { pricePerUnit: 0.2 }
/// ephemeral: []
/// interruption_rates:
///   - selector: { node.kubernetes.io/instance-type: ultron.ephemeral }
///     value: 0.1
/// latency_rates: []
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub durable: Vec<ComputeConfiguration>,
    #[serde(default, alias = "spot")]
    pub ephemeral: Vec<ComputeConfiguration>,
    #[serde(default, alias = "interruption-rates")]
    pub interruption_rates: Vec<WeightedInteruptionRate>,
    #[serde(default, alias = "latency-rates")]
    pub latency_rates: Vec<WeightedLatencyRate>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg: ServerConfigFile = load_config_file("/nonexistent/ultron.yaml").unwrap();
        assert!(cfg.address.is_none());
        assert!(cfg.redis_address.is_none());
    }

    #[test]
    fn reads_kebab_case_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "address: \":9443\"\nredis-address: redis:6379\nredis-database: 2").unwrap();

        let cfg: ServerConfigFile = load_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.address.as_deref(), Some(":9443"));
        assert_eq!(cfg.redis_address.as_deref(), Some("redis:6379"));
        assert_eq!(cfg.redis_database, Some(2));
    }

    #[test]
    fn parses_catalog_file() {
        let yaml = r#"
durable:
  - vCpu: 2
    ramGb: 8
    volumeGb: 50
    volumeType: SSD
    cloudNetworkTypes: [isolated]
    cost: { pricePerUnit: 0.2 }
spot: []
interruption_rates:
  - selector: { node.kubernetes.io/instance-type: ultron.ephemeral }
    value: 0.1
"#;
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(catalog.durable.len(), 1);
        assert!(catalog.ephemeral.is_empty());
        assert_eq!(
            catalog.interruption_rates[0].instance_type(),
            Some("ultron.ephemeral")
        );
        assert!(catalog.latency_rates.is_empty());
    }
}
