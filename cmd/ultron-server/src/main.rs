use clap::{Parser, ValueEnum};
use pkg_api::{AppState, ServerConfig, start_server};
use pkg_cache::Cache;
use pkg_cache::remote::{RedisCache, RedisConfig};
use pkg_compute::ComputeService;
use pkg_constants::cache::DEFAULT_REFRESH_INTERVAL_SECS;
use pkg_constants::network::{
    DEFAULT_CERTIFICATE_COMMON_NAME, DEFAULT_CERTIFICATE_DNS_NAMES,
    DEFAULT_CERTIFICATE_IP_ADDRESSES, DEFAULT_CERTIFICATE_ORGANIZATION, DEFAULT_REDIS_DATABASE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_ADDRESS,
};
use pkg_constants::paths::DEFAULT_SERVER_CONFIG;
use pkg_controllers::{CatalogController, NodeSnapshotController};
use pkg_pki::{CertificateRequest, WebhookCA};
use pkg_types::config::{ServerConfigFile, load_config_file};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ultron-server", about = "ultron placement admission webhook")]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, env = "ULTRON_SERVER_CONFIG", default_value = DEFAULT_SERVER_CONFIG)]
    config: String,

    /// Bind address; `:port` listens on every interface
    #[arg(long, env = "ULTRON_SERVER_ADDRESS")]
    address: Option<String>,

    #[arg(long, env = "ULTRON_SERVER_CERTIFICATE_ORGANIZATION")]
    certificate_organization: Option<String>,

    #[arg(long, env = "ULTRON_SERVER_CERTIFICATE_COMMON_NAME")]
    certificate_common_name: Option<String>,

    /// Comma-separated DNS SANs
    #[arg(long, env = "ULTRON_SERVER_CERTIFICATE_DNS_NAMES")]
    certificate_dns_names: Option<String>,

    /// Comma-separated IP SANs
    #[arg(long, env = "ULTRON_SERVER_CERTIFICATE_IP_ADDRESSES")]
    certificate_ip_addresses: Option<String>,

    /// Directory receiving ca.crt, tls.crt and tls.key
    #[arg(long, env = "ULTRON_SERVER_CERTIFICATE_EXPORT_PATH")]
    certificate_export_path: Option<String>,

    /// Redis address; the in-process cache is used when unset
    #[arg(long, env = "ULTRON_SERVER_REDIS_ADDRESS")]
    redis_address: Option<String>,

    #[arg(long, env = "ULTRON_SERVER_REDIS_PASSWORD", hide_env_values = true)]
    redis_password: Option<String>,

    #[arg(long, env = "ULTRON_SERVER_REDIS_DATABASE")]
    redis_database: Option<i64>,

    /// Provider catalog file to publish
    #[arg(long, env = "ULTRON_SERVER_CATALOG_PATH")]
    catalog_path: Option<String>,

    #[arg(long, env = "ULTRON_SERVER_REFRESH_INTERVAL_SECS")]
    refresh_interval_secs: Option<u64>,

    #[arg(long, env = "ULTRON_SERVER_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    /// Do not publish the cluster node snapshot
    #[arg(long, env = "ULTRON_SERVER_DISABLE_NODE_SNAPSHOT")]
    disable_node_snapshot: bool,

    #[arg(long, env = "ULTRON_SERVER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

/// Effective settings after merging CLI, environment, config file and defaults.
#[derive(Debug)]
struct Settings {
    addr: SocketAddr,
    certificate: CertificateRequest,
    certificate_export_path: Option<String>,
    redis: Option<RedisConfig>,
    catalog_path: Option<String>,
    refresh_interval: Duration,
    request_timeout: Duration,
    node_snapshot: bool,
}

impl Settings {
    fn merge(cli: Cli, file: ServerConfigFile) -> anyhow::Result<Self> {
        let address = cli
            .address
            .or(file.address)
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());
        let organization = cli
            .certificate_organization
            .or(file.certificate_organization)
            .unwrap_or_else(|| DEFAULT_CERTIFICATE_ORGANIZATION.to_string());
        let common_name = cli
            .certificate_common_name
            .or(file.certificate_common_name)
            .unwrap_or_else(|| DEFAULT_CERTIFICATE_COMMON_NAME.to_string());
        let dns_names = cli
            .certificate_dns_names
            .or(file.certificate_dns_names)
            .unwrap_or_else(|| DEFAULT_CERTIFICATE_DNS_NAMES.to_string());
        let ip_addresses = cli
            .certificate_ip_addresses
            .or(file.certificate_ip_addresses)
            .unwrap_or_else(|| DEFAULT_CERTIFICATE_IP_ADDRESSES.to_string());

        let redis = cli
            .redis_address
            .or(file.redis_address)
            .filter(|a| !a.is_empty())
            .map(|address| RedisConfig {
                address,
                password: cli.redis_password.or(file.redis_password),
                database: cli
                    .redis_database
                    .or(file.redis_database)
                    .unwrap_or(DEFAULT_REDIS_DATABASE),
            });

        let refresh_interval_secs = cli
            .refresh_interval_secs
            .or(file.refresh_interval_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);
        if refresh_interval_secs == 0 {
            anyhow::bail!("refresh interval must be at least one second");
        }

        Ok(Self {
            addr: parse_address(&address)?,
            certificate: CertificateRequest::from_csv(
                &organization,
                &common_name,
                &dns_names,
                &ip_addresses,
            )?,
            certificate_export_path: cli
                .certificate_export_path
                .or(file.certificate_export_path)
                .filter(|p| !p.is_empty()),
            redis,
            catalog_path: cli.catalog_path.or(file.catalog_path).filter(|p| !p.is_empty()),
            refresh_interval: Duration::from_secs(refresh_interval_secs),
            request_timeout: Duration::from_secs(
                cli.request_timeout_secs
                    .or(file.request_timeout_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            node_snapshot: !cli.disable_node_snapshot,
        })
    }
}

/// Accepts `host:port` or a bare `:port`, which binds every interface.
fn parse_address(address: &str) -> anyhow::Result<SocketAddr> {
    let full = if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    };
    full.parse()
        .map_err(|e| anyhow::anyhow!("invalid server address {}: {}", address, e))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn connect_cache(redis: Option<&RedisConfig>) -> anyhow::Result<Cache> {
    match redis {
        Some(config) => {
            let redis = RedisCache::connect(config).await?;
            Ok(Cache::new(None, Some(redis)))
        }
        None => Ok(Cache::in_memory()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    // Load config file (returns defaults if file not found)
    let file_cfg: ServerConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);

    // Merge: CLI args / env > config file > defaults
    let settings = Settings::merge(cli, file_cfg)?;

    info!("Starting ultron-server");
    info!("  Address:   {}", settings.addr);
    info!("  Cert CN:   {}", settings.certificate.common_name);
    info!(
        "  Cache:     {}",
        settings
            .redis
            .as_ref()
            .map_or("in-process", |r| r.address.as_str())
    );
    info!("  Refresh:   {}s", settings.refresh_interval.as_secs());
    info!("  Timeout:   {}s", settings.request_timeout.as_secs());

    let ca = WebhookCA::new(&settings.certificate.organization)?;
    let bundle = ca.issue_serving_cert(&settings.certificate)?;
    if let Some(dir) = &settings.certificate_export_path {
        bundle.export(Path::new(dir))?;
    }
    let tls = bundle.server_config()?;

    let cache = connect_cache(settings.redis.as_ref()).await?;
    let compute = ComputeService::new(cache.clone());

    if let Some(path) = &settings.catalog_path {
        CatalogController::new(cache.clone(), path, settings.refresh_interval).start();
    }

    if settings.node_snapshot {
        match kube::Client::try_default().await {
            Ok(client) => {
                NodeSnapshotController::new(client, compute.clone(), settings.refresh_interval)
                    .start();
            }
            Err(e) => warn!("Cluster unreachable, node snapshot disabled: {}", e),
        }
    }

    let state = AppState::new(compute, settings.request_timeout);
    let config = ServerConfig {
        addr: settings.addr,
        tls,
    };

    tokio::select! {
        result = start_server(config, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["ultron-server"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address(":8443").unwrap(),
            SocketAddr::from(([0, 0, 0, 0], 8443))
        );
        assert_eq!(
            parse_address("127.0.0.1:9443").unwrap(),
            SocketAddr::from(([127, 0, 0, 1], 9443))
        );
        assert!(parse_address("nowhere").is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let file = ServerConfigFile {
            address: Some(":9000".into()),
            redis_address: Some("redis:6379".into()),
            redis_database: Some(2),
            refresh_interval_secs: Some(30),
            ..Default::default()
        };
        let settings = Settings::merge(cli(&["--address", ":7443"]), file).unwrap();

        assert_eq!(settings.addr.port(), 7443);
        assert_eq!(settings.refresh_interval, Duration::from_secs(30));
        let redis = settings.redis.unwrap();
        assert_eq!(redis.address, "redis:6379");
        assert_eq!(redis.database, 2);
    }

    #[test]
    fn test_defaults_apply() {
        let settings = Settings::merge(cli(&[]), ServerConfigFile::default()).unwrap();
        assert_eq!(settings.addr.port(), 8443);
        assert!(settings.redis.is_none());
        assert!(settings.node_snapshot);
        assert_eq!(settings.certificate.organization, "ultron");
        assert_eq!(settings.certificate.dns_names.len(), 3);
        assert_eq!(
            settings.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_zero_refresh_interval_is_rejected() {
        let file = ServerConfigFile {
            refresh_interval_secs: Some(0),
            ..Default::default()
        };
        assert!(Settings::merge(cli(&[]), file).is_err());
    }
}
