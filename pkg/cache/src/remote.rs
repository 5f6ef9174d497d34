use ::redis::aio::ConnectionManager;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::backend::{CacheBackend, CacheValue};
use crate::error::CacheError;

/// Connection settings for the remote backend.
#[derive(Debug, Clone, Default)]
pub struct RedisConfig {
    /// `host:port` or a full `redis://` URL.
    pub address: String,
    pub password: Option<String>,
    pub database: i64,
}

impl RedisConfig {
    /// Connection URL with password and database folded in.
    pub fn url(&self) -> Result<Url, CacheError> {
        let raw = if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("redis://{}", self.address)
        };
        let mut url = Url::parse(&raw)
            .map_err(|e| CacheError::Unavailable(format!("invalid redis address {}: {}", raw, e)))?;

        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password)).map_err(|_| {
                CacheError::Unavailable(format!("redis address {} cannot carry a password", raw))
            })?;
        }
        url.set_path(&format!("/{}", self.database));
        Ok(url)
    }
}

/// Redis-backed cache. Values are bincode-encoded [`CacheValue`]s written
/// with a single `SET` per key, so a replacement is atomic.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let url = config.url()?;
        info!(
            "Connecting to Redis cache at {}:{} (db {})",
            url.host_str().unwrap_or_default(),
            url.port().unwrap_or(6379),
            config.database
        );

        let client = ::redis::Client::open(url.as_str()).map_err(unavailable)?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;
        Ok(Self { conn })
    }
}

fn unavailable(e: ::redis::RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

pub(crate) fn encode(key: &str, value: &CacheValue) -> Result<Vec<u8>, CacheError> {
    bincode::serialize(value).map_err(|e| CacheError::corruption(key, e.to_string()))
}

pub(crate) fn decode(key: &str, data: &[u8]) -> Result<CacheValue, CacheError> {
    bincode::deserialize(data).map_err(|e| CacheError::corruption(key, e.to_string()))
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn put(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let data = encode(key, &value)?;
        let mut cmd = ::redis::cmd("SET");
        cmd.arg(key).arg(data);
        if let Some(ttl) = ttl.filter(|t| !t.is_zero()) {
            cmd.arg("PX").arg(ttl.as_millis() as u64);
        }

        let mut conn = self.conn.clone();
        let _: () = cmd.query_async(&mut conn).await.map_err(unavailable)?;
        debug!(key, kind = value.kind(), entries = value.len(), "published to redis");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Arc<CacheValue>>, CacheError> {
        let mut conn = self.conn.clone();
        let data: Option<Vec<u8>> = ::redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        match data {
            Some(bytes) => Ok(Some(Arc::new(decode(key, &bytes)?))),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::compute::{ComputeConfiguration, ComputeCost, ComputeType};

    #[test]
    fn url_from_host_port() {
        let config = RedisConfig {
            address: "redis.ultron:6379".to_string(),
            password: Some("s3cr3t".to_string()),
            database: 2,
        };
        let url = config.url().unwrap();
        assert_eq!(url.scheme(), "redis");
        assert_eq!(url.host_str(), Some("redis.ultron"));
        assert_eq!(url.port(), Some(6379));
        assert_eq!(url.password(), Some("s3cr3t"));
        assert_eq!(url.path(), "/2");
    }

    #[test]
    fn url_keeps_explicit_scheme_and_skips_empty_password() {
        let config = RedisConfig {
            address: "rediss://cache:6380".to_string(),
            password: Some(String::new()),
            database: 0,
        };
        let url = config.url().unwrap();
        assert_eq!(url.scheme(), "rediss");
        assert_eq!(url.password(), None);
        assert_eq!(url.path(), "/0");
    }

    #[test]
    fn encoded_catalog_decodes_to_same_value() {
        let value = CacheValue::ComputeConfigurations(vec![ComputeConfiguration {
            vcpu: Some(2),
            ram_gb: Some(8),
            volume_gb: Some(50),
            volume_type: Some("SSD".to_string()),
            cloud_network_types: vec!["isolated".to_string()],
            cost: Some(ComputeCost {
                price_per_unit: Some(0.2),
                ..Default::default()
            }),
            compute_type: ComputeType::Ephemeral,
            ..Default::default()
        }]);
        let bytes = encode("k", &value).unwrap();
        assert_eq!(decode("k", &bytes).unwrap(), value);
    }

    #[test]
    fn garbage_bytes_are_corruption() {
        let err = decode("k", &[0xff, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, CacheError::Corruption { .. }));
    }

    #[test]
    fn values_are_binary_and_truncation_is_corruption() {
        let value = CacheValue::LatencyRates(vec![pkg_types::rate::WeightedRate::for_instance_type(
            "ultron.durable",
            0.2,
        )]);
        let bytes = encode("k", &value).unwrap();
        assert_ne!(bytes.first(), Some(&b'{'));
        assert!(matches!(
            decode("k", &bytes[..bytes.len() - 1]),
            Err(CacheError::Corruption { .. })
        ));
    }
}
