use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache miss for key {0}")]
    Miss(String),

    #[error("cache entry {key} is corrupted: {reason}")]
    Corruption { key: String, reason: String },

    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    pub fn corruption(key: &str, reason: impl Into<String>) -> Self {
        CacheError::Corruption {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
