use pkg_cache::CacheError;
use pkg_mapper::MapperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] MapperError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("compute configuration catalog is empty")]
    EmptyCatalog,

    #[error("no suitable placement target")]
    NoSuitableTarget,
}

impl ComputeError {
    /// Routine outcome, not a failure: admit the pod unchanged.
    pub fn is_no_target(&self) -> bool {
        matches!(self, ComputeError::NoSuitableTarget)
    }
}
