use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pkg_compute::ComputeError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid admission request: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error("placement did not finish within {}s", .0.as_secs_f64())]
    DeadlineExceeded(Duration),

    #[error("failed to build admission response: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Compute(ComputeError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Compute(_) | ApiError::DeadlineExceeded(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_cache::CacheError;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(
            ApiError::InvalidInput("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Compute(ComputeError::Cache(CacheError::Miss("K".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Compute(ComputeError::EmptyCatalog).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::DeadlineExceeded(Duration::from_secs(10)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
