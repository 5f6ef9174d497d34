pub mod error;
pub mod handlers;
pub mod request_id;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use pkg_compute::ComputeService;
use pkg_metrics::AdmissionMetrics;

pub use error::ApiError;
pub use server::{ServerConfig, router, start_server};

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub compute: ComputeService,
    pub metrics: Arc<AdmissionMetrics>,
    /// Deadline applied to each placement decision.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(compute: ComputeService, request_timeout: Duration) -> Self {
        Self {
            compute,
            metrics: Arc::new(AdmissionMetrics::new()),
            request_timeout,
        }
    }
}
