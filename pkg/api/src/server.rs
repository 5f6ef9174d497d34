use axum::{
    Router, middleware,
    routing::{get, post},
};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::handlers::{admission, health};
use crate::request_id::request_id_middleware;

/// Server configuration passed from the binary's CLI.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub tls: rustls::ServerConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mutate", post(admission::mutate))
        .route("/validate", post(admission::validate))
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(health::metrics))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Serve the webhook over TLS until the listener fails.
pub async fn start_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let acceptor = TlsAcceptor::from(Arc::new(config.tls));

    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", config.addr, e))?;
    info!("Admission webhook listening on https://{}", config.addr);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let app = app.clone();
        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(s) => s,
                Err(e) => {
                    debug!("TLS handshake with {} failed: {}", peer, e);
                    return;
                }
            };

            let service = hyper::service::service_fn(move |req: hyper::Request<Incoming>| {
                app.clone().oneshot(req)
            });
            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!("Connection from {} closed with error: {}", peer, e);
            }
        });
    }
}
