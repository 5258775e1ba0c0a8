//! HTTP server for the Prometheus metrics endpoint
//!
//! # Example
//!
//! ```ignore
//! use kubewatch_gateway::metrics_server::MetricsServer;
//!
//! let metrics_handle = MetricsServer::start("0.0.0.0:9090".parse()?);
//!
//! // Later, to shutdown
//! metrics_handle.abort();
//! ```

use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Metrics HTTP server
pub struct MetricsServer;

impl MetricsServer {
    /// Start the metrics server on the given address
    ///
    /// The server runs until the returned handle is aborted or the process exits.
    pub fn start(addr: SocketAddr) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(%addr, "Metrics server starting");

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    error!(error = %e, %addr, "Failed to bind metrics server");
                    return;
                }
            };

            if let Err(e) = axum::serve(listener, router()).await {
                error!(error = %e, "Metrics server error");
            }
        })
    }
}

fn router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
}

async fn metrics_handler() -> impl IntoResponse {
    let body = crate::metrics::gather();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
