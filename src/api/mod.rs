//! REST API for run results and telemetry.
//!
//! Provides two GET endpoints:
//! - `/state` — cluster configuration, summary report, and latest cycle
//! - `/telemetry` — full cycle records with optional range filtering

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::cluster::{ClusterConfig, CycleResult};
use crate::sim::ClusterReport;

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; no
/// locks needed since all data is read-only.
pub struct AppState {
    /// Cluster configuration used for this run.
    pub cluster: ClusterConfig,
    /// Aggregate summary report.
    pub report: ClusterReport,
    /// Per-cycle results.
    pub results: Vec<CycleResult>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
