//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterConfig, CycleResult};
use crate::sim::ClusterReport;

/// Combined state response: configuration, report, and latest cycle.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Cluster configuration used for the run.
    pub cluster: ClusterConfig,
    /// Aggregate summary report.
    pub report: ClusterReport,
    /// Most recent cycle record, if any cycles ran.
    pub latest_cycle: Option<CycleResult>,
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start cycle (inclusive).
    pub from: Option<u64>,
    /// End cycle (inclusive).
    pub to: Option<u64>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
