//! Shared power-budget allocation for clustered EV charge points.
//!
//! Every control cycle the cluster reads live grid and storage power,
//! derives the power available for charging, splits it across charge
//! points with heterogeneous abilities, and emits one device-native
//! set-point action per charge point.

#[cfg(feature = "api")]
pub mod api;
pub mod chargepoint;
pub mod clock;
pub mod cluster;
pub mod config;
/// Simulated site (grid surplus profile, charge points) used by the demo binary.
pub mod sim;
pub mod telemetry;
