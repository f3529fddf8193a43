//! Simulated site for the demo binary: a PV/house surplus profile and
//! charge points with synthetic EV sessions, wired to the cluster
//! through the same snapshot/action contract a real deployment uses.

pub mod grid;
pub mod harness;
pub mod report;
pub mod session;

pub use grid::SimulatedGrid;
pub use harness::SimHarness;
pub use report::ClusterReport;
pub use session::SimulatedChargePoint;
