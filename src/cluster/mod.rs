//! The cluster controller: budget calculation, power distribution, ramp
//! limiting, and the per-cycle orchestrator.

pub mod budget;
pub mod distribution;
pub mod history;
pub mod orchestrator;
pub mod ramp;

pub use budget::{GridSnapshot, available_budget, excess_power};
pub use distribution::{DistributionStrategy, Entry, PowerDistribution};
pub use history::{History, HistoryEntry};
pub use orchestrator::{Cluster, ClusterConfig, CyclePhase, CycleResult, EntryResult, LogVerbosity};
pub use ramp::RampLimiter;
