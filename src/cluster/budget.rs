//! Available-budget calculation from grid and storage telemetry.

use serde::Serialize;

/// Immutable per-cycle snapshot of site-level power telemetry, in Watts.
///
/// Sign convention: positive `grid_active_power` is buy-from-grid,
/// negative is surplus flowing toward the grid. `ess_discharge_power` is
/// positive while the storage system discharges.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GridSnapshot {
    pub grid_active_power: i32,
    pub ess_discharge_power: i32,
}

/// Total excess power available for EV charging, always >= 0.
///
/// The cluster's own measured charge power is added back: it is already
/// part of grid import, so without the correction a charging cluster
/// would starve itself of the surplus it is consuming.
pub fn excess_power(sum: GridSnapshot, total_charge_power: i32) -> i32 {
    (total_charge_power - sum.grid_active_power - sum.ess_discharge_power).max(0)
}

/// Excess power clamped to the configured distribution ceiling, if any.
pub fn available_budget(sum: GridSnapshot, total_charge_power: i32, ceiling: Option<i32>) -> i32 {
    let excess = excess_power(sum, total_charge_power);
    match ceiling {
        Some(limit) => excess.min(limit.max(0)),
        None => excess,
    }
}
