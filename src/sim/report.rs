//! Post-run summary computed from the complete cycle record.

use std::fmt;

use serde::Serialize;

use crate::cluster::CycleResult;

/// Aggregate summary of one simulation run.
///
/// Computed post-hoc from the cycle records so reported numbers always
/// match the telemetry export.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    /// Number of cycles covered.
    pub cycles: usize,
    /// Total energy allocated to the cluster (kWh).
    pub energy_allocated_kwh: f64,
    /// Highest per-cycle total allocation (W).
    pub peak_allocated_w: i32,
    /// Mean per-cycle total allocation (W).
    pub mean_allocated_w: f64,
    /// Cycles in which nothing was allocated.
    pub zero_allocation_cycles: usize,
    /// Per-entry exclusions over the whole run.
    pub excluded_entries: usize,
    /// Allocated power as a share of the available excess, over cycles
    /// with a positive excess (percent).
    pub budget_utilisation_pct: f64,
}

impl ClusterReport {
    /// Computes the report from the complete cycle record.
    pub fn from_results(results: &[CycleResult], cycle_seconds: u64) -> Self {
        if results.is_empty() {
            return Self {
                cycles: 0,
                energy_allocated_kwh: 0.0,
                peak_allocated_w: 0,
                mean_allocated_w: 0.0,
                zero_allocation_cycles: 0,
                excluded_entries: 0,
                budget_utilisation_pct: 0.0,
            };
        }

        let mut allocated_sum = 0_i64;
        let mut peak = 0_i32;
        let mut zero_cycles = 0_usize;
        let mut excluded = 0_usize;
        let mut excess_sum = 0_i64;
        let mut allocated_under_excess = 0_i64;

        for r in results {
            let allocated = r.allocated_power();
            allocated_sum += i64::from(allocated);
            peak = peak.max(allocated);
            if allocated == 0 {
                zero_cycles += 1;
            }
            excluded += r.entries.iter().filter(|e| e.excluded.is_some()).count();
            if r.excess_power > 0 {
                excess_sum += i64::from(r.excess_power);
                allocated_under_excess += i64::from(allocated);
            }
        }

        let n = results.len();
        Self {
            cycles: n,
            energy_allocated_kwh: allocated_sum as f64 * cycle_seconds as f64 / 3_600_000.0,
            peak_allocated_w: peak,
            mean_allocated_w: allocated_sum as f64 / n as f64,
            zero_allocation_cycles: zero_cycles,
            excluded_entries: excluded,
            budget_utilisation_pct: if excess_sum > 0 {
                allocated_under_excess as f64 * 100.0 / excess_sum as f64
            } else {
                0.0
            },
        }
    }
}

impl fmt::Display for ClusterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cluster report ({} cycles)", self.cycles)?;
        writeln!(f, "  energy allocated     {:.3} kWh", self.energy_allocated_kwh)?;
        writeln!(f, "  peak allocation      {} W", self.peak_allocated_w)?;
        writeln!(f, "  mean allocation      {:.1} W", self.mean_allocated_w)?;
        writeln!(f, "  zero-allocation      {} cycles", self.zero_allocation_cycles)?;
        writeln!(f, "  excluded entries     {}", self.excluded_entries)?;
        write!(
            f,
            "  budget utilisation   {:.1} %",
            self.budget_utilisation_pct
        )
    }
}
