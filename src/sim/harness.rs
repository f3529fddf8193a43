//! Cycle loop wiring the simulated site to the cluster controller.

use std::time::Duration;

use tracing::info;

use crate::clock::{Clock, SimClock};
use crate::cluster::{Cluster, CycleResult};
use crate::config::ScenarioConfig;

use super::grid::SimulatedGrid;
use super::session::SimulatedChargePoint;

/// Seed offset for the grid RNG to avoid correlation with charge points.
const GRID_SEED_OFFSET: u64 = 17;

/// Owns the cluster, the simulated site, and the simulated clock; runs
/// the configured number of control cycles.
#[derive(Debug)]
pub struct SimHarness {
    cluster: Cluster,
    grid: SimulatedGrid,
    charge_points: Vec<SimulatedChargePoint>,
    clock: SimClock,
    cycle_step: Duration,
    cycles: u64,
}

impl SimHarness {
    /// Builds the harness from a validated scenario.
    pub fn from_config(config: &ScenarioConfig) -> Self {
        let seed = config.simulation.seed;
        let charge_points = config
            .member_charge_points()
            .into_iter()
            .enumerate()
            .map(|(i, section)| {
                SimulatedChargePoint::new(
                    section.clone(),
                    &config.hysteresis,
                    seed.wrapping_add(i as u64),
                )
            })
            .collect();
        Self {
            cluster: Cluster::new(config.cluster_config()),
            grid: SimulatedGrid::new(config.grid.clone(), seed.wrapping_add(GRID_SEED_OFFSET)),
            charge_points,
            clock: SimClock::new(),
            cycle_step: Duration::from_secs(config.simulation.cycle_seconds),
            cycles: config.simulation.cycles,
        }
    }

    /// Executes one control cycle and advances the simulated site.
    pub fn step(&mut self, cycle: u64) -> CycleResult {
        let now = self.clock.now();

        // 1. Snapshot site telemetry and charge-point params
        let total_charge_power: i32 = self.charge_points.iter().map(|cp| cp.measured_power()).sum();
        let sum = self.grid.snapshot(cycle, total_charge_power);
        let params = self
            .charge_points
            .iter()
            .map(|cp| cp.params(cycle))
            .collect();

        // 2. Run the cluster
        let result = self.cluster.run_cycle(now, sum, params);

        // 3. Dispatch actions and advance the vehicles
        for action in &result.actions {
            if let Some(cp) = self
                .charge_points
                .iter_mut()
                .find(|cp| cp.id() == action.charge_point_id)
            {
                cp.apply(action);
            }
        }
        for cp in self.charge_points.iter_mut() {
            cp.tick(cycle, now, self.cycle_step);
        }
        self.clock.advance(self.cycle_step);

        result
    }

    /// Runs all configured cycles and returns the complete record.
    pub fn run(&mut self) -> Vec<CycleResult> {
        info!(
            cycles = self.cycles,
            charge_points = self.charge_points.len(),
            "starting cluster simulation"
        );
        let mut results = Vec::with_capacity(self.cycles as usize);
        for cycle in 0..self.cycles {
            results.push(self.step(cycle));
        }
        results
    }

    /// Energy delivered per charge point so far, in watt-hours.
    pub fn delivered_wh(&self) -> Vec<(String, i64)> {
        self.charge_points
            .iter()
            .map(|cp| (cp.id().to_string(), cp.delivered_wh()))
            .collect()
    }
}
