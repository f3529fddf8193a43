//! The per-cycle orchestrator.
//!
//! Runs to completion synchronously once per control cycle: snapshot in,
//! one `Action` per charge point out. A malformed snapshot never aborts
//! the cycle; the entry is excluded and commanded to zero.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::chargepoint::mode::phase_switch_action;
use crate::chargepoint::{Action, ChargeMode, ChargePointParams, PhaseSwitch, SetPointAbility, SetPointRequest};

use super::budget::{self, GridSnapshot};
use super::distribution::{DistributionStrategy, Entry, PowerDistribution};
use super::history::History;
use super::ramp::RampLimiter;

/// How chatty the per-cycle logging is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogVerbosity {
    None,
    /// One summary line per cycle.
    DebugLog,
    /// Summary line plus one line per charge point.
    Trace,
}

/// Cluster-level configuration, applied at construction.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterConfig {
    pub strategy: DistributionStrategy,
    /// Upper bound on the distributable budget in Watts, if configured.
    pub power_ceiling: Option<i32>,
    /// Maximum set-point change in Watts per second.
    pub ramp_rate_w_per_s: i32,
    /// Retention window for per-charge-point history.
    pub history_retention: Duration,
    pub log_verbosity: LogVerbosity,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            strategy: DistributionStrategy::EqualPower,
            power_ceiling: None,
            ramp_rate_w_per_s: 500,
            history_retention: Duration::from_secs(300),
            log_verbosity: LogVerbosity::DebugLog,
        }
    }
}

/// Phase of the cycle state machine, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Collecting,
    ResolvingModes,
    CalculatingBudget,
    Distributing,
    Translating,
    RampLimiting,
    Emitting,
}

/// Per-charge-point outcome of one cycle, for telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResult {
    pub charge_point_id: String,
    pub mode: ChargeMode,
    pub active: bool,
    /// Final post-ramp allocation in Watts.
    pub allocated_power: i32,
    /// Last measured charge power in Watts (0 when unknown).
    pub measured_power: i32,
    /// Set when the entry was excluded for the cycle.
    pub excluded: Option<String>,
}

/// Everything one cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct CycleResult {
    pub cycle: u64,
    pub grid_active_power: i32,
    pub ess_discharge_power: i32,
    /// Sum of measured charge power over all charge points.
    pub total_charge_power: i32,
    /// Budget before subtracting FORCE/MINIMUM commitments.
    pub excess_power: i32,
    /// Budget offered to SURPLUS entries.
    pub distributable_power: i32,
    pub actions: Vec<Action>,
    pub entries: Vec<EntryResult>,
}

impl CycleResult {
    /// Sum of allocated power over all entries, in Watts.
    pub fn allocated_power(&self) -> i32 {
        self.entries.iter().map(|e| e.allocated_power).sum()
    }
}

impl fmt::Display for CycleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle={:>4} | grid={:>6} W  ess={:>5} W  charge={:>6} W | \
             excess={:>6} W  distributable={:>6} W | allocated={:>6} W to {} charge points",
            self.cycle,
            self.grid_active_power,
            self.ess_discharge_power,
            self.total_charge_power,
            self.excess_power,
            self.distributable_power,
            self.allocated_power(),
            self.entries.len(),
        )
    }
}

/// Per-charge-point state that outlives the cycle.
#[derive(Debug)]
struct ChargePointState {
    history: History,
}

/// The cluster controller. One instance per configured cluster; state
/// persists across cycles, everything else is recomputed per cycle.
#[derive(Debug)]
pub struct Cluster {
    config: ClusterConfig,
    ramp: RampLimiter,
    state: HashMap<String, ChargePointState>,
    phase: CyclePhase,
    cycle: u64,
}

impl Cluster {
    pub fn new(config: ClusterConfig) -> Self {
        let ramp = RampLimiter::new(config.ramp_rate_w_per_s);
        Self {
            config,
            ramp,
            state: HashMap::new(),
            phase: CyclePhase::Idle,
            cycle: 0,
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Current state-machine phase (`Idle` between cycles).
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    fn advance(&mut self, phase: CyclePhase) {
        self.phase = phase;
        if self.config.log_verbosity == LogVerbosity::Trace {
            trace!(cycle = self.cycle, ?phase, "cycle phase");
        }
    }

    /// Runs one full control cycle over the given snapshots.
    ///
    /// `now` is the monotonic timestamp taken at cycle start; it stamps
    /// history entries and drives ramp limiting. The call is synchronous
    /// and never blocks; the caller guarantees cycles do not overlap.
    pub fn run_cycle(
        &mut self,
        now: Instant,
        sum: GridSnapshot,
        params: Vec<ChargePointParams>,
    ) -> CycleResult {
        self.advance(CyclePhase::Collecting);
        let present: Vec<String> = params.iter().map(|p| p.id.clone()).collect();
        self.state.retain(|id, _| present.iter().any(|p| p == id));
        let (mut dist, rejected) = PowerDistribution::new(params);
        for (id, err) in &rejected {
            warn!(charge_point = %id, error = %err, "excluding charge point for this cycle");
        }

        self.advance(CyclePhase::ResolvingModes);
        dist.initialize_set_points();

        self.advance(CyclePhase::CalculatingBudget);
        let excess =
            budget::available_budget(sum, dist.total_active_power, self.config.power_ceiling);
        let committed = dist.committed_power();
        let distributable = (excess - committed).max(0);

        self.advance(CyclePhase::Distributing);
        let remaining = dist.distribute_surplus_min_power(distributable);
        dist.distribute_surplus_remaining(self.config.strategy, remaining.max(0));

        self.advance(CyclePhase::Translating);
        dist.round_to_set_point_steps();
        dist.permit_non_actives();
        let switches: Vec<Option<PhaseSwitch>> =
            dist.entries.iter().map(|e| self.phase_switch(e)).collect();

        self.advance(CyclePhase::RampLimiting);
        let ramp = self.ramp;
        for e in dist.entries.iter_mut() {
            // FORCE cycles bypass the ramp; the applied value is still
            // recorded (flagged) so later cycles ramp from it.
            if !e.is_active() || e.resolved.mode == ChargeMode::Force {
                continue;
            }
            let min_power = e.ability.min_power();
            let history = self.history_mut(&e.params.id);
            e.set_point = ramp.limit(history, now, e.set_point, min_power);
        }

        self.advance(CyclePhase::Emitting);
        let mut actions = Vec::with_capacity(dist.entries.len() + rejected.len());
        let mut entries = Vec::with_capacity(dist.entries.len() + rejected.len());
        for (e, phase_switch) in dist.entries.iter().zip(switches) {
            let (set_point, applied) = translate(e);
            let forced = e.is_active() && e.resolved.mode == ChargeMode::Force;
            self.history_mut(&e.params.id).record(now, applied, forced);
            if self.config.log_verbosity == LogVerbosity::Trace {
                trace!(
                    charge_point = %e.params.id,
                    mode = %e.resolved.mode,
                    set_point_w = e.set_point,
                    applied_w = applied,
                    ?set_point,
                    "emit"
                );
            }
            entries.push(EntryResult {
                charge_point_id: e.params.id.clone(),
                mode: e.resolved.mode,
                active: e.is_active(),
                allocated_power: applied,
                measured_power: e.params.active_power.unwrap_or(0),
                excluded: None,
            });
            actions.push(Action {
                charge_point_id: e.params.id.clone(),
                set_point,
                set_point_power: applied,
                phase_switch,
            });
        }
        for (id, err) in rejected {
            self.history_mut(&id).record(now, 0, false);
            entries.push(EntryResult {
                charge_point_id: id.clone(),
                mode: ChargeMode::Zero,
                active: false,
                allocated_power: 0,
                measured_power: 0,
                excluded: Some(err.to_string()),
            });
            actions.push(Action::zero(id));
        }

        let result = CycleResult {
            cycle: self.cycle,
            grid_active_power: sum.grid_active_power,
            ess_discharge_power: sum.ess_discharge_power,
            total_charge_power: dist.total_active_power,
            excess_power: excess,
            distributable_power: distributable,
            actions,
            entries,
        };
        if self.config.log_verbosity != LogVerbosity::None {
            debug!(cycle = self.cycle, "{result}");
        }
        self.cycle += 1;
        self.advance(CyclePhase::Idle);
        result
    }

    fn phase_switch(&self, e: &Entry) -> Option<PhaseSwitch> {
        let params = &e.params;
        phase_switch_action(
            params.phase_switching,
            e.resolved.mode,
            params.limit.phase,
            params.can_switch_to(PhaseSwitch::ToSinglePhase),
            params.can_switch_to(PhaseSwitch::ToThreePhase),
        )
    }

    fn history_mut(&mut self, id: &str) -> &mut History {
        let retention = self.config.history_retention;
        &mut self
            .state
            .entry(id.to_string())
            .or_insert_with(|| ChargePointState {
                history: History::new(retention),
            })
            .history
    }
}

/// Converts a final Watt allocation into the device's native unit.
///
/// Allocations below the device minimum become `Zero` (an EVSE cannot
/// charge below its minimum current); everything else is floored into
/// the native unit and clamped into the ability range.
fn translate(e: &Entry) -> (SetPointRequest, i32) {
    let ability = e.ability;
    if e.set_point <= 0 || e.set_point < ability.min_power() {
        return (SetPointRequest::Zero, 0);
    }
    let watts = e.set_point.min(ability.max_power());
    let value = ability.fit_within(ability.from_power(watts));
    let applied = ability.to_power(value);
    let request = match ability {
        SetPointAbility::Ampere { .. } => SetPointRequest::Ampere(value),
        SetPointAbility::MilliAmpere { .. } => SetPointRequest::MilliAmpere(value),
        SetPointAbility::Watt { .. } => SetPointRequest::Watt(value),
    };
    (request, applied)
}
