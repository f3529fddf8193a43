//! Shared test fixtures for integration tests.

use evse_cluster::chargepoint::{
    CapabilityProfile, ChargeMode, ChargePointLimit, ChargePointParams, Hysteresis, Phase,
    PhaseSwitching, SetPointAbility,
};
use evse_cluster::cluster::{Cluster, ClusterConfig, GridSnapshot, LogVerbosity};

/// A ready three-phase charge point with the common 6–16 A milliampere
/// ability (4140–11040 W).
pub fn three_phase_params(id: &str, mode: ChargeMode) -> ChargePointParams {
    ChargePointParams {
        id: id.to_string(),
        mode,
        is_ready_for_charging: true,
        appears_to_be_fully_charged: false,
        active_power: Some(0),
        limit: ChargePointLimit {
            phase: Phase::Three,
            min_current_ma: 6000,
            max_current_ma: 16000,
        },
        ability: Some(SetPointAbility::MilliAmpere {
            phase: Phase::Three,
            min: 6000,
            max: 16000,
        }),
        profiles: vec![CapabilityProfile::Interruptible],
        phase_switching: PhaseSwitching::Disable,
        hysteresis: Hysteresis::Inactive,
    }
}

/// Grid snapshot exporting exactly `budget` Watts of surplus (no storage
/// discharge, no cluster consumption yet).
pub fn surplus_grid(budget: i32) -> GridSnapshot {
    GridSnapshot {
        grid_active_power: -budget,
        ess_discharge_power: 0,
    }
}

/// Default cluster under test: equal-power strategy, 500 W/s ramp,
/// quiet logging.
pub fn cluster() -> Cluster {
    Cluster::new(ClusterConfig {
        log_verbosity: LogVerbosity::None,
        ..ClusterConfig::default()
    })
}
