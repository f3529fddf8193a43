//! Charge-point data model: abilities, limits, modes, and per-cycle snapshots.

pub mod ability;
pub mod hysteresis;
pub mod mode;
pub mod params;

pub use ability::{NOMINAL_PHASE_VOLTAGE, Phase, SetPointAbility, milliamp_to_watts};
pub use hysteresis::{Hysteresis, HysteresisTracker};
pub use mode::{ChargeMode, PhaseSwitch, PhaseSwitching, ResolvedMode};
pub use params::{
    Action, CapabilityProfile, ChargePointLimit, ChargePointParams, ParamsError, SetPointRequest,
};
