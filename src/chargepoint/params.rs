//! Per-cycle charge-point snapshot (input) and emitted action (output).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ability::{Phase, SetPointAbility, milliamp_to_watts};
use super::hysteresis::Hysteresis;
use super::mode::{ChargeMode, PhaseSwitch, PhaseSwitching};

/// Current limits of the charge point at its present wiring, in milliamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargePointLimit {
    pub phase: Phase,
    pub min_current_ma: i32,
    pub max_current_ma: i32,
}

impl ChargePointLimit {
    /// Minimum chargeable power in Watts at nominal voltage.
    pub fn min_power(&self) -> i32 {
        milliamp_to_watts(self.min_current_ma, self.phase)
    }

    /// Maximum chargeable power in Watts at nominal voltage.
    pub fn max_power(&self) -> i32 {
        milliamp_to_watts(self.max_current_ma, self.phase)
    }
}

/// Capability descriptor advertised by the charge point / vehicle pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityProfile {
    /// The vehicle tolerates a charging interruption (required for any
    /// phase switch).
    Interruptible,
    PhaseSwitchToSingle,
    PhaseSwitchToThree,
}

/// Point-in-time snapshot of one charge point, taken at cycle start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargePointParams {
    pub id: String,
    pub mode: ChargeMode,
    pub is_ready_for_charging: bool,
    pub appears_to_be_fully_charged: bool,
    /// Last measured charge power in Watts, if known.
    pub active_power: Option<i32>,
    pub limit: ChargePointLimit,
    /// Native set-point ability; `None` when the driver cannot currently
    /// report one (the entry is then excluded for the cycle).
    pub ability: Option<SetPointAbility>,
    pub profiles: Vec<CapabilityProfile>,
    pub phase_switching: PhaseSwitching,
    pub hysteresis: Hysteresis,
}

impl ChargePointParams {
    pub fn supports(&self, profile: CapabilityProfile) -> bool {
        self.profiles.contains(&profile)
    }

    /// Whether a switch toward `target` is possible right now.
    pub fn can_switch_to(&self, target: PhaseSwitch) -> bool {
        if !self.supports(CapabilityProfile::Interruptible) {
            return false;
        }
        match target {
            PhaseSwitch::ToSinglePhase => self.supports(CapabilityProfile::PhaseSwitchToSingle),
            PhaseSwitch::ToThreePhase => self.supports(CapabilityProfile::PhaseSwitchToThree),
        }
    }

    /// Validates the snapshot for use in a distribution cycle.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let ability = self.ability.ok_or(ParamsError::UndefinedAbility)?;
        if self.limit.min_current_ma < 0 || self.limit.min_current_ma > self.limit.max_current_ma {
            return Err(ParamsError::InvalidLimit {
                min: self.limit.min_current_ma,
                max: self.limit.max_current_ma,
            });
        }
        if ability.min() < 0 || ability.min() > ability.max() {
            return Err(ParamsError::InvalidAbility {
                min: ability.min(),
                max: ability.max(),
            });
        }
        Ok(())
    }
}

/// Why a snapshot was rejected for the current cycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("set-point ability is undefined")]
    UndefinedAbility,
    #[error("limit range is invalid: min {min} mA, max {max} mA")]
    InvalidLimit { min: i32, max: i32 },
    #[error("ability range is invalid: min {min}, max {max}")]
    InvalidAbility { min: i32, max: i32 },
    #[error("no chargeable interval: min {min} W exceeds max {max} W")]
    EmptyPowerInterval { min: i32, max: i32 },
}

/// The set-point half of an [`Action`], in the device's native unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetPointRequest {
    Ampere(i32),
    MilliAmpere(i32),
    Watt(i32),
    Zero,
}

/// One cycle's command for one charge point. Transient: recomputed and
/// dispatched every cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub charge_point_id: String,
    pub set_point: SetPointRequest,
    /// The allocated power behind `set_point`, in Watts (0 for `Zero`).
    pub set_point_power: i32,
    pub phase_switch: Option<PhaseSwitch>,
}

impl Action {
    /// The zero action: stop charging, no phase switch.
    pub fn zero(charge_point_id: impl Into<String>) -> Self {
        Self {
            charge_point_id: charge_point_id.into(),
            set_point: SetPointRequest::Zero,
            set_point_power: 0,
            phase_switch: None,
        }
    }
}
