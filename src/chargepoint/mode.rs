//! Charging modes, phase-switch policies, and mode resolution.
//!
//! Resolution maps a charge point's configured mode plus its readiness,
//! full-charge and hysteresis state onto the power interval it is
//! entitled to this cycle. Dispatch is by plain `match` on the closed
//! enums rather than behavior attached to the variants.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ability::Phase;
use super::hysteresis::Hysteresis;

/// Configured (and resolved) behavioral mode of one charge point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeMode {
    /// Always request the device maximum.
    Force,
    /// Hold the device minimum.
    Minimum,
    /// Eligible for fair-share distribution of surplus power.
    Surplus,
    /// No charging this cycle.
    Zero,
}

impl ChargeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ChargeMode::Force => "force",
            ChargeMode::Minimum => "minimum",
            ChargeMode::Surplus => "surplus",
            ChargeMode::Zero => "zero",
        }
    }
}

impl fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-charge-point phase-switching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseSwitching {
    /// Never emit a switch action.
    Disable,
    /// Switch up to three-phase in FORCE mode, down to single-phase in
    /// MINIMUM mode.
    Automatic,
    ForceSinglePhase,
    ForceThreePhase,
}

/// A phase-switch command emitted toward the device driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseSwitch {
    ToSinglePhase,
    ToThreePhase,
}

/// Outcome of mode resolution: the actual mode and the Watt interval the
/// charge point is entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMode {
    pub mode: ChargeMode,
    /// Whether the entry takes part in budget distribution. Non-active
    /// entries (not ready, or vehicle appears fully charged) get a fixed
    /// allocation instead.
    pub active: bool,
    pub min_power: i32,
    pub max_power: i32,
}

/// Resolves the configured mode against readiness and vehicle state.
///
/// `min_power`/`max_power` are the charge point's limit expressed in
/// Watts. A not-ready charge point is entitled to nothing. A ready but
/// fully-charged vehicle is held at the minimum (keeps on-board systems
/// such as pre-heating powered) unless its mode is ZERO or hysteresis
/// demands it stay at zero.
pub fn resolve(
    mode: ChargeMode,
    is_ready_for_charging: bool,
    appears_to_be_fully_charged: bool,
    hysteresis: Hysteresis,
    min_power: i32,
    max_power: i32,
) -> ResolvedMode {
    if !is_ready_for_charging {
        return ResolvedMode {
            mode,
            active: false,
            min_power: 0,
            max_power: 0,
        };
    }
    if appears_to_be_fully_charged {
        let held = match mode {
            ChargeMode::Zero => 0,
            ChargeMode::Force | ChargeMode::Minimum | ChargeMode::Surplus => {
                if hysteresis == Hysteresis::KeepZero {
                    0
                } else {
                    min_power
                }
            }
        };
        return ResolvedMode {
            mode,
            active: false,
            min_power: held,
            max_power: held,
        };
    }
    let (min_power, max_power) = match mode {
        ChargeMode::Force => (max_power, max_power),
        ChargeMode::Minimum => (min_power, min_power),
        ChargeMode::Surplus => (min_power, max_power),
        ChargeMode::Zero => (0, 0),
    };
    ResolvedMode {
        mode,
        active: true,
        min_power,
        max_power,
    }
}

/// Decides the phase-switch action for one charge point.
///
/// `can_to_single`/`can_to_three` must already combine charge-point and
/// vehicle capability; a device that cannot switch never receives a
/// switch action, whatever the policy asks for.
pub fn phase_switch_action(
    policy: PhaseSwitching,
    mode: ChargeMode,
    wiring: Phase,
    can_to_single: bool,
    can_to_three: bool,
) -> Option<PhaseSwitch> {
    match policy {
        PhaseSwitching::Disable => None,
        PhaseSwitching::Automatic => match (mode, wiring) {
            (ChargeMode::Force, Phase::Single) if can_to_three => Some(PhaseSwitch::ToThreePhase),
            (ChargeMode::Minimum, Phase::Three) if can_to_single => {
                Some(PhaseSwitch::ToSinglePhase)
            }
            _ => None,
        },
        PhaseSwitching::ForceSinglePhase => match wiring {
            Phase::Three if can_to_single => Some(PhaseSwitch::ToSinglePhase),
            _ => None,
        },
        PhaseSwitching::ForceThreePhase => match wiring {
            Phase::Single if can_to_three => Some(PhaseSwitch::ToThreePhase),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_collapses_to_max() {
        let r = resolve(ChargeMode::Force, true, false, Hysteresis::Inactive, 4140, 11040);
        assert!(r.active);
        assert_eq!((r.min_power, r.max_power), (11040, 11040));
    }

    #[test]
    fn minimum_collapses_to_min() {
        let r = resolve(ChargeMode::Minimum, true, false, Hysteresis::Inactive, 4140, 11040);
        assert_eq!((r.min_power, r.max_power), (4140, 4140));
    }

    #[test]
    fn surplus_spans_full_interval() {
        let r = resolve(ChargeMode::Surplus, true, false, Hysteresis::Inactive, 4140, 11040);
        assert_eq!((r.min_power, r.max_power), (4140, 11040));
    }

    #[test]
    fn zero_stays_zero() {
        let r = resolve(ChargeMode::Zero, true, false, Hysteresis::Inactive, 4140, 11040);
        assert_eq!((r.min_power, r.max_power), (0, 0));
    }

    #[test]
    fn not_ready_overrides_force() {
        let r = resolve(ChargeMode::Force, false, false, Hysteresis::Inactive, 4140, 11040);
        assert!(!r.active);
        assert_eq!((r.min_power, r.max_power), (0, 0));
    }

    #[test]
    fn fully_charged_is_held_at_minimum() {
        for mode in [ChargeMode::Force, ChargeMode::Minimum, ChargeMode::Surplus] {
            let r = resolve(mode, true, true, Hysteresis::Inactive, 4140, 11040);
            assert!(!r.active);
            assert_eq!((r.min_power, r.max_power), (4140, 4140));
        }
    }

    #[test]
    fn fully_charged_with_keep_zero_stays_at_zero() {
        let r = resolve(ChargeMode::Surplus, true, true, Hysteresis::KeepZero, 4140, 11040);
        assert!(!r.active);
        assert_eq!((r.min_power, r.max_power), (0, 0));
    }

    #[test]
    fn switch_only_when_wiring_differs_from_target() {
        assert_eq!(
            phase_switch_action(
                PhaseSwitching::ForceThreePhase,
                ChargeMode::Surplus,
                Phase::Single,
                true,
                true
            ),
            Some(PhaseSwitch::ToThreePhase)
        );
        assert_eq!(
            phase_switch_action(
                PhaseSwitching::ForceThreePhase,
                ChargeMode::Surplus,
                Phase::Three,
                true,
                true
            ),
            None
        );
    }

    #[test]
    fn incapable_device_never_switches() {
        assert_eq!(
            phase_switch_action(
                PhaseSwitching::ForceSinglePhase,
                ChargeMode::Surplus,
                Phase::Three,
                false,
                false
            ),
            None
        );
    }

    #[test]
    fn automatic_switches_up_in_force_and_down_in_minimum() {
        assert_eq!(
            phase_switch_action(
                PhaseSwitching::Automatic,
                ChargeMode::Force,
                Phase::Single,
                true,
                true
            ),
            Some(PhaseSwitch::ToThreePhase)
        );
        assert_eq!(
            phase_switch_action(
                PhaseSwitching::Automatic,
                ChargeMode::Minimum,
                Phase::Three,
                true,
                true
            ),
            Some(PhaseSwitch::ToSinglePhase)
        );
        assert_eq!(
            phase_switch_action(
                PhaseSwitching::Automatic,
                ChargeMode::Surplus,
                Phase::Single,
                true,
                true
            ),
            None
        );
    }
}
