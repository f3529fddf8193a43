//! Set-point abilities and unit conversion between Watts and device units.
//!
//! A charge point accepts set-points in exactly one native unit (ampere,
//! milliampere or watt) at a fixed phase count. The cluster reasons in
//! Watts and converts at the edges. Watts-to-unit conversion floors so a
//! translated set-point never draws more than the watt budget it was
//! derived from; unit-to-Watts conversion rounds up so the accounted
//! cost of a current never understates the real draw. Together the two
//! give `to_power(from_power(w)) <= w` for every integer `w`, with the
//! result a fixed point of the round trip.

use serde::{Deserialize, Serialize};

/// Nominal phase-to-neutral voltage in Volts.
pub const NOMINAL_PHASE_VOLTAGE: i32 = 230;

/// Ceiling division for `i64`, equivalent to the unstable
/// `i64::div_ceil` (feature `int_roundings`).
fn div_ceil_i64(a: i64, b: i64) -> i64 {
    let d = a / b;
    let r = a % b;
    if r != 0 && ((r < 0) == (b < 0)) { d + 1 } else { d }
}

/// Wiring of a charge point: single- or three-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Single,
    Three,
}

impl Phase {
    /// Number of active phases (1 or 3).
    pub fn count(self) -> i32 {
        match self {
            Phase::Single => 1,
            Phase::Three => 3,
        }
    }
}

/// Converts a current in milliamps to power in Watts at nominal voltage.
///
/// Rounds up, so a power interval derived from a device's current limits
/// never understates the device minimum (6000 mA three-phase is exactly
/// 4140 W).
pub fn milliamp_to_watts(milliamps: i32, phase: Phase) -> i32 {
    let milliwatts =
        i64::from(milliamps) * i64::from(NOMINAL_PHASE_VOLTAGE) * i64::from(phase.count());
    div_ceil_i64(milliwatts, 1000) as i32
}

/// The native set-point unit and range a charge point accepts.
///
/// `min` and `max` are in the variant's own unit (A, mA or W). The phase
/// count is carried per ability because a device's wiring can differ from
/// the limit used for distribution; conversions always use the ability's
/// own phase count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum SetPointAbility {
    Ampere { phase: Phase, min: i32, max: i32 },
    MilliAmpere { phase: Phase, min: i32, max: i32 },
    Watt { phase: Phase, min: i32, max: i32 },
}

impl SetPointAbility {
    /// Phase count this ability converts with.
    pub fn phase(&self) -> Phase {
        match *self {
            SetPointAbility::Ampere { phase, .. }
            | SetPointAbility::MilliAmpere { phase, .. }
            | SetPointAbility::Watt { phase, .. } => phase,
        }
    }

    /// Minimum accepted set-point in the native unit.
    pub fn min(&self) -> i32 {
        match *self {
            SetPointAbility::Ampere { min, .. }
            | SetPointAbility::MilliAmpere { min, .. }
            | SetPointAbility::Watt { min, .. } => min,
        }
    }

    /// Maximum accepted set-point in the native unit.
    pub fn max(&self) -> i32 {
        match *self {
            SetPointAbility::Ampere { max, .. }
            | SetPointAbility::MilliAmpere { max, .. }
            | SetPointAbility::Watt { max, .. } => max,
        }
    }

    /// Converts a native-unit value to power in Watts. Rounds up, so the
    /// accounted cost of a current never understates the real draw.
    pub fn to_power(&self, value: i32) -> i32 {
        let volts = i64::from(NOMINAL_PHASE_VOLTAGE) * i64::from(self.phase().count());
        match self {
            SetPointAbility::Ampere { .. } => (i64::from(value) * volts) as i32,
            SetPointAbility::MilliAmpere { .. } => {
                div_ceil_i64(i64::from(value) * volts, 1000) as i32
            }
            SetPointAbility::Watt { .. } => value,
        }
    }

    /// Converts power in Watts to the native unit. Floors, so the
    /// resulting set-point never draws more than `watts`.
    pub fn from_power(&self, watts: i32) -> i32 {
        let volts = i64::from(NOMINAL_PHASE_VOLTAGE) * i64::from(self.phase().count());
        match self {
            SetPointAbility::Ampere { .. } => (i64::from(watts) / volts) as i32,
            SetPointAbility::MilliAmpere { .. } => (i64::from(watts) * 1000 / volts) as i32,
            SetPointAbility::Watt { .. } => watts,
        }
    }

    /// Minimum accepted set-point expressed in Watts.
    pub fn min_power(&self) -> i32 {
        self.to_power(self.min())
    }

    /// Maximum accepted set-point expressed in Watts.
    pub fn max_power(&self) -> i32 {
        self.to_power(self.max())
    }

    /// Clamps a native-unit value into `[min, max]`.
    pub fn fit_within(&self, value: i32) -> i32 {
        value.clamp(self.min(), self.max())
    }

    /// Clamps a power value into `[min_power, max_power]`.
    pub fn fit_power_within(&self, watts: i32) -> i32 {
        watts.clamp(self.min_power(), self.max_power())
    }

    /// Rounds a power value down to the nearest value the device can
    /// actually apply (one step of its native unit). Never exceeds
    /// `watts`, and the result is a fixed point of the round trip.
    pub fn round_down_to_power_step(&self, watts: i32) -> i32 {
        self.to_power(self.from_power(watts))
    }
}
