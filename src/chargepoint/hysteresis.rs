//! Charging hysteresis: prevents a charge point from flapping between
//! zero and minimum current when the available budget hovers around the
//! minimum-power threshold.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Hysteresis verdict consumed by the distribution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hysteresis {
    Inactive,
    /// Charging started recently: keep at least the minimum even when the
    /// budget no longer covers it.
    KeepCharging,
    /// Charging stopped recently: stay at zero even when budget returns.
    KeepZero,
}

/// Tracks one charge point's hysteresis across cycles.
///
/// Power must rise to `rise_threshold` to count as charging and drop
/// below the lower `fall_threshold` to count as stopped; each transition
/// arms the corresponding hold state for its configured duration.
#[derive(Debug, Clone)]
pub struct HysteresisTracker {
    keep_charging_for: Duration,
    keep_zero_for: Duration,
    rise_threshold: i32,
    fall_threshold: i32,
    state: Hysteresis,
    since: Option<Instant>,
    charging: bool,
}

impl HysteresisTracker {
    pub fn new(
        keep_charging_for: Duration,
        keep_zero_for: Duration,
        rise_threshold: i32,
        fall_threshold: i32,
    ) -> Self {
        Self {
            keep_charging_for,
            keep_zero_for,
            rise_threshold,
            fall_threshold,
            state: Hysteresis::Inactive,
            since: None,
            charging: false,
        }
    }

    /// Current verdict without advancing the state machine.
    pub fn state(&self) -> Hysteresis {
        self.state
    }

    /// Advances the state machine with the power applied this cycle and
    /// returns the verdict for the next cycle.
    pub fn update_power(&mut self, now: Instant, power: i32) -> Hysteresis {
        let charging = if self.charging {
            power >= self.fall_threshold
        } else {
            power >= self.rise_threshold
        };
        self.update(now, charging)
    }

    /// Advances the state machine with an explicit charging flag.
    pub fn update(&mut self, now: Instant, charging: bool) -> Hysteresis {
        if charging != self.charging {
            self.charging = charging;
            self.state = if charging {
                Hysteresis::KeepCharging
            } else {
                Hysteresis::KeepZero
            };
            self.since = Some(now);
        } else if let Some(since) = self.since {
            let hold = match self.state {
                Hysteresis::KeepCharging => self.keep_charging_for,
                Hysteresis::KeepZero => self.keep_zero_for,
                Hysteresis::Inactive => Duration::ZERO,
            };
            // checked_duration_since treats a clock rollback as zero elapsed
            let elapsed = now.checked_duration_since(since).unwrap_or(Duration::ZERO);
            if elapsed >= hold {
                self.state = Hysteresis::Inactive;
                self.since = None;
            }
        }
        self.state
    }
}
