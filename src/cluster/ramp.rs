//! Ramp limiting: bounds how fast a commanded set-point may move away
//! from the last applied value.

use std::time::{Duration, Instant};

use super::history::History;

/// Clamps set-point changes to a configured rate in Watts per second.
#[derive(Debug, Clone, Copy)]
pub struct RampLimiter {
    rate_w_per_s: i32,
}

impl RampLimiter {
    pub fn new(rate_w_per_s: i32) -> Self {
        Self { rate_w_per_s }
    }

    /// Applies the rate limit to `target` against the charge point's
    /// history.
    ///
    /// - No history yet: the target passes through unlimited.
    /// - Declining target: unlimited, so an allocation can drop the
    ///   instant the surplus vanishes and the budget is never overspent.
    /// - Last applied value was zero: charging restarts at `min_power`
    ///   (a device cannot run below its minimum, so the first step up
    ///   is the minimum, then the ramp takes over).
    /// - Otherwise the rise is capped at `last + rate * elapsed`. A
    ///   clock that runs backwards counts as zero elapsed, which grants
    ///   no ramp allowance this cycle.
    pub fn limit(&self, history: &History, now: Instant, target: i32, min_power: i32) -> i32 {
        let Some(last) = history.last() else {
            return target;
        };
        if target <= last.set_point {
            return target;
        }
        if last.set_point == 0 {
            return target.min(min_power);
        }
        let elapsed = now
            .checked_duration_since(last.at)
            .unwrap_or(Duration::ZERO);
        let max_delta = (f64::from(self.rate_w_per_s) * elapsed.as_secs_f64()).ceil() as i32;
        target.min(last.set_point + max_delta)
    }
}
