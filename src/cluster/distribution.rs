//! Power distribution across the cluster's charge points.
//!
//! All stages work on integer Watts; translation to device units happens
//! only at the very end (step rounding and emission), which keeps the
//! distribution strategies agnostic of ampere/milliampere/watt abilities.

use serde::{Deserialize, Serialize};

use crate::chargepoint::mode::{self, ChargeMode, ResolvedMode};
use crate::chargepoint::{ChargePointParams, Hysteresis, ParamsError, SetPointAbility};

/// How the remaining budget is split among SURPLUS charge points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStrategy {
    /// Equal shares, iterated to a fixed point; capped entries return
    /// their surplus to the pool.
    EqualPower,
    /// List order wins; later entries receive the leftover.
    ByPriority,
}

/// Working allocation state for one charge point.
#[derive(Debug, Clone)]
pub struct Entry {
    pub params: ChargePointParams,
    pub resolved: ResolvedMode,
    pub ability: SetPointAbility,
    /// Working set-point in Watts, refined stage by stage.
    pub set_point: i32,
}

impl Entry {
    /// Builds an entry from a validated snapshot.
    ///
    /// The distribution interval combines the charge point's limit with
    /// the ability's own range (converted with the ability's own phase
    /// count), so a three-phase limit attached to a single-phase ability
    /// can never allocate power the device cannot apply.
    pub fn new(params: ChargePointParams) -> Result<Self, ParamsError> {
        params.validate()?;
        let ability = params.ability.expect("validated above");
        let min_power = params.limit.min_power().max(ability.min_power());
        let max_power = params.limit.max_power().min(ability.max_power());
        if min_power > max_power {
            return Err(ParamsError::EmptyPowerInterval {
                min: min_power,
                max: max_power,
            });
        }
        let resolved = mode::resolve(
            params.mode,
            params.is_ready_for_charging,
            params.appears_to_be_fully_charged,
            params.hysteresis,
            min_power,
            max_power,
        );
        Ok(Self {
            params,
            resolved,
            ability,
            set_point: 0,
        })
    }

    /// Ready for charging and the vehicle still accepts energy.
    pub fn is_active(&self) -> bool {
        self.resolved.active
    }

    fn is_surplus(&self) -> bool {
        self.is_active() && self.resolved.mode == ChargeMode::Surplus
    }
}

/// Allocation state for the whole cluster during one cycle.
#[derive(Debug)]
pub struct PowerDistribution {
    pub entries: Vec<Entry>,
    /// Sum of measured charge power over all entries, in Watts.
    pub total_active_power: i32,
}

impl PowerDistribution {
    /// Builds the distribution from per-charge-point snapshots.
    ///
    /// Malformed snapshots are returned separately so the orchestrator
    /// can emit `Zero` for them without aborting the cycle.
    pub fn new(params: Vec<ChargePointParams>) -> (Self, Vec<(String, ParamsError)>) {
        let mut entries = Vec::with_capacity(params.len());
        let mut rejected = Vec::new();
        for p in params {
            let id = p.id.clone();
            match Entry::new(p) {
                Ok(entry) => entries.push(entry),
                Err(e) => rejected.push((id, e)),
            }
        }
        let total_active_power = entries
            .iter()
            .filter_map(|e| e.params.active_power)
            .sum();
        (
            Self {
                entries,
                total_active_power,
            },
            rejected,
        )
    }

    /// Initial set-points per actual mode: FORCE takes the device
    /// maximum, MINIMUM its minimum, SURPLUS and ZERO start at zero.
    pub fn initialize_set_points(&mut self) {
        for e in self.entries.iter_mut().filter(|e| e.is_active()) {
            e.set_point = match e.resolved.mode {
                ChargeMode::Force => e.resolved.max_power,
                ChargeMode::Minimum => e.resolved.min_power,
                ChargeMode::Surplus | ChargeMode::Zero => 0,
            };
        }
    }

    /// Power already committed to FORCE/MINIMUM entries, in Watts.
    pub fn committed_power(&self) -> i32 {
        self.entries
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.set_point)
            .sum()
    }

    /// First distribution stage: offer each SURPLUS entry its minimum.
    ///
    /// Hysteresis applies here: `KeepZero` entries are passed over even
    /// when the budget would cover them, and `KeepCharging` entries keep
    /// their minimum even when it no longer fits. Returns the remaining
    /// distributable power (negative when hysteresis overcommits).
    pub fn distribute_surplus_min_power(&mut self, distributable: i32) -> i32 {
        let mut remaining = distributable;
        for e in self.entries.iter_mut().filter(|e| e.is_surplus()) {
            let hysteresis = e.params.hysteresis;
            if hysteresis == Hysteresis::KeepZero {
                continue;
            }
            let power = e.resolved.min_power;
            if hysteresis != Hysteresis::KeepCharging && power > remaining {
                continue;
            }
            e.set_point = power;
            remaining -= power;
        }
        remaining
    }

    /// Second stage: split the remaining budget among SURPLUS entries
    /// that made it past the minimum-power stage.
    pub fn distribute_surplus_remaining(&mut self, strategy: DistributionStrategy, pool: i32) {
        let eligible = self.surplus_above_zero();
        if eligible.is_empty() || pool <= 0 {
            return;
        }
        match strategy {
            DistributionStrategy::EqualPower => self.distribute_equal(&eligible, pool),
            DistributionStrategy::ByPriority => self.distribute_by_priority(&eligible, pool),
        }
    }

    fn distribute_equal(&mut self, eligible: &[usize], initial_pool: i32) {
        let mut pool = initial_pool;
        loop {
            let open: Vec<usize> = eligible
                .iter()
                .copied()
                .filter(|&i| self.entries[i].set_point < self.entries[i].resolved.max_power)
                .collect();
            if open.is_empty() || pool <= 0 {
                return;
            }
            let share = pool / open.len() as i32;
            let mut remainder = pool % open.len() as i32;
            let mut moved = false;
            for &i in &open {
                let extra = share + i32::from(remainder > 0);
                if remainder > 0 {
                    remainder -= 1;
                }
                if extra == 0 {
                    break;
                }
                let e = &mut self.entries[i];
                let after = (e.set_point + extra).min(e.resolved.max_power);
                if after > e.set_point {
                    pool -= after - e.set_point;
                    e.set_point = after;
                    moved = true;
                }
            }
            if !moved {
                return;
            }
        }
    }

    fn distribute_by_priority(&mut self, eligible: &[usize], pool: i32) {
        let mut remaining = pool;
        for &i in eligible {
            if remaining <= 0 {
                return;
            }
            let e = &mut self.entries[i];
            let after = (e.set_point + remaining).clamp(e.resolved.min_power, e.resolved.max_power);
            remaining -= after - e.set_point;
            e.set_point = after;
        }
    }

    /// Rounds SURPLUS allocations down to each device's set-point step
    /// and re-offers the reclaimed watts in list order.
    ///
    /// Walks backwards first so the watts freed by later entries can
    /// top up earlier ones within the same cycle.
    pub fn round_to_set_point_steps(&mut self) {
        let eligible = self.surplus_above_zero();
        let mut reclaimed = 0;
        for &i in eligible.iter().rev() {
            let e = &mut self.entries[i];
            let stepped = e.ability.round_down_to_power_step(e.set_point);
            reclaimed += e.set_point - stepped;
            e.set_point = stepped;
        }
        for &i in &eligible {
            if reclaimed < 1 {
                return;
            }
            let e = &mut self.entries[i];
            let stepped = e
                .ability
                .round_down_to_power_step(e.set_point + reclaimed)
                .min(e.resolved.max_power);
            reclaimed -= stepped - e.set_point;
            e.set_point = stepped;
        }
    }

    /// Non-active entries (not ready, or vehicle full) receive the fixed
    /// allocation the mode resolver granted them: zero when not ready or
    /// in ZERO mode, otherwise the minimum so on-board systems stay up.
    pub fn permit_non_actives(&mut self) {
        for e in self.entries.iter_mut().filter(|e| !e.is_active()) {
            e.set_point = e.resolved.min_power;
        }
    }

    fn surplus_above_zero(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_surplus() && e.set_point > 0)
            .map(|(i, _)| i)
            .collect()
    }
}
