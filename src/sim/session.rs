//! Simulated charge point: plug-in window, measured-power response, and
//! full-charge detection.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::chargepoint::{Action, ChargePointParams, HysteresisTracker};
use crate::config::{ChargePointSection, HysteresisSection};

/// One charge point with an attached synthetic EV session.
///
/// The vehicle draws the commanded set-point power (with a small
/// proportional measurement noise) while plugged in and not yet full;
/// delivered energy is integrated so the vehicle eventually reports
/// `appears_to_be_fully_charged`, which exercises the cluster's
/// non-active and hysteresis paths.
#[derive(Debug, Clone)]
pub struct SimulatedChargePoint {
    config: ChargePointSection,
    hysteresis: HysteresisTracker,
    /// Energy delivered so far, in watt-seconds.
    delivered_ws: i64,
    commanded_power: i32,
    measured_power: i32,
    rng: StdRng,
}

impl SimulatedChargePoint {
    pub fn new(config: ChargePointSection, hysteresis: &HysteresisSection, seed: u64) -> Self {
        let min_power = config.ability().min_power();
        let hysteresis = HysteresisTracker::new(
            Duration::from_secs(hysteresis.keep_charging_s),
            Duration::from_secs(hysteresis.keep_zero_s),
            min_power,
            min_power / 2,
        );
        Self {
            config,
            hysteresis,
            delivered_ws: 0,
            commanded_power: 0,
            measured_power: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Last measured charge power in Watts.
    pub fn measured_power(&self) -> i32 {
        self.measured_power
    }

    /// Energy delivered so far in watt-hours.
    pub fn delivered_wh(&self) -> i64 {
        self.delivered_ws / 3600
    }

    fn plugged(&self, cycle: u64) -> bool {
        cycle >= self.config.arrival_cycle
            && (self.config.departure_cycle == 0 || cycle < self.config.departure_cycle)
    }

    fn fully_charged(&self) -> bool {
        self.config.demand_wh > 0 && self.delivered_ws >= self.config.demand_wh * 3600
    }

    /// Point-in-time snapshot for the cluster, taken at cycle start.
    pub fn params(&self, cycle: u64) -> ChargePointParams {
        ChargePointParams {
            id: self.config.id.clone(),
            mode: self.config.mode,
            is_ready_for_charging: self.plugged(cycle),
            appears_to_be_fully_charged: self.fully_charged(),
            active_power: Some(self.measured_power),
            limit: self.config.limit(),
            ability: Some(self.config.ability()),
            profiles: self.config.profiles(),
            phase_switching: self.config.phase_switching,
            hysteresis: self.hysteresis.state(),
        }
    }

    /// Accepts the cluster's action for this cycle.
    pub fn apply(&mut self, action: &Action) {
        self.commanded_power = action.set_point_power;
    }

    /// Advances the vehicle by one cycle of `dt`.
    pub fn tick(&mut self, cycle: u64, now: Instant, dt: Duration) {
        use rand::Rng;

        let drawn = if self.plugged(cycle) && !self.fully_charged() && self.commanded_power > 0 {
            // the vehicle tracks the set-point within about 1 %
            let jitter = self.commanded_power as f32 * 0.01;
            let noise = (self.rng.random::<f32>() - 0.5) * 2.0 * jitter;
            (self.commanded_power + noise as i32).max(0)
        } else {
            0
        };
        self.measured_power = drawn;
        self.delivered_ws += i64::from(drawn) * dt.as_secs() as i64;
        self.hysteresis.update_power(now, drawn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chargepoint::SetPointRequest;

    fn charge_point(demand_wh: i64) -> SimulatedChargePoint {
        let section = ChargePointSection {
            id: "cp0".to_string(),
            arrival_cycle: 5,
            departure_cycle: 0,
            demand_wh,
            ..ChargePointSection::default()
        };
        SimulatedChargePoint::new(section, &HysteresisSection::default(), 42)
    }

    fn action(power: i32) -> Action {
        Action {
            charge_point_id: "cp0".to_string(),
            set_point: SetPointRequest::MilliAmpere(power * 1000 / 690),
            set_point_power: power,
            phase_switch: None,
        }
    }

    #[test]
    fn not_ready_before_arrival() {
        let cp = charge_point(0);
        assert!(!cp.params(0).is_ready_for_charging);
        assert!(cp.params(5).is_ready_for_charging);
    }

    #[test]
    fn draws_nothing_without_command() {
        let mut cp = charge_point(0);
        cp.tick(10, Instant::now(), Duration::from_secs(1));
        assert_eq!(cp.measured_power(), 0);
    }

    #[test]
    fn tracks_commanded_power_within_noise() {
        let mut cp = charge_point(0);
        cp.apply(&action(4140));
        cp.tick(10, Instant::now(), Duration::from_secs(1));
        let drawn = cp.measured_power();
        assert!((drawn - 4140).abs() <= 42, "drawn {drawn} too far from 4140");
    }

    #[test]
    fn reports_full_once_demand_is_delivered() {
        let mut cp = charge_point(10);
        cp.apply(&action(3600));
        let t0 = Instant::now();
        let mut now = t0;
        for cycle in 5..20 {
            now += Duration::from_secs(1);
            cp.tick(cycle, now, Duration::from_secs(1));
            if cp.params(cycle).appears_to_be_fully_charged {
                return;
            }
        }
        panic!("10 Wh demand at 3.6 kW should fill within 15 cycles");
    }

    #[test]
    fn deterministic_for_same_seed() {
        let mut a = charge_point(0);
        let mut b = charge_point(0);
        let t0 = Instant::now();
        for cycle in 0..50 {
            a.apply(&action(5000));
            b.apply(&action(5000));
            a.tick(cycle, t0, Duration::from_secs(1));
            b.tick(cycle, t0, Duration::from_secs(1));
            assert_eq!(a.measured_power(), b.measured_power());
        }
    }
}
