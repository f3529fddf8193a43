//! Simulated site telemetry: PV production bell, house load, noise.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cluster::GridSnapshot;
use crate::config::GridSection;

/// Produces one [`GridSnapshot`] per cycle from a deterministic PV and
/// house-load profile plus seeded Gaussian noise.
///
/// Grid power follows the meter convention: positive is buy-from-grid.
/// The snapshot accounts for the cluster's own consumption, which a real
/// grid meter would see as import.
#[derive(Debug, Clone)]
pub struct SimulatedGrid {
    config: GridSection,
    rng: StdRng,
}

impl SimulatedGrid {
    pub fn new(config: GridSection, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Snapshot for `cycle`, given the cluster's current total measured
    /// charge power in Watts.
    pub fn snapshot(&mut self, cycle: u64, total_charge_power: i32) -> GridSnapshot {
        let surplus = self.pv_w(cycle) - self.load_w(cycle);
        let noise = gaussian_noise(&mut self.rng, self.config.noise_std_w) as i32;
        GridSnapshot {
            grid_active_power: total_charge_power - surplus + noise,
            ess_discharge_power: self.config.ess_discharge_w,
        }
    }

    /// PV production at `cycle`: a half-sine bell between sunrise and
    /// sunset, repeating every simulated day.
    fn pv_w(&self, cycle: u64) -> i32 {
        let c = &self.config;
        let t = cycle % c.day_cycles;
        if t < c.sunrise_cycle || t >= c.sunset_cycle {
            return 0;
        }
        let span = (c.sunset_cycle - c.sunrise_cycle) as f32;
        let x = (t - c.sunrise_cycle) as f32 / span;
        (c.pv_peak_w as f32 * (std::f32::consts::PI * x).sin()) as i32
    }

    /// House consumption at `cycle`: baseline plus a daily sinusoid.
    fn load_w(&self, cycle: u64) -> i32 {
        let c = &self.config;
        let x = (cycle % c.day_cycles) as f32 / c.day_cycles as f32;
        let swing = c.load_swing_w as f32 * (2.0 * std::f32::consts::PI * x).sin();
        (c.base_load_w as f32 + swing) as i32
    }
}

/// Gaussian noise via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f32) -> f32 {
    use rand::Rng;

    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f32 = rng.random::<f32>().clamp(1e-6, 1.0);
    let u2: f32 = rng.random::<f32>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z0 * std_dev
}
