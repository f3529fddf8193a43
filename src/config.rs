//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::chargepoint::{
    CapabilityProfile, ChargeMode, ChargePointLimit, Phase, PhaseSwitching, SetPointAbility,
    milliamp_to_watts,
};
use crate::cluster::{ClusterConfig, DistributionStrategy, LogVerbosity};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Cluster-level allocation parameters.
    pub cluster: ClusterSection,
    /// Simulation timing and seed.
    pub simulation: SimulationSection,
    /// Simulated site surplus profile.
    pub grid: GridSection,
    /// Hysteresis hold durations.
    pub hysteresis: HysteresisSection,
    /// Charge points in priority order (list order matters for
    /// `by_priority` distribution).
    pub charge_points: Vec<ChargePointSection>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterSection::default(),
            simulation: SimulationSection::default(),
            grid: GridSection::default(),
            hysteresis: HysteresisSection::default(),
            charge_points: default_charge_points(),
        }
    }
}

/// Cluster-level allocation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterSection {
    /// Distribution strategy: `"equal_power"` or `"by_priority"`.
    pub strategy: DistributionStrategy,
    /// Per-cycle log verbosity: `"none"`, `"debug_log"` or `"trace"`.
    pub log_verbosity: LogVerbosity,
    /// Print one readable line per cycle to stdout.
    pub debug_mode: bool,
    /// Maximum set-point rise in Watts per second.
    pub ramp_rate_w_per_s: i32,
    /// History retention window in seconds.
    pub history_retention_s: u64,
    /// Optional ceiling on the distributable budget in Watts.
    pub power_ceiling_w: Option<i32>,
    /// Cluster membership by charge point id; empty means every defined
    /// charge point belongs to the cluster.
    pub members: Vec<String>,
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            strategy: DistributionStrategy::EqualPower,
            log_verbosity: LogVerbosity::DebugLog,
            debug_mode: false,
            ramp_rate_w_per_s: 500,
            history_retention_s: 300,
            power_ceiling_w: None,
            members: Vec::new(),
        }
    }
}

/// Simulation timing and seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    /// Number of control cycles to run (must be > 0).
    pub cycles: u64,
    /// Simulated seconds between cycles (must be > 0).
    pub cycle_seconds: u64,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            cycles: 300,
            cycle_seconds: 1,
            seed: 42,
        }
    }
}

/// Simulated site surplus profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSection {
    /// Peak PV generation (W).
    pub pv_peak_w: i32,
    /// Cycles per simulated day (PV bell period).
    pub day_cycles: u64,
    /// First cycle of PV production within the day (inclusive).
    pub sunrise_cycle: u64,
    /// Last cycle of PV production within the day (exclusive).
    pub sunset_cycle: u64,
    /// Baseline house consumption (W).
    pub base_load_w: i32,
    /// Sinusoidal swing of house consumption (W).
    pub load_swing_w: i32,
    /// Gaussian noise standard deviation on the surplus (W).
    pub noise_std_w: f32,
    /// Constant storage discharge reservation (W).
    pub ess_discharge_w: i32,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            pv_peak_w: 30000,
            day_cycles: 300,
            sunrise_cycle: 30,
            sunset_cycle: 270,
            base_load_w: 2000,
            load_swing_w: 1500,
            noise_std_w: 200.0,
            ess_discharge_w: 0,
        }
    }
}

/// Hysteresis hold durations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HysteresisSection {
    /// Hold seconds after charging starts.
    pub keep_charging_s: u64,
    /// Hold seconds after charging stops.
    pub keep_zero_s: u64,
}

impl Default for HysteresisSection {
    fn default() -> Self {
        Self {
            keep_charging_s: 300,
            keep_zero_s: 300,
        }
    }
}

/// Native set-point unit of a configured charge point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityUnit {
    Ampere,
    MilliAmpere,
    Watt,
}

/// One charge point in the cluster.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargePointSection {
    /// Unique charge point id (required).
    pub id: String,
    /// Configured behavioral mode.
    pub mode: ChargeMode,
    /// Wiring: `"single"` or `"three"`.
    pub phase: Phase,
    /// Minimum charge current (mA).
    pub min_current_ma: i32,
    /// Maximum charge current (mA).
    pub max_current_ma: i32,
    /// Native set-point unit.
    pub unit: AbilityUnit,
    /// Whether the vehicle tolerates charging interruptions.
    pub interruptible: bool,
    /// Whether charge point and vehicle support phase switching.
    pub can_switch_phase: bool,
    /// Phase-switch policy.
    pub phase_switching: PhaseSwitching,
    /// Simulation: cycle at which a vehicle plugs in.
    pub arrival_cycle: u64,
    /// Simulation: cycle at which the vehicle departs (0 = stays).
    pub departure_cycle: u64,
    /// Simulation: energy demand until the vehicle reads as fully
    /// charged, in watt-hours (0 = unlimited).
    pub demand_wh: i64,
}

impl Default for ChargePointSection {
    fn default() -> Self {
        Self {
            id: String::new(),
            mode: ChargeMode::Surplus,
            phase: Phase::Three,
            min_current_ma: 6000,
            max_current_ma: 16000,
            unit: AbilityUnit::MilliAmpere,
            interruptible: true,
            can_switch_phase: false,
            phase_switching: PhaseSwitching::Disable,
            arrival_cycle: 0,
            departure_cycle: 0,
            demand_wh: 0,
        }
    }
}

impl ChargePointSection {
    /// Current limits at the configured wiring.
    pub fn limit(&self) -> ChargePointLimit {
        ChargePointLimit {
            phase: self.phase,
            min_current_ma: self.min_current_ma,
            max_current_ma: self.max_current_ma,
        }
    }

    /// Native set-point ability derived from the configured unit and
    /// current range.
    pub fn ability(&self) -> SetPointAbility {
        match self.unit {
            AbilityUnit::MilliAmpere => SetPointAbility::MilliAmpere {
                phase: self.phase,
                min: self.min_current_ma,
                max: self.max_current_ma,
            },
            AbilityUnit::Ampere => SetPointAbility::Ampere {
                phase: self.phase,
                min: self.min_current_ma / 1000,
                max: self.max_current_ma / 1000,
            },
            AbilityUnit::Watt => SetPointAbility::Watt {
                phase: self.phase,
                min: milliamp_to_watts(self.min_current_ma, self.phase),
                max: milliamp_to_watts(self.max_current_ma, self.phase),
            },
        }
    }

    /// Capability profiles advertised toward the cluster.
    pub fn profiles(&self) -> Vec<CapabilityProfile> {
        let mut profiles = Vec::new();
        if self.interruptible {
            profiles.push(CapabilityProfile::Interruptible);
        }
        if self.can_switch_phase {
            profiles.push(CapabilityProfile::PhaseSwitchToSingle);
            profiles.push(CapabilityProfile::PhaseSwitchToThree);
        }
        profiles
    }
}

fn default_charge_points() -> Vec<ChargePointSection> {
    (0..3)
        .map(|i| ChargePointSection {
            id: format!("cp{i}"),
            arrival_cycle: i * 20,
            demand_wh: 15_000,
            ..ChargePointSection::default()
        })
        .collect()
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g. `"cluster.ramp_rate_w_per_s"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Names accepted by [`ScenarioConfig::from_preset`].
    pub const PRESETS: [&'static str; 3] = ["baseline", "forced_lane", "priority"];

    /// Returns the baseline scenario: three identical three-phase
    /// surplus charge points under equal-power distribution.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// One FORCE lane next to two surplus lanes.
    pub fn forced_lane() -> Self {
        let mut cfg = Self::default();
        cfg.charge_points[0].mode = ChargeMode::Force;
        cfg.charge_points[0].arrival_cycle = 0;
        cfg
    }

    /// Priority distribution with heterogeneous abilities: a watt-
    /// granular wallbox first, a single-phase switcher last.
    pub fn priority() -> Self {
        let mut cfg = Self::default();
        cfg.cluster.strategy = DistributionStrategy::ByPriority;
        cfg.charge_points[0].unit = AbilityUnit::Watt;
        cfg.charge_points[2].phase = Phase::Single;
        cfg.charge_points[2].max_current_ma = 32000;
        cfg.charge_points[2].can_switch_phase = true;
        cfg.charge_points[2].phase_switching = PhaseSwitching::ForceThreePhase;
        cfg
    }

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "forced_lane" => Ok(Self::forced_lane()),
            "priority" => Ok(Self::priority()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new(
                "scenario",
                format!("cannot read \"{}\": {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains
    /// unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid. Any error
    /// is fatal at activation: the cluster controller must not run.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.cycles == 0 {
            errors.push(ConfigError::new("simulation.cycles", "must be > 0"));
        }
        if self.simulation.cycle_seconds == 0 {
            errors.push(ConfigError::new("simulation.cycle_seconds", "must be > 0"));
        }
        if self.cluster.ramp_rate_w_per_s <= 0 {
            errors.push(ConfigError::new("cluster.ramp_rate_w_per_s", "must be > 0"));
        }
        if self.grid.sunrise_cycle >= self.grid.sunset_cycle {
            errors.push(ConfigError::new(
                "grid.sunrise_cycle",
                "must be < grid.sunset_cycle",
            ));
        }
        if self.grid.day_cycles == 0 {
            errors.push(ConfigError::new("grid.day_cycles", "must be > 0"));
        } else if self.grid.sunset_cycle > self.grid.day_cycles {
            errors.push(ConfigError::new(
                "grid.sunset_cycle",
                "must be <= grid.day_cycles",
            ));
        }

        if self.charge_points.is_empty() {
            errors.push(ConfigError::new("charge_points", "at least one is required"));
        }
        for (i, cp) in self.charge_points.iter().enumerate() {
            if cp.id.is_empty() {
                errors.push(ConfigError::new(format!("charge_points[{i}].id"), "required"));
            }
            if self
                .charge_points
                .iter()
                .filter(|other| other.id == cp.id)
                .count()
                > 1
            {
                errors.push(ConfigError::new(
                    format!("charge_points[{i}].id"),
                    format!("duplicate id \"{}\"", cp.id),
                ));
            }
            if cp.min_current_ma < 0 || cp.min_current_ma > cp.max_current_ma {
                errors.push(ConfigError::new(
                    format!("charge_points[{i}].min_current_ma"),
                    "must be >= 0 and <= max_current_ma",
                ));
            }
            if cp.departure_cycle != 0 && cp.departure_cycle <= cp.arrival_cycle {
                errors.push(ConfigError::new(
                    format!("charge_points[{i}].departure_cycle"),
                    "must be > arrival_cycle (or 0)",
                ));
            }
        }

        // An unresolvable member reference is fatal at activation.
        for member in &self.cluster.members {
            if !self.charge_points.iter().any(|cp| &cp.id == member) {
                errors.push(ConfigError::new(
                    "cluster.members",
                    format!("unresolvable member reference \"{member}\""),
                ));
            }
        }

        errors
    }

    /// Charge points belonging to the cluster, in priority order.
    pub fn member_charge_points(&self) -> Vec<&ChargePointSection> {
        if self.cluster.members.is_empty() {
            self.charge_points.iter().collect()
        } else {
            self.cluster
                .members
                .iter()
                .filter_map(|id| self.charge_points.iter().find(|cp| &cp.id == id))
                .collect()
        }
    }

    /// Maps the cluster section onto the controller's configuration.
    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            strategy: self.cluster.strategy,
            power_ceiling: self.cluster.power_ceiling_w,
            ramp_rate_w_per_s: self.cluster.ramp_rate_w_per_s,
            history_retention: Duration::from_secs(self.cluster.history_retention_s),
            log_verbosity: self.cluster.log_verbosity,
        }
    }
}
