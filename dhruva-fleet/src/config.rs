//! Configuration loading for DhruvaFleet

use crate::error::{FleetError, Result};
use crate::graph::{NavGraph, VertexIdx};
use crate::robot::ARRIVAL_EPSILON;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

/// Host loop settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Wall-clock period of one tick in milliseconds (default: 50)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks; 0 runs until stopped (default: 0)
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop once every robot is at rest and no scheduled task remains (default: true)
    #[serde(default = "default_stop_when_idle")]
    pub stop_when_idle: bool,

    /// Interval between status log lines in seconds (default: 3.0)
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: f32,
}

/// Robot motion and battery parameters
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Lane fraction travelled per tick (default: 0.05, i.e. 20 ticks per lane)
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Battery percent consumed per moving tick (default: 0.1)
    #[serde(default = "default_battery_drain")]
    pub battery_drain_per_tick: f32,

    /// Battery percent restored per charging tick (default: 1.0)
    #[serde(default = "default_charge_rate")]
    pub charge_rate_per_tick: f32,

    /// Battery of newly spawned robots (default: 100)
    #[serde(default = "default_initial_battery")]
    pub initial_battery: f32,

    /// Below this level a moving robot reroutes to the nearest charger (default: 20)
    #[serde(default = "default_low_battery_threshold")]
    pub low_battery_threshold: f32,

    /// Arriving at a charger below this level starts charging (default: 50)
    #[serde(default = "default_charge_seek_threshold")]
    pub charge_seek_threshold: f32,

    /// Charging stops at this level (default: 95)
    #[serde(default = "default_charge_complete_threshold")]
    pub charge_complete_threshold: f32,

    /// Consecutive waiting ticks before the task is abandoned (default: 100)
    #[serde(default = "default_wait_timeout_ticks")]
    pub wait_timeout_ticks: u32,
}

/// Path reservation settings
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TrafficConfig {
    /// Reserve the whole route before committing an assignment (default: false)
    #[serde(default)]
    pub strict_reservations: bool,
}

/// Navigation graph source
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GraphConfig {
    /// Path to the JSON graph document (default: maps/nav_graph.json)
    #[serde(default = "default_graph_path")]
    pub path: PathBuf,

    /// Level to load at startup (default: level1)
    #[serde(default = "default_level")]
    pub level: String,

    /// Further per-level documents merged over `path`
    #[serde(default)]
    pub extra_paths: Vec<PathBuf>,
}

/// Output configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Append fleet events to this file
    #[serde(default)]
    pub event_log_path: Option<PathBuf>,

    /// Write final robot snapshots as JSON to this file
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

/// Robots to spawn and tasks to dispatch
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub spawn: Vec<SpawnSpec>,
    #[serde(default)]
    pub task: Vec<TaskSpec>,
}

/// Spawn one robot at a vertex when the scenario starts
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpawnSpec {
    pub vertex: VertexRef,
}

/// Assign a destination to a robot once the tick counter reaches `at_tick`
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TaskSpec {
    pub robot: u32,
    pub destination: VertexRef,
    #[serde(default)]
    pub at_tick: u64,
}

/// A vertex given either by index or by display name.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum VertexRef {
    Index(usize),
    Name(String),
}

impl VertexRef {
    /// Resolve against the loaded level. Indices are not range-checked here.
    pub fn resolve(&self, graph: &NavGraph) -> Result<VertexIdx> {
        match self {
            VertexRef::Index(i) => Ok(VertexIdx::new(*i)),
            VertexRef::Name(name) => graph
                .vertex_by_name(name)
                .ok_or_else(|| FleetError::UnknownVertexName(name.clone())),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
            stop_when_idle: default_stop_when_idle(),
            status_interval_secs: default_status_interval_secs(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            battery_drain_per_tick: default_battery_drain(),
            charge_rate_per_tick: default_charge_rate(),
            initial_battery: default_initial_battery(),
            low_battery_threshold: default_low_battery_threshold(),
            charge_seek_threshold: default_charge_seek_threshold(),
            charge_complete_threshold: default_charge_complete_threshold(),
            wait_timeout_ticks: default_wait_timeout_ticks(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: default_graph_path(),
            level: default_level(),
            extra_paths: Vec::new(),
        }
    }
}

// Default value functions
fn default_tick_interval_ms() -> u64 {
    50
}
fn default_stop_when_idle() -> bool {
    true
}
fn default_status_interval_secs() -> f32 {
    3.0
}
fn default_speed() -> f32 {
    0.05
}
fn default_battery_drain() -> f32 {
    0.1
}
fn default_charge_rate() -> f32 {
    1.0
}
fn default_initial_battery() -> f32 {
    100.0
}
fn default_low_battery_threshold() -> f32 {
    20.0
}
fn default_charge_seek_threshold() -> f32 {
    50.0
}
fn default_charge_complete_threshold() -> f32 {
    95.0
}
fn default_wait_timeout_ticks() -> u32 {
    100
} // 5 s at the default tick period
fn default_graph_path() -> PathBuf {
    PathBuf::from("maps/nav_graph.json")
}
fn default_level() -> String {
    "level1".to_string()
}

impl FleetConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FleetError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FleetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.robot.validate()?;
        self.simulation.status_interval()?;
        Ok(())
    }
}

impl SimulationConfig {
    /// Period of the runner's status line.
    pub fn status_interval(&self) -> Result<Duration> {
        let secs = self.status_interval_secs;
        match Duration::try_from_secs_f32(secs) {
            Ok(interval) if !interval.is_zero() => Ok(interval),
            _ => Err(FleetError::Config(format!(
                "simulation.status_interval_secs must be a positive number of seconds, got {}",
                secs
            ))),
        }
    }
}

impl RobotConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.speed > 0.0 && self.speed <= 1.0) {
            return Err(FleetError::Config(format!(
                "robot.speed must be in (0, 1], got {}",
                self.speed
            )));
        }
        let rates = [self.battery_drain_per_tick, self.charge_rate_per_tick];
        if !rates.iter().all(|r| r.is_finite() && *r > 0.0) {
            return Err(FleetError::Config(
                "robot battery drain and charge rates must be positive".to_string(),
            ));
        }

        let levels = [
            ("initial_battery", self.initial_battery),
            ("low_battery_threshold", self.low_battery_threshold),
            ("charge_seek_threshold", self.charge_seek_threshold),
            ("charge_complete_threshold", self.charge_complete_threshold),
        ];
        for (name, value) in levels {
            if !(0.0..=100.0).contains(&value) {
                return Err(FleetError::Config(format!(
                    "robot.{} must be within [0, 100], got {}",
                    name, value
                )));
            }
        }

        if self.low_battery_threshold > self.charge_seek_threshold
            || self.charge_seek_threshold > self.charge_complete_threshold
        {
            return Err(FleetError::Config(
                "robot thresholds must satisfy low_battery <= charge_seek <= charge_complete"
                    .to_string(),
            ));
        }
        if self.wait_timeout_ticks == 0 {
            return Err(FleetError::Config(
                "robot.wait_timeout_ticks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Ticks needed to traverse one lane at this speed.
    pub fn ticks_per_lane(&self) -> u32 {
        ((1.0 - ARRIVAL_EPSILON) / self.speed).ceil() as u32
    }
}
