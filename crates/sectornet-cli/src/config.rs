//! Pipeline configuration – reads/writes `~/.sectornet/config.toml`.
//!
//! ```toml
//! [swimmer_sensor]
//! sensing_radius = 50.0
//! saturation_radius = 5.0
//! sector_count = 8
//! normalization = "none"
//!
//! [vehicle_sensor]          # optional
//! sensing_radius = 80.0
//! saturation_radius = 10.0
//! sector_count = 8
//! normalization = "fixed"
//! fixed_divisor = 3.0
//!
//! [controller]
//! kind = "network"          # "network", "center_of_mass" or "none"
//! network_file = "net.txt"
//! output_activations = ["tanh", "linear"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sectornet_network::{Activation, NetworkRecord};
use sectornet_perception::{NormalizationRule, SectorSensor};
use sectornet_runtime::{Controller, DecisionPipeline};

/// Which controller turns readings into actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    Network,
    #[default]
    CenterOfMass,
    None,
}

impl std::fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerKind::Network => write!(f, "network"),
            ControllerKind::CenterOfMass => write!(f, "center_of_mass"),
            ControllerKind::None => write!(f, "none"),
        }
    }
}

impl FromStr for ControllerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "network" => Ok(ControllerKind::Network),
            "center_of_mass" | "com" => Ok(ControllerKind::CenterOfMass),
            "none" => Ok(ControllerKind::None),
            other => Err(format!("unknown controller kind {other:?}")),
        }
    }
}

/// One `[*_sensor]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub sensing_radius: f64,
    pub saturation_radius: f64,
    pub sector_count: usize,
    /// `"none"`, `"fixed"` or `"dynamic"`.
    #[serde(default = "default_normalization")]
    pub normalization: String,
    /// Divisor for `"fixed"` normalization.
    #[serde(default = "default_fixed_divisor")]
    pub fixed_divisor: f64,
}

impl SensorConfig {
    pub fn build(&self) -> Result<SectorSensor, String> {
        let rule = NormalizationRule::from_name(&self.normalization, self.fixed_divisor);
        SectorSensor::new(
            self.sensing_radius,
            self.saturation_radius,
            self.sector_count,
            rule,
        )
        .map_err(|e| e.to_string())
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sensing_radius: 50.0,
            saturation_radius: 5.0,
            sector_count: 8,
            normalization: default_normalization(),
            fixed_divisor: default_fixed_divisor(),
        }
    }
}

/// The `[controller]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub kind: ControllerKind,
    /// Network record file, required for `kind = "network"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_file: Option<PathBuf>,
    /// Per-output activations; all tanh when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_activations: Vec<String>,
    /// Constant speed of the centre-of-mass follower.
    #[serde(default = "default_speed")]
    pub speed: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            kind: ControllerKind::default(),
            network_file: None,
            output_activations: Vec::new(),
            speed: default_speed(),
        }
    }
}

/// Persisted configuration stored in `~/.sectornet/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub swimmer_sensor: SensorConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_sensor: Option<SensorConfig>,
    #[serde(default)]
    pub controller: ControllerConfig,
}

fn default_normalization() -> String {
    "none".to_string()
}
fn default_fixed_divisor() -> f64 {
    1.0
}
fn default_speed() -> f64 {
    1.0
}

impl Config {
    /// Build the sensors and controller this config describes.
    pub fn build_pipeline(&self) -> Result<DecisionPipeline, String> {
        let swimmers = self
            .swimmer_sensor
            .build()
            .map_err(|e| format!("[swimmer_sensor] {e}"))?;
        let vehicles = self
            .vehicle_sensor
            .as_ref()
            .map(|v| v.build().map_err(|e| format!("[vehicle_sensor] {e}")))
            .transpose()?;
        let controller = self.build_controller()?;

        DecisionPipeline::new(swimmers, vehicles, controller).map_err(|e| e.to_string())
    }

    fn build_controller(&self) -> Result<Option<Controller>, String> {
        let ctl = &self.controller;
        match ctl.kind {
            ControllerKind::None => Ok(None),
            ControllerKind::CenterOfMass => {
                if !ctl.speed.is_finite() {
                    return Err(format!("[controller] speed must be finite, got {}", ctl.speed));
                }
                Ok(Some(Controller::FollowCenterOfMass { speed: ctl.speed }))
            }
            ControllerKind::Network => {
                let path = ctl
                    .network_file
                    .as_ref()
                    .ok_or("[controller] kind = \"network\" requires network_file")?;
                let record = NetworkRecord::load(path).map_err(|e| e.to_string())?;
                let activations = parse_activations(&ctl.output_activations)?;
                let net = record
                    .build(activations.as_deref())
                    .map_err(|e| e.to_string())?;
                Ok(Some(Controller::Network(net)))
            }
        }
    }
}

fn parse_activations(names: &[String]) -> Result<Option<Vec<Activation>>, String> {
    if names.is_empty() {
        return Ok(None);
    }
    names
        .iter()
        .map(|n| {
            Activation::from_name(n)
                .ok_or_else(|| format!("[controller] unknown output activation {n:?}"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Return the path to `~/.sectornet/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".sectornet").join("config.toml")
}

/// Load the config at `path` and apply environment overrides.  Returns `None`
/// if the file does not exist.
pub fn load(path: &Path) -> Result<Option<Config>, String> {
    let Some(mut cfg) = load_from(path)? else {
        return Ok(None);
    };
    apply_env_overrides(&mut cfg)?;
    Ok(Some(cfg))
}

/// Load the config from a specific path, without environment overrides.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `SECTORNET_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SECTORNET_CONTROLLER` | `controller.kind` |
/// | `SECTORNET_NETWORK_FILE` | `controller.network_file` |
pub fn apply_env_overrides(cfg: &mut Config) -> Result<(), String> {
    if let Ok(v) = std::env::var("SECTORNET_CONTROLLER") {
        cfg.controller.kind = v.parse()?;
    }
    if let Ok(v) = std::env::var("SECTORNET_NETWORK_FILE") {
        cfg.controller.network_file = Some(PathBuf::from(v));
    }
    Ok(())
}

/// Save the config, creating the parent directory if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
