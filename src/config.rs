use std::fmt;

use bevy::{input::keyboard::KeyCode, prelude::*};
use serde::{Serialize, Deserialize};

use crate::vehicle::SpeedProfile;

pub const CONFIG_PATH: &str = "assets/flight.json";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct VehicleConfig {
    pub base_speed: f32,
    pub boost_speed: f32,
    pub turn_step: f32,
    pub heading_smoothing: f32,
    pub scale: f32,
    pub model: String,
    pub animation_time_scale: f32,
}

impl VehicleConfig {
    pub fn speeds(&self) -> SpeedProfile {
        SpeedProfile { base: self.base_speed, boost: self.boost_speed }
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        VehicleConfig {
            base_speed: 0.1,
            boost_speed: 0.2,
            turn_step: 0.05,
            heading_smoothing: 0.1,
            scale: 0.5,
            model: String::from("models/airplane.glb"),
            animation_time_scale: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CameraConfig {
    pub offset: Vec3,
    pub initial_position: Vec3,
    pub smoothing: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            offset: Vec3::new(0.0, 7.0, -15.0),
            initial_position: Vec3::new(0.0, 7.0, -15.0),
            smoothing: 0.03,
            fov_degrees: 75.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CloudConfig {
    /// Clusters per refill ring.
    pub density: usize,
    /// Clusters scattered over the opening disc.
    pub initial_count: usize,
    pub min_spawn_dist: f32,
    /// Outer spawn radius, also the despawn radius.
    pub max_spawn_dist: f32,
    pub spawn_distance_threshold: f32,
    pub cull_radius: f32,
    pub puff_count: usize,
    pub puff_radius: f32,
    /// Half extents of the box puffs are scattered in.
    pub puff_spread: Vec3,
    pub vertical_spread: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        CloudConfig {
            density: 35,
            initial_count: 20,
            min_spawn_dist: 300.0,
            max_spawn_dist: 400.0,
            spawn_distance_threshold: 100.0,
            cull_radius: 200.0,
            puff_count: 10,
            puff_radius: 5.0,
            puff_spread: Vec3::new(5.0, 2.5, 5.0),
            vertical_spread: 25.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Equirectangular HDR panorama.
    pub texture: String,
    /// Must stay inside the camera's far plane.
    pub sky_radius: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig {
            texture: String::from("textures/environment.hdr"),
            sky_radius: 199.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_pixel_ratio: f64,
    pub clear_color: [f32; 3],
    pub ambient_brightness: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            max_pixel_ratio: 2.0,
            clear_color: [0.55, 0.7, 0.9],
            ambient_brightness: 0.6,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct KeyBindings {
    pub rotate_left: KeyCode,
    pub rotate_right: KeyCode,
    pub boost: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            rotate_left: KeyCode::Left,
            rotate_right: KeyCode::Right,
            boost: KeyCode::Up,
        }
    }
}

#[derive(Default, Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FlightConfig {
    pub vehicle: VehicleConfig,
    pub camera: CameraConfig,
    pub clouds: CloudConfig,
    pub environment: EnvironmentConfig,
    pub display: DisplayConfig,
    pub keys: KeyBindings,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Fetch(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read {CONFIG_PATH}: {e}"),
            ConfigError::Parse(e) => write!(f, "malformed {CONFIG_PATH}: {e}"),
            ConfigError::Fetch(msg) => write!(f, "cannot fetch {CONFIG_PATH}: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Fetch(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

pub fn parse_config(text: &str) -> Result<FlightConfig, ConfigError> {
    Ok(serde_json::from_str(text)?)
}

// The code here is not used in wasm builds
#[allow(dead_code)]
pub fn read_config(path: &str) -> Result<FlightConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Falls back to defaults on any failure. A missing file is expected in a
/// bare checkout, a broken one is not.
pub fn config_or_default(result: Result<FlightConfig, ConfigError>) -> FlightConfig {
    match result {
        Ok(config) => {
            info!("loaded flight config from {}", CONFIG_PATH);
            config
        }
        Err(e @ ConfigError::Parse(_)) => {
            error!("{}; using defaults", e);
            FlightConfig::default()
        }
        Err(e) => {
            warn!("{}; using defaults", e);
            FlightConfig::default()
        }
    }
}
