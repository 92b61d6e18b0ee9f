// src/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ControlError;
use crate::geometry::Zone;
use crate::tracking::KeypointKind;

/// Environment variable naming an optional JSON override file.
pub const CONFIG_ENV: &str = "POSE_MOUSE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneLayout {
    pub calibration_left: Zone,
    pub calibration_right: Zone,
    pub mouse_down: Zone,
    pub mouse_click: Zone,
    pub pointing: Zone,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self {
            calibration_left: Zone::new(50.0, 50.0, 150.0, 150.0),
            calibration_right: Zone::new(540.0, 50.0, 640.0, 150.0),
            mouse_down: Zone::new(50.0, 50.0, 200.0, 240.0),
            mouse_click: Zone::new(50.0, 240.0, 200.0, 430.0),
            pointing: Zone::new(50.0, 50.0, 590.0, 430.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub input_name: String,
    pub output_name: String,
    pub min_pose_confidence: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let path = directories::ProjectDirs::from("com", "posemouse", "PoseMouse")
            .map(|dirs| dirs.data_dir().join("models").join("movenet_singlepose.onnx"))
            .unwrap_or_else(|| PathBuf::from("./models/movenet_singlepose.onnx"));

        Self {
            path,
            input_name: "serving_default_input_0".to_string(),
            output_name: "StatefulPartitionedCall_0".to_string(),
            min_pose_confidence: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub zones: ZoneLayout,
    /// Frames arrive mirrored, so the operator's left hand carries the model's right-wrist label.
    pub left_hand: KeypointKind,
    pub right_hand: KeypointKind,
    pub click_cooldown_secs: f64,
    pub countdown_steps: u32,
    pub countdown_step_secs: f64,
    pub clamp_to_screen: bool,
    pub release_on_tracking_lost: bool,
    pub headless: bool,
    pub model: ModelConfig,
    pub camera: CameraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zones: ZoneLayout::default(),
            left_hand: KeypointKind::RightWrist,
            right_hand: KeypointKind::LeftWrist,
            click_cooldown_secs: 2.0,
            countdown_steps: 5,
            countdown_step_secs: 1.0,
            clamp_to_screen: true,
            release_on_tracking_lost: false,
            headless: false,
            model: ModelConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, overridden by the JSON file in `POSE_MOUSE_CONFIG` when set.
    pub fn load() -> Result<Self> {
        let config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Reading configuration overrides from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Cannot parse config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ControlError> {
        let zones = [
            ("calibration_left", &self.zones.calibration_left),
            ("calibration_right", &self.zones.calibration_right),
            ("mouse_down", &self.zones.mouse_down),
            ("mouse_click", &self.zones.mouse_click),
            ("pointing", &self.zones.pointing),
        ];
        for (name, zone) in zones {
            if zone.width() <= 0.0 || zone.height() <= 0.0 {
                return Err(ControlError::Config(format!(
                    "zone {name} must have positive width and height, got {zone:?}"
                )));
            }
        }
        let cooldown = Duration::try_from_secs_f64(self.click_cooldown_secs).map_err(|e| {
            ControlError::Config(format!("click cooldown {} is not a usable duration: {e}", self.click_cooldown_secs))
        })?;
        let step = Duration::try_from_secs_f64(self.countdown_step_secs).map_err(|e| {
            ControlError::Config(format!("countdown step {} is not a usable duration: {e}", self.countdown_step_secs))
        })?;
        if step.is_zero() {
            return Err(ControlError::Config("countdown step must be positive".to_string()));
        }
        if step.checked_mul(self.countdown_steps).is_none() {
            return Err(ControlError::Config(format!(
                "countdown of {} steps of {}s overflows",
                self.countdown_steps, self.countdown_step_secs
            )));
        }
        debug!("Click cooldown {:?}, countdown {} x {:?}", cooldown, self.countdown_steps, step);
        Ok(())
    }

    /// Saturates instead of panicking when handed an unvalidated value.
    pub fn click_cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.click_cooldown_secs).unwrap_or(Duration::MAX)
    }

    pub fn countdown_step(&self) -> Duration {
        Duration::try_from_secs_f64(self.countdown_step_secs).unwrap_or(Duration::MAX)
    }
}
