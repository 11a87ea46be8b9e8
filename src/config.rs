use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use tagsim_kinematics::Segment;
use tagsim_protocol::{CornerTag, TAG_DATA_PORT, WAYPOINT_MSG_PORT};

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "TAGSIM";
const ARENA_HALF_WIDTH: f64 = 100.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub network: NetworkSettings,
    pub rates: RateSettings,
    pub robot: RobotSettings,
    pub autonomy: AutonomySettings,
    pub arena: ArenaSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub host: String,
    pub tag_port: u16,
    pub waypoint_port: u16,
    pub connect_timeout_ms: u64,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            tag_port: TAG_DATA_PORT,
            waypoint_port: WAYPOINT_MSG_PORT,
            connect_timeout_ms: 2_000,
            backoff_initial_ms: 250,
            backoff_max_ms: 5_000,
        }
    }
}

impl NetworkSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Timer rates in Hz, plus the idle tick spacing of the real-time loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateSettings {
    pub status_hz: f64,
    pub laser_hz: f64,
    pub frame_hz: f64,
    pub auto_hz: f64,
    pub poll_ms: u64,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            status_hz: 1.0,
            laser_hz: 15.0,
            frame_hz: 20.0,
            auto_hz: 20.0,
            poll_ms: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RobotSettings {
    pub start_x: f64,
    pub start_y: f64,
    pub start_heading: f64,
    pub step_size: f64,
    /// Largest heading change per frame (rad).
    pub turn_step: f64,
    pub tag_id: u32,
    pub tag_size: f64,
    pub laser_max_range: f64,
    /// Half-width of the uniform noise added to laser readings.
    pub laser_noise: f64,
    pub laser_seed: u64,
}

impl Default for RobotSettings {
    fn default() -> Self {
        Self {
            start_x: 0.0,
            start_y: 0.0,
            start_heading: 0.0,
            step_size: 1.0,
            turn_step: 0.2,
            tag_id: 4,
            tag_size: 2.0,
            laser_max_range: 300.0,
            laser_noise: 0.5,
            laser_seed: 464,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutonomySettings {
    /// Bound on each autonomous move, in unit steps.
    pub max_steps: f64,
    pub arrival_tolerance: f64,
}

impl Default for AutonomySettings {
    fn default() -> Self {
        Self {
            max_steps: 1.0,
            arrival_tolerance: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub walls: Vec<[[f64; 2]; 2]>,
    pub corner_tags: Vec<CornerTag>,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        let h = ARENA_HALF_WIDTH;
        let corners = [[-h, -h], [h, -h], [h, h], [-h, h]];
        let walls = (0..4).map(|i| [corners[i], corners[(i + 1) % 4]]).collect();
        let corner_tags = corners
            .iter()
            .zip(0u32..)
            .map(|([x, y], id)| CornerTag { id, x: *x, y: *y })
            .collect();
        Self { walls, corner_tags }
    }
}

impl ArenaSettings {
    pub fn segments(&self) -> Result<Vec<Segment>> {
        self.walls
            .iter()
            .enumerate()
            .map(|(index, [a, b])| {
                Segment::new((a[0], a[1]), (b[0], b[1])).map_err(|source| AppError::Wall { index, source })
            })
            .collect()
    }
}

impl Settings {
    /// Rejects settings the simulator cannot run with.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("rates.status_hz", self.rates.status_hz),
            ("rates.laser_hz", self.rates.laser_hz),
            ("rates.frame_hz", self.rates.frame_hz),
            ("rates.auto_hz", self.rates.auto_hz),
        ];
        for (key, hz) in rates {
            if !(hz.is_finite() && hz > 0.0) {
                return Err(AppError::InvalidSetting {
                    key,
                    reason: format!("rate must be positive, got {hz}"),
                });
            }
        }
        if self.rates.poll_ms == 0 {
            return Err(AppError::InvalidSetting {
                key: "rates.poll_ms",
                reason: "poll interval must be at least 1 ms".to_string(),
            });
        }
        if !(self.robot.step_size.is_finite() && self.robot.step_size > 0.0) {
            return Err(AppError::InvalidSetting {
                key: "robot.step_size",
                reason: format!("step must be positive, got {}", self.robot.step_size),
            });
        }
        if !(self.robot.laser_noise.is_finite() && self.robot.laser_noise >= 0.0) {
            return Err(AppError::InvalidSetting {
                key: "robot.laser_noise",
                reason: format!("noise must be non-negative, got {}", self.robot.laser_noise),
            });
        }
        let start = [
            ("robot.start_x", self.robot.start_x),
            ("robot.start_y", self.robot.start_y),
            ("robot.start_heading", self.robot.start_heading),
        ];
        for (key, value) in start {
            if !value.is_finite() {
                return Err(AppError::InvalidSetting {
                    key,
                    reason: format!("start pose must be finite, got {value}"),
                });
            }
        }
        if !(self.robot.turn_step.is_finite() && self.robot.turn_step >= 0.0) {
            return Err(AppError::InvalidSetting {
                key: "robot.turn_step",
                reason: format!("turn step must be non-negative, got {}", self.robot.turn_step),
            });
        }
        if self.arena.corner_tags.iter().any(|tag| tag.id == self.robot.tag_id) {
            return Err(AppError::InvalidSetting {
                key: "robot.tag_id",
                reason: format!("tag id {} is also a corner tag", self.robot.tag_id),
            });
        }
        if self.network.host.trim().is_empty() {
            return Err(AppError::InvalidSetting {
                key: "network.host",
                reason: "host must not be empty".to_string(),
            });
        }
        if self.network.connect_timeout_ms == 0 {
            return Err(AppError::InvalidSetting {
                key: "network.connect_timeout_ms",
                reason: "connect timeout must be at least 1 ms".to_string(),
            });
        }
        if self.network.backoff_initial_ms == 0 {
            return Err(AppError::InvalidSetting {
                key: "network.backoff_initial_ms",
                reason: "reconnect backoff must be at least 1 ms".to_string(),
            });
        }
        if self.network.backoff_max_ms < self.network.backoff_initial_ms {
            return Err(AppError::InvalidSetting {
                key: "network.backoff_max_ms",
                reason: format!(
                    "maximum backoff {} ms is below the initial {} ms",
                    self.network.backoff_max_ms, self.network.backoff_initial_ms
                ),
            });
        }
        Ok(())
    }
}

/// Loads settings: built-in defaults, then the TOML file, then `TAGSIM__*`
/// environment variables, then the command-line host.
///
/// The file is optional when no path is given explicitly.
pub fn load_settings(path: Option<&str>, host: Option<&str>) -> Result<Settings> {
    let (file_path, required) = match path {
        Some(p) => (p, true),
        None => (DEFAULT_CONFIG_PATH, false),
    };
    info!("Attempting to load configuration from {}", file_path);

    let mut builder = Config::builder()
        .add_source(File::new(file_path, FileFormat::Toml).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
    if let Some(host) = host {
        builder = builder.set_override("network.host", host)?;
    }

    let settings = builder.build().and_then(|c| c.try_deserialize::<Settings>());
    match settings {
        Ok(settings) => {
            settings.validate()?;
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}
