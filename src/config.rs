//! Configuration loading for DishaIO
//!
//! Every field has a default, so an empty TOML file yields the same
//! configuration as [`Config::default`]:
//!
//! ```toml
//! [device]
//! type = "mock"
//! port = "/dev/ttyACM0"
//! baud_rate = 115200
//! declination = 0
//! command_timeout_ms = 500
//!
//! [frames]
//! frame_id = "/imu"
//! child_frame_id = "/base_footprint"
//!
//! [acquisition]
//! rate_hz = 10.0
//!
//! [outputs]
//! publish_imu = true
//! publish_pose = true
//! publish_gps = true
//! publish_gps_as_odom = true
//!
//! [noise]
//! linear_acceleration_stdev = 0.098
//! orientation_stdev = 0.035
//! angular_velocity_stdev = 0.012
//!
//! [transform]
//! orientation_convention = "device_coupled"
//!
//! [streaming]
//! wire_format = "json"
//! admin_address = "127.0.0.1:5560"
//!
//! [[streaming.targets]]
//! address = "127.0.0.1:5561"
//! topics = ["imu/data", "gps/fix"]
//! ```

use crate::core::sink::Topic;
use crate::devices::mock::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::streaming::WireFormat;
use crate::transform::OrientationConvention;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Slowest accepted acquisition rate: one tick per day
pub const MIN_RATE_HZ: f64 = 1.0 / 86_400.0;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub frames: FrameConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub outputs: OutputConfig,
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

/// Sensor connection and lifecycle settings
#[derive(Clone, Debug, Deserialize)]
pub struct DeviceConfig {
    /// Device driver type (only "mock" ships with this crate)
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,

    /// Serial port path
    #[serde(default = "default_port")]
    pub port: String,

    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Magnetic declination used to seed the device filter (degrees)
    #[serde(default)]
    pub declination: i32,

    /// Command timeout applied during initialization (milliseconds)
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Simulated device parameters (used when `type = "mock"`)
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl DeviceConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            port: default_port(),
            baud_rate: default_baud_rate(),
            declination: 0,
            command_timeout_ms: default_command_timeout_ms(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Frame identifiers stamped on published outputs
#[derive(Clone, Debug, Deserialize)]
pub struct FrameConfig {
    #[serde(default = "default_frame_id")]
    pub frame_id: String,

    /// Child frame of the GPS odometry output
    #[serde(default = "default_child_frame_id")]
    pub child_frame_id: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_id: default_frame_id(),
            child_frame_id: default_child_frame_id(),
        }
    }
}

/// Polling loop settings
#[derive(Clone, Debug, Deserialize)]
pub struct AcquisitionConfig {
    /// Poll rate in Hz
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
        }
    }
}

/// Output enable switches
#[derive(Clone, Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub publish_imu: bool,
    #[serde(default = "default_true")]
    pub publish_pose: bool,
    #[serde(default = "default_true")]
    pub publish_gps: bool,
    #[serde(default = "default_true")]
    pub publish_gps_as_odom: bool,
}

impl OutputConfig {
    /// Attitude data is needed by the imu or pose output
    pub fn wants_attitude(&self) -> bool {
        self.publish_imu || self.publish_pose
    }

    /// GPS data is needed by the raw fix or odometry output
    pub fn wants_gps(&self) -> bool {
        self.publish_gps || self.publish_gps_as_odom
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            publish_imu: true,
            publish_pose: true,
            publish_gps: true,
            publish_gps_as_odom: true,
        }
    }
}

/// Standard deviations used to build the fixed attitude covariances
#[derive(Clone, Debug, Deserialize)]
pub struct NoiseConfig {
    #[serde(default = "default_linear_acceleration_stdev")]
    pub linear_acceleration_stdev: f64,
    #[serde(default = "default_orientation_stdev")]
    pub orientation_stdev: f64,
    #[serde(default = "default_angular_velocity_stdev")]
    pub angular_velocity_stdev: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            linear_acceleration_stdev: default_linear_acceleration_stdev(),
            orientation_stdev: default_orientation_stdev(),
            angular_velocity_stdev: default_angular_velocity_stdev(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub orientation_convention: OrientationConvention,
}

/// Result sink and admin endpoint settings
#[derive(Clone, Debug, Deserialize)]
pub struct StreamingConfig {
    #[serde(default)]
    pub wire_format: WireFormat,

    /// UDP consumers and the topics each one subscribes to
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    /// TCP bind address for admin requests (reset filter); disabled when absent
    #[serde(default = "default_admin_address")]
    pub admin_address: Option<String>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            wire_format: WireFormat::default(),
            targets: Vec::new(),
            admin_address: default_admin_address(),
        }
    }
}

/// A single UDP consumer
#[derive(Clone, Debug, Deserialize)]
pub struct TargetConfig {
    pub address: String,
    #[serde(default = "all_topics")]
    pub topics: Vec<Topic>,
}

// Default value functions
fn default_device_type() -> String {
    "mock".to_string()
}
fn default_port() -> String {
    "/dev/ttyACM0".to_string()
}
fn default_baud_rate() -> u32 {
    115200
}
fn default_command_timeout_ms() -> u64 {
    500
}
fn default_frame_id() -> String {
    "/imu".to_string()
}
fn default_child_frame_id() -> String {
    "/base_footprint".to_string()
}
fn default_rate_hz() -> f64 {
    10.0
}
fn default_true() -> bool {
    true
}
fn default_linear_acceleration_stdev() -> f64 {
    0.098
}
fn default_orientation_stdev() -> f64 {
    0.035
}
fn default_angular_velocity_stdev() -> f64 {
    0.012
}
fn default_admin_address() -> Option<String> {
    Some("127.0.0.1:5560".to_string())
}
fn all_topics() -> Vec<Topic> {
    Topic::ALL.to_vec()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the acquisition loop cannot work with
    pub fn validate(&self) -> Result<()> {
        let rate_hz = self.acquisition.rate_hz;
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return Err(Error::Config(format!(
                "acquisition.rate_hz must be positive, got {}",
                rate_hz
            )));
        }
        if rate_hz < MIN_RATE_HZ {
            return Err(Error::Config(format!(
                "acquisition.rate_hz must be at least {} (one tick per day), got {}",
                MIN_RATE_HZ, rate_hz
            )));
        }

        let stdevs = [
            ("linear_acceleration_stdev", self.noise.linear_acceleration_stdev),
            ("orientation_stdev", self.noise.orientation_stdev),
            ("angular_velocity_stdev", self.noise.angular_velocity_stdev),
        ];
        for (name, value) in stdevs {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Config(format!(
                    "noise.{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        if self.device.baud_rate == 0 {
            return Err(Error::Config("device.baud_rate must be non-zero".to_string()));
        }

        Ok(())
    }
}
