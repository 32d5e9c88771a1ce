//! Simulated device configuration
//!
//! Every parameter has a default, so `[device.simulation]` can be omitted
//! entirely.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! SimulationConfig
//! ├── random_seed                    # 0 = random each run
//! ├── AttitudeSimConfig              # Static attitude + noise
//! │   ├── roll, pitch, yaw
//! │   └── orientation/accel/gyro stddev
//! ├── GpsSimConfig                   # Fix schedule + position jitter
//! │   ├── latitude, longitude
//! │   ├── fix_after_polls, available
//! │   └── horizontal_accuracy, report_accuracy
//! └── failures                       # Scripted command failures
//! ```
//!
//! Example:
//!
//! ```toml
//! [device.simulation]
//! random_seed = 42
//!
//! [device.simulation.gps]
//! latitude = 48.1351
//! longitude = 11.5820
//! fix_after_polls = 30
//!
//! [[device.simulation.failures]]
//! command = "poll_gps"
//! after = 100
//! count = 5
//! message = "GPS receiver busy"
//! ```

use super::Call;
use serde::Deserialize;

// ============================================================================
// Attitude
// ============================================================================

/// Static attitude with Gaussian noise (device frame, radians)
#[derive(Debug, Clone, Deserialize)]
pub struct AttitudeSimConfig {
    #[serde(default)]
    pub roll: f32,

    #[serde(default)]
    pub pitch: f32,

    /// Heading in [-π, π]
    #[serde(default)]
    pub yaw: f32,

    /// Euler angle noise standard deviation (radians)
    #[serde(default = "default_orientation_stddev")]
    pub orientation_stddev: f32,

    /// Accelerometer noise standard deviation (m/s²)
    #[serde(default = "default_accel_stddev")]
    pub accel_stddev: f32,

    /// Gyroscope noise standard deviation (rad/s)
    #[serde(default = "default_gyro_stddev")]
    pub gyro_stddev: f32,
}

fn default_orientation_stddev() -> f32 {
    0.002
}
fn default_accel_stddev() -> f32 {
    0.02
}
fn default_gyro_stddev() -> f32 {
    0.001
}

impl Default for AttitudeSimConfig {
    fn default() -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            orientation_stddev: default_orientation_stddev(),
            accel_stddev: default_accel_stddev(),
            gyro_stddev: default_gyro_stddev(),
        }
    }
}

// ============================================================================
// GPS
// ============================================================================

/// Receiver position and fix schedule
#[derive(Debug, Clone, Deserialize)]
pub struct GpsSimConfig {
    /// Antenna latitude (degrees)
    #[serde(default = "default_latitude")]
    pub latitude: f64,

    /// Antenna longitude (degrees)
    #[serde(default = "default_longitude")]
    pub longitude: f64,

    /// Receiver ever obtains a fix
    #[serde(default = "default_true")]
    pub available: bool,

    /// GPS polls answered without a fix before one is acquired
    #[serde(default)]
    pub fix_after_polls: u32,

    /// Reported horizontal accuracy (meters)
    #[serde(default = "default_horizontal_accuracy")]
    pub horizontal_accuracy: f64,

    /// Report accuracy as valid while a fix is held
    #[serde(default = "default_true")]
    pub report_accuracy: bool,

    /// Horizontal position jitter standard deviation (meters)
    #[serde(default = "default_position_stddev")]
    pub position_stddev: f32,
}

fn default_latitude() -> f64 {
    48.1351
}
fn default_longitude() -> f64 {
    11.5820
}
fn default_horizontal_accuracy() -> f64 {
    2.5
}
fn default_position_stddev() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}

impl Default for GpsSimConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            available: true,
            fix_after_polls: 0,
            horizontal_accuracy: default_horizontal_accuracy(),
            report_accuracy: true,
            position_stddev: default_position_stddev(),
        }
    }
}

// ============================================================================
// Scripted failures
// ============================================================================

/// One scripted failure rule
#[derive(Debug, Clone, Deserialize)]
pub struct FailureConfig {
    /// Command that fails
    pub command: Call,

    /// Successful calls let through before failing
    #[serde(default)]
    pub after: u32,

    /// Number of failures (omitted = every call from then on)
    #[serde(default)]
    pub count: Option<u32>,

    /// Message queued on the device error queue
    #[serde(default = "default_failure_message")]
    pub message: String,
}

fn default_failure_message() -> String {
    "simulated failure".to_string()
}

// ============================================================================
// Root Simulation Configuration
// ============================================================================

/// Root simulation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationConfig {
    /// Random seed for reproducible noise (0 = random each run)
    #[serde(default)]
    pub random_seed: u64,

    #[serde(default)]
    pub attitude: AttitudeSimConfig,

    #[serde(default)]
    pub gps: GpsSimConfig,

    #[serde(default)]
    pub failures: Vec<FailureConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: SimulationConfig = toml::from_str("").unwrap();
        assert_eq!(config.random_seed, 0);
        assert_eq!(config.gps.fix_after_polls, 0);
        assert!(config.gps.available);
        assert_eq!(config.attitude.orientation_stddev, 0.002);
        assert!(config.failures.is_empty());
    }

    #[test]
    fn test_failure_rules() {
        let config: SimulationConfig = toml::from_str(
            r#"
random_seed = 7

[gps]
fix_after_polls = 30

[[failures]]
command = "self_test"
message = "sensor fault"

[[failures]]
command = "poll_gps"
after = 100
count = 5
"#,
        )
        .unwrap();

        assert_eq!(config.random_seed, 7);
        assert_eq!(config.gps.fix_after_polls, 30);
        assert_eq!(config.failures.len(), 2);
        assert_eq!(config.failures[0].command, Call::SelfTest);
        assert_eq!(config.failures[0].count, None);
        assert_eq!(config.failures[1].command, Call::PollGps);
        assert_eq!(config.failures[1].after, 100);
        assert_eq!(config.failures[1].count, Some(5));
        assert_eq!(config.failures[1].message, "simulated failure");
    }
}
