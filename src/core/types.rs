//! Raw sample types as reported by the device.
//!
//! Samples are produced by [`NavDevice`](super::device::NavDevice) on every
//! successful poll and consumed within the same tick.

/// Device-frame AHRS sample
///
/// Angles are in radians, angular rate in rad/s, acceleration in the
/// device's native units and axis convention.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttitudeSample {
    /// Linear acceleration [x, y, z]
    pub accel: [f32; 3],
    /// Angular rate [x, y, z]
    pub gyro: [f32; 3],
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    /// Monotonic timestamp in nanoseconds
    pub time_ns: u64,
}

/// GPS sample with per-field validity flags
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsSample {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    pub lat_lon_valid: bool,
    /// Horizontal accuracy in meters
    pub horizontal_accuracy: f64,
    pub horizontal_accuracy_valid: bool,
    /// Monotonic timestamp in nanoseconds
    pub time_ns: u64,
}
