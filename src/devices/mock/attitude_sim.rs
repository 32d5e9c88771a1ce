//! AHRS sample generation for the simulated device
//!
//! ## Device frame
//!
//! - **X = forward**, **Y = right**, **Z = down**
//! - Stationary accelerometer reads -g on Z
//! - Euler angles in radians, yaw in [-π, π]

use super::config::AttitudeSimConfig;
use super::noise::NoiseGenerator;
use crate::core::types::AttitudeSample;
use std::f32::consts::PI;

/// Standard gravity (m/s²)
const GRAVITY: f32 = 9.80665;

pub struct AttitudeSimulator {
    config: AttitudeSimConfig,
    noise: NoiseGenerator,
}

impl AttitudeSimulator {
    pub fn new(config: &AttitudeSimConfig, noise: NoiseGenerator) -> Self {
        Self {
            config: config.clone(),
            noise,
        }
    }

    /// Generate one noisy sample of a stationary sensor
    pub fn sample(&mut self, time_ns: u64) -> AttitudeSample {
        let c = &self.config;
        let stddev = c.orientation_stddev;

        let roll = c.roll + self.noise.gaussian(stddev);
        let pitch = c.pitch + self.noise.gaussian(stddev);
        let yaw = wrap_pi(c.yaw + self.noise.gaussian(stddev));

        AttitudeSample {
            accel: self.noise.around([0.0, 0.0, -GRAVITY], c.accel_stddev),
            gyro: self.noise.around([0.0; 3], c.gyro_stddev),
            roll,
            pitch,
            yaw,
            time_ns,
        }
    }
}

/// Keep the heading inside the device's reporting range
fn wrap_pi(angle: f32) -> f32 {
    let mut a = angle;
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_noise_free_sample() {
        let config = AttitudeSimConfig {
            roll: 0.1,
            pitch: -0.2,
            yaw: 1.0,
            orientation_stddev: 0.0,
            accel_stddev: 0.0,
            gyro_stddev: 0.0,
        };
        let mut sim = AttitudeSimulator::new(&config, NoiseGenerator::new(1));
        let s = sim.sample(42);

        assert_eq!(s.roll, 0.1);
        assert_eq!(s.pitch, -0.2);
        assert_eq!(s.yaw, 1.0);
        assert_eq!(s.accel, [0.0, 0.0, -GRAVITY]);
        assert_eq!(s.gyro, [0.0; 3]);
        assert_eq!(s.time_ns, 42);
    }

    #[test]
    fn test_yaw_stays_in_range() {
        let config = AttitudeSimConfig {
            yaw: PI,
            orientation_stddev: 0.5,
            ..Default::default()
        };
        let mut sim = AttitudeSimulator::new(&config, NoiseGenerator::new(3));
        for i in 0..200 {
            let yaw = sim.sample(i).yaw;
            assert!((-PI..=PI).contains(&yaw), "yaw {} out of range", yaw);
        }
    }

    #[test]
    fn test_wrap_pi() {
        assert_relative_eq!(wrap_pi(PI + 0.5), -PI + 0.5, epsilon = 1e-6);
        assert_relative_eq!(wrap_pi(-PI - 0.5), PI - 0.5, epsilon = 1e-6);
        assert_eq!(wrap_pi(0.3), 0.3);
    }
}
