//! GPS sample generation for the simulated device
//!
//! The receiver answers `fix_after_polls` polls without a fix, then reports
//! the configured antenna position with Gaussian jitter. Without a fix the
//! position fields read zero, as the receiver reports them.

use super::config::GpsSimConfig;
use super::noise::NoiseGenerator;
use crate::core::types::GpsSample;

/// Meters per degree of latitude (spherical approximation)
const METERS_PER_DEGREE: f64 = 111_320.0;

pub struct GpsSimulator {
    config: GpsSimConfig,
    noise: NoiseGenerator,
    polls: u32,
}

impl GpsSimulator {
    pub fn new(config: &GpsSimConfig, noise: NoiseGenerator) -> Self {
        Self {
            config: config.clone(),
            noise,
            polls: 0,
        }
    }

    /// Whether the next sample will carry a fix
    pub fn has_fix(&self) -> bool {
        self.config.available && self.polls >= self.config.fix_after_polls
    }

    pub fn sample(&mut self, time_ns: u64) -> GpsSample {
        let fix = self.has_fix();
        self.polls = self.polls.saturating_add(1);

        if !fix {
            return GpsSample {
                time_ns,
                ..GpsSample::default()
            };
        }

        let c = &self.config;
        let north = self.noise.gaussian(c.position_stddev) as f64;
        let east = self.noise.gaussian(c.position_stddev) as f64;
        let lon_scale = METERS_PER_DEGREE * c.latitude.to_radians().cos().max(1e-6);

        GpsSample {
            latitude: c.latitude + north / METERS_PER_DEGREE,
            longitude: c.longitude + east / lon_scale,
            lat_lon_valid: true,
            horizontal_accuracy: c.horizontal_accuracy,
            horizontal_accuracy_valid: c.report_accuracy,
            time_ns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quiet(fix_after_polls: u32) -> GpsSimConfig {
        GpsSimConfig {
            fix_after_polls,
            position_stddev: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_fix_schedule() {
        let mut sim = GpsSimulator::new(&quiet(2), NoiseGenerator::new(1));
        let valid: Vec<bool> = (0..4).map(|i| sim.sample(i).lat_lon_valid).collect();
        assert_eq!(valid, vec![false, false, true, true]);
    }

    #[test]
    fn test_no_fix_reads_zero() {
        let mut sim = GpsSimulator::new(&quiet(1), NoiseGenerator::new(1));
        let s = sim.sample(5);
        assert_eq!(s.latitude, 0.0);
        assert!(!s.horizontal_accuracy_valid);
        assert_eq!(s.time_ns, 5);
    }

    #[test]
    fn test_unavailable_receiver_never_fixes() {
        let config = GpsSimConfig {
            available: false,
            ..Default::default()
        };
        let mut sim = GpsSimulator::new(&config, NoiseGenerator::new(1));
        assert!((0..50).all(|i| !sim.sample(i).lat_lon_valid));
    }

    #[test]
    fn test_position_jitter_is_small() {
        let config = GpsSimConfig {
            position_stddev: 1.0,
            ..Default::default()
        };
        let mut sim = GpsSimulator::new(&config, NoiseGenerator::new(9));
        for i in 0..100 {
            let s = sim.sample(i);
            // 10 m is far beyond any plausible 1 m jitter draw
            assert_abs_diff_eq!(s.latitude, config.latitude, epsilon = 10.0 / METERS_PER_DEGREE);
            assert_eq!(s.horizontal_accuracy, 2.5);
        }
    }
}
