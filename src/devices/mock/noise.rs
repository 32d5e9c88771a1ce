//! Noise generator for the simulated device
//!
//! Gaussian noise with deterministic seeding support.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Noise generator with configurable seed for reproducibility
#[derive(Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// If seed is 0, uses random entropy; otherwise the sequence is reproducible.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Gaussian noise with given standard deviation
    #[inline]
    pub fn gaussian(&mut self, stddev: f32) -> f32 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Per-axis Gaussian noise around a mean
    pub fn around(&mut self, mean: [f32; 3], stddev: f32) -> [f32; 3] {
        [
            mean[0] + self.gaussian(stddev),
            mean[1] + self.gaussian(stddev),
            mean[2] + self.gaussian(stddev),
        ]
    }
}
