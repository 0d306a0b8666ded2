//! Independent uniform sampling

use super::{wall_clock_seed, ConfigurationVector, Sampler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws every coordinate independently from U[0,1)
///
/// Coordinates do not sum to one. Over a small number of trials the points
/// cluster unevenly; prefer [`super::HaltonSampler`] when the trial count is
/// known up front.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    dimensions: usize,
    rng: StdRng,
}

impl UniformSampler {
    /// Create a sampler seeded from the wall clock
    pub fn new(dimensions: usize) -> Self {
        Self::with_seed(dimensions, wall_clock_seed())
    }

    /// Create a reproducible sampler
    pub fn with_seed(dimensions: usize, seed: u64) -> Self {
        UniformSampler {
            dimensions,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for UniformSampler {
    fn sample(&mut self) -> ConfigurationVector {
        (0..self.dimensions).map(|_| self.rng.gen::<f64>()).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
