//! Symmetric Dirichlet sampling
//!
//! Used when the per-path values are mutually exclusive allocations rather than
//! independent intensities: every vector is non-negative and sums to one.

use super::{wall_clock_seed, ConfigurationVector, SampleInvariant, Sampler};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Dirichlet, Distribution};

/// Concentration applied to every component (uniform over the simplex)
const CONCENTRATION: f64 = 1.0;

/// Draws from Dirichlet(1, ..., 1)
#[derive(Debug, Clone)]
pub struct DirichletSampler {
    dimensions: usize,
    /// `None` for a single component, where the simplex is the point `[1.0]`
    distribution: Option<Dirichlet<f64>>,
    rng: StdRng,
}

impl DirichletSampler {
    /// Create a sampler seeded from the wall clock
    pub fn new(dimensions: usize) -> Self {
        Self::with_seed(dimensions, wall_clock_seed())
    }

    /// Create a reproducible sampler
    pub fn with_seed(dimensions: usize, seed: u64) -> Self {
        // rand_distr only accepts two or more components; the concentration is a
        // positive constant, so construction cannot fail past that check.
        let distribution = if dimensions >= 2 {
            Dirichlet::new_with_size(CONCENTRATION, dimensions).ok()
        } else {
            None
        };

        DirichletSampler {
            dimensions,
            distribution,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for DirichletSampler {
    fn sample(&mut self) -> ConfigurationVector {
        match &self.distribution {
            Some(distribution) => distribution.sample(&mut self.rng),
            None => vec![1.0; self.dimensions],
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn invariant(&self) -> SampleInvariant {
        SampleInvariant::SumToOne
    }
}
