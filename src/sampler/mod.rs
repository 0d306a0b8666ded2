// Configuration sampling for calibration trials
//
// Every trial needs one point in the unit cube [0,1]^d, one coordinate per
// dimmable component. Three strategies are provided:
//
// - Uniform:   independent pseudorandom draws, no cross-dimension constraint
// - Halton:    precomputed low-discrepancy points for a fixed trial count
// - Dirichlet: symmetric Dirichlet(1, ..., 1), coordinates sum to one
//
// Uniform and Halton points are independent intensities; Dirichlet points are
// mutually exclusive allocations. The two contracts are not interchangeable, so
// the strategy is chosen once per run and reported with the results.

mod dirichlet;
mod halton;
mod uniform;

pub use dirichlet::DirichletSampler;
pub use halton::{HaltonSampler, Scramble};
pub use uniform::UniformSampler;

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-component values for one trial, positionally bound to the component paths
pub type ConfigurationVector = Vec<f64>;

/// Source of configuration vectors, one call per trial
pub trait Sampler {
    /// Draw the configuration for the next trial
    fn sample(&mut self) -> ConfigurationVector;

    /// Number of components each vector covers
    fn dimensions(&self) -> usize;

    /// What every vector from this sampler satisfies
    fn invariant(&self) -> SampleInvariant {
        SampleInvariant::Independent
    }
}

impl Sampler for Box<dyn Sampler> {
    fn sample(&mut self) -> ConfigurationVector {
        (**self).sample()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn invariant(&self) -> SampleInvariant {
        (**self).invariant()
    }
}

/// Sampling strategy, selected through configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SamplerStrategy {
    /// Independent uniform draws per component
    Uniform,
    /// Low-discrepancy Halton points for a fixed number of trials
    Halton,
    /// Symmetric Dirichlet draws that sum to one
    Dirichlet,
}

/// What downstream consumers may assume about a sampled vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleInvariant {
    /// Each coordinate lies in [0,1] independently of the others
    Independent,
    /// Coordinates are non-negative and sum to one
    SumToOne,
}

impl SamplerStrategy {
    /// Invariant guaranteed by vectors from this strategy
    pub fn invariant(self) -> SampleInvariant {
        match self {
            SamplerStrategy::Uniform | SamplerStrategy::Halton => SampleInvariant::Independent,
            SamplerStrategy::Dirichlet => SampleInvariant::SumToOne,
        }
    }
}

impl std::fmt::Display for SamplerStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SamplerStrategy::Uniform => "uniform",
            SamplerStrategy::Halton => "halton",
            SamplerStrategy::Dirichlet => "dirichlet",
        };
        f.write_str(name)
    }
}

/// Build the sampler for a run
///
/// `seed` pins the pseudorandom streams (uniform draws, Dirichlet draws and the
/// Halton scramble). Without it the uniform and Dirichlet samplers seed from
/// the wall clock so repeated runs explore different points.
pub fn build_sampler(
    strategy: SamplerStrategy,
    num_iterations: usize,
    dimensions: usize,
    scramble: Scramble,
    seed: Option<u64>,
) -> Box<dyn Sampler> {
    match strategy {
        SamplerStrategy::Uniform => Box::new(match seed {
            Some(seed) => UniformSampler::with_seed(dimensions, seed),
            None => UniformSampler::new(dimensions),
        }),
        SamplerStrategy::Halton => {
            let scramble = match (scramble, seed) {
                (Scramble::Owen { .. }, Some(seed)) => Scramble::Owen { seed },
                (other, _) => other,
            };
            Box::new(HaltonSampler::new(num_iterations, dimensions, scramble))
        }
        SamplerStrategy::Dirichlet => Box::new(match seed {
            Some(seed) => DirichletSampler::with_seed(dimensions, seed),
            None => DirichletSampler::new(dimensions),
        }),
    }
}

/// Seed derived from the current wall-clock time
pub(crate) fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
