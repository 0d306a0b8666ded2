//! Low-discrepancy (Halton) stratified sampling
//!
//! The Halton sequence maps the trial index `i` to the radical inverse of `i`
//! in the j-th prime base for dimension `j`. For a known, fixed trial count this
//! covers the unit cube far more evenly than independent draws, which matters
//! when the regression only ever sees tens to hundreds of points.
//!
//! Plain Halton points in neighbouring high prime bases are strongly
//! correlated. [`Scramble::Owen`] applies nested random digit permutations
//! (Owen-type scrambling): the permutation applied to digit `k` depends on the
//! dimension, the digit position and every less significant digit already
//! consumed. Each permutation is derived from the scramble seed, so a seeded
//! scramble is reproducible.

use super::{ConfigurationVector, Sampler};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Digit scrambling applied to the Halton points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scramble {
    /// Plain radical inverse
    None,
    /// Nested random digit permutations derived from `seed`
    Owen { seed: u64 },
}

/// Finite, precomputed Halton point set consumed one row per trial
///
/// The sampler holds exactly `num_iterations` points. It is an iterator over
/// the remaining rows; [`Sampler::sample`] panics once the rows are exhausted
/// because drawing more trials than were planned is a caller bug. The sequence
/// cannot be restarted.
#[derive(Debug, Clone)]
pub struct HaltonSampler {
    dimensions: usize,
    points: Vec<ConfigurationVector>,
    cursor: usize,
}

impl HaltonSampler {
    /// Precompute `num_iterations` points in `dimensions` dimensions
    pub fn new(num_iterations: usize, dimensions: usize, scramble: Scramble) -> Self {
        let bases = first_primes(dimensions);

        let points = (1..=num_iterations as u64)
            .map(|index| {
                bases
                    .iter()
                    .enumerate()
                    .map(|(dim, &base)| match scramble {
                        Scramble::None => radical_inverse(index, base),
                        Scramble::Owen { seed } => owen_radical_inverse(index, base, dim, seed),
                    })
                    .collect()
            })
            .collect();

        HaltonSampler {
            dimensions,
            points,
            cursor: 0,
        }
    }

    /// Total number of points in the sequence
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the sequence holds no points at all
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points not yet consumed
    pub fn remaining(&self) -> usize {
        self.points.len() - self.cursor
    }
}

impl Iterator for HaltonSampler {
    type Item = ConfigurationVector;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.points.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for HaltonSampler {}

impl Sampler for HaltonSampler {
    fn sample(&mut self) -> ConfigurationVector {
        let total = self.points.len();
        self.next()
            .unwrap_or_else(|| panic!("cannot sample past the {total} precomputed Halton points"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Van der Corput radical inverse of `index` in `base`
fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut value = 0.0;

    while index > 0 {
        value += (index % base) as f64 * factor;
        index /= base;
        factor *= inv_base;
    }

    value
}

/// Radical inverse with nested digit permutations
///
/// Digits beyond the most significant digit of `index` are zero but are still
/// permuted, down to double precision, so the scrambled point is not confined
/// to the coarse grid of the plain sequence.
fn owen_radical_inverse(mut index: u64, base: u64, dim: usize, seed: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut value = 0.0;
    let mut prefix = splitmix64(seed ^ splitmix64(dim as u64));
    let mut position = 0u64;

    while factor > f64::EPSILON {
        let digit = index % base;
        index /= base;

        let node = splitmix64(prefix ^ position.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut permutation: Vec<u64> = (0..base).collect();
        permutation.shuffle(&mut StdRng::seed_from_u64(node));

        value += permutation[digit as usize] as f64 * factor;

        prefix = splitmix64(prefix ^ digit.wrapping_add(1));
        position += 1;
        factor *= inv_base;
    }

    value
}

/// SplitMix64 finaliser, used to derive per-node permutation seeds
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// First `n` prime numbers
fn first_primes(n: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(n);
    let mut candidate = 2u64;

    while primes.len() < n {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }

    primes
}
