// Ordinary least squares for the sensitivity model
//
// Fits response_time ~ b0 + b1*p1 + ... + bd*pd through the SVD of the design
// matrix. The SVD exposes the numerical rank, so collinear or
// under-determined inputs are reported as a FitError instead of producing
// arbitrary coefficients.
//
// Configurations that sum to one are collinear with the constant column by
// construction. Those are fitted as a mixture: no b0, the constant is carried
// by the slopes.

use crate::regression::model::Observation;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Singular values below this fraction of the largest one count as zero
const RELATIVE_RANK_TOLERANCE: f64 = 1e-10;

/// Reasons a least-squares fit is rejected
///
/// These describe the accumulated data, not a caller bug, so they are
/// returned rather than raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Not enough observations: need at least {required} (one per fitted parameter), got {actual}")]
    NotEnoughObservations { required: usize, actual: usize },

    #[error("Design matrix is ill-conditioned: rank {rank} < {parameters} parameters (collinear configurations?)")]
    IllConditioned { rank: usize, parameters: usize },

    #[error("Observations contain non-finite values")]
    NonFiniteInput,

    #[error("Least-squares solution is not finite")]
    NonFiniteSolution,

    #[error("Least-squares solver failed: {0}")]
    Solver(String),
}

/// Whether the fit carries its own constant term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterceptTerm {
    /// Independent b0 column in the design matrix
    #[default]
    Fitted,
    /// No b0; used when every configuration sums to one
    Absorbed,
}

/// Result of a successful fit
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// Constant term b0 (0.0 when absorbed)
    pub intercept: f64,
    /// One slope per configuration dimension, in dimension order
    pub slopes: Vec<f64>,
    /// Coefficient of determination on the training data
    pub r_squared: f64,
}

impl LinearFit {
    /// Predicted response time for a configuration
    pub fn predict(&self, configuration: &[f64]) -> f64 {
        self.intercept
            + self
                .slopes
                .iter()
                .zip(configuration)
                .map(|(b, p)| b * p)
                .sum::<f64>()
    }
}

/// Fit an intercept plus one slope per dimension to the observations
pub fn fit_least_squares(
    observations: &[Observation],
    dimensions: usize,
) -> Result<LinearFit, FitError> {
    fit_with(observations, dimensions, InterceptTerm::Fitted)
}

/// Fit one slope per dimension and no intercept (Scheffe mixture model)
pub fn fit_mixture(observations: &[Observation], dimensions: usize) -> Result<LinearFit, FitError> {
    fit_with(observations, dimensions, InterceptTerm::Absorbed)
}

pub(crate) fn fit_with(
    observations: &[Observation],
    dimensions: usize,
    term: InterceptTerm,
) -> Result<LinearFit, FitError> {
    let n = observations.len();
    let offset = match term {
        InterceptTerm::Fitted => 1,
        InterceptTerm::Absorbed => 0,
    };
    let parameters = dimensions + offset;

    if n < parameters {
        return Err(FitError::NotEnoughObservations {
            required: parameters,
            actual: n,
        });
    }

    let finite = observations.iter().all(|o| {
        o.response_time().is_finite() && o.configuration().iter().all(|p| p.is_finite())
    });
    if !finite {
        return Err(FitError::NonFiniteInput);
    }

    let design = DMatrix::from_fn(n, parameters, |i, j| {
        if j < offset {
            1.0
        } else {
            observations[i].configuration()[j - offset]
        }
    });
    let response = DVector::from_iterator(n, observations.iter().map(|o| o.response_time()));

    let svd = design.clone().svd(true, true);
    let largest = svd
        .singular_values
        .iter()
        .copied()
        .fold(0.0_f64, f64::max);
    let tolerance = largest * RELATIVE_RANK_TOLERANCE;

    let rank = svd.rank(tolerance);
    if rank < parameters {
        return Err(FitError::IllConditioned { rank, parameters });
    }

    let beta = svd
        .solve(&response, tolerance)
        .map_err(|e| FitError::Solver(e.to_string()))?;

    if !beta.iter().all(|b| b.is_finite()) {
        return Err(FitError::NonFiniteSolution);
    }

    let fitted = &design * &beta;
    let residual = (&response - &fitted).norm_squared();
    let mean = response.mean();
    let total: f64 = response.iter().map(|y| (y - mean).powi(2)).sum();
    let r_squared = if total > 0.0 {
        1.0 - residual / total
    } else {
        1.0
    };

    Ok(LinearFit {
        intercept: if offset == 1 { beta[0] } else { 0.0 },
        slopes: beta.iter().skip(offset).copied().collect(),
        r_squared,
    })
}
