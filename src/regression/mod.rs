// Sensitivity regression for dimmer calibration
//
// Each trial contributes one observation: the P95 response time measured under
// one configuration vector. Once every trial has run, an ordinary least squares
// fit of response time against the per-component values estimates how strongly
// each component drives tail latency.
//
// Raw slopes are rescaled into [0,1] so components can be ranked against each
// other; the complement of the normalised value is the dimming headroom.

mod coefficients;
mod model;
mod ols;

pub use coefficients::{complement, normalise, Coefficient, DEGENERATE_NORMALISED_VALUE};
pub use model::{Observation, SensitivityModel};
pub use ols::{fit_least_squares, fit_mixture, FitError, InterceptTerm, LinearFit};

#[cfg(test)]
mod tests;
