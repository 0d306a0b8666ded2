// Coefficient rescaling
//
// Raw slopes are in seconds per unit of dimming and are not comparable on their
// own, so they are min-max normalised into [0,1]: the most latency-sensitive
// component maps to 1.0 and the least sensitive to 0.0. The complement
// (1 - normalised) is the dimming headroom consumed by the dimmer.

use serde::{Deserialize, Serialize};

/// Value given to every component when all raw coefficients are equal
///
/// With max == min there is no ordering to express, so every component is
/// treated as equally sensitive.
pub const DEGENERATE_NORMALISED_VALUE: f64 = 0.5;

/// Spreads at or below this fraction of the largest magnitude count as max == min
///
/// Least-squares slopes for equally sensitive components differ only by
/// rounding noise, which would otherwise be stretched across [0,1].
const DEGENERATE_RELATIVE_SPREAD: f64 = 1e-9;

/// A per-component value from the fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Component identifier (dimmable path)
    pub path: String,
    /// Slope, normalised slope or complement, depending on the producer
    pub value: f64,
}

impl Coefficient {
    pub fn new(path: impl Into<String>, value: f64) -> Self {
        Coefficient {
            path: path.into(),
            value,
        }
    }
}

/// Min-max normalise coefficients into [0,1], keeping their order
///
/// `(c - min) / (max - min)`; if every coefficient is equal (up to rounding
/// noise) the result is [`DEGENERATE_NORMALISED_VALUE`] for all of them.
pub fn normalise(coefficients: &[Coefficient]) -> Vec<Coefficient> {
    let min = coefficients
        .iter()
        .map(|c| c.value)
        .fold(f64::INFINITY, f64::min);
    let max = coefficients
        .iter()
        .map(|c| c.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let scale = min.abs().max(max.abs());
    let degenerate = !(range > DEGENERATE_RELATIVE_SPREAD * scale);

    coefficients
        .iter()
        .map(|c| {
            let value = if !degenerate {
                (c.value - min) / range
            } else {
                DEGENERATE_NORMALISED_VALUE
            };
            Coefficient::new(c.path.clone(), value)
        })
        .collect()
}

/// `1 - c` for each normalised coefficient
pub fn complement(normalised: &[Coefficient]) -> Vec<Coefficient> {
    normalised
        .iter()
        .map(|c| Coefficient::new(c.path.clone(), 1.0 - c.value))
        .collect()
}
