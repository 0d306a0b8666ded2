// Load generator remote control
//
// The calibration loop only needs three verbs from the load generator: resume,
// pause and set the number of virtual users. The k6 REST API is the supported
// driver; the trait keeps the ramp and orchestration logic independent of it.

mod k6;

pub use k6::K6Generator;

use crate::http::ApiError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure controlling the load generator
#[derive(Error, Debug)]
pub enum LoadGeneratorError {
    /// The generator refused because it is already at rest (paused or never started)
    #[error("Load generator is not running: {0}")]
    NotRunning(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Remote control over a running load test
pub trait LoadGenerator {
    /// Resume generating load
    fn start(&mut self) -> Result<(), LoadGeneratorError>;

    /// Pause generating load
    fn stop(&mut self) -> Result<(), LoadGeneratorError>;

    /// Set the load intensity (virtual users)
    fn set_level(&mut self, level: u32) -> Result<(), LoadGeneratorError>;
}

/// Supported load generator drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadGeneratorDriver {
    K6,
}
