//! Client for the dimmer's admin API
//!
//! | Call | Effect |
//! |------|--------|
//! | `DELETE /probabilities` | clear every path probability |
//! | `POST /probabilities` | replace the rule set |
//! | `POST {training}` | start the latency collector |
//! | `DELETE {training}` | stop the collector (clears its stats) |
//! | `GET {training}/stats` | P50/P75/P95 in seconds |

use crate::http::{ApiError, HttpEndpoint};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default collector resource on the admin API
pub const DEFAULT_TRAINING_RESOURCE: &str = "/training";

/// Probability of dimming one path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathProbabilityRule {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Probability")]
    pub probability: f64,
}

impl PathProbabilityRule {
    /// Pair each configuration value with its path, by position
    pub fn from_configuration(paths: &[String], configuration: &[f64]) -> Vec<Self> {
        paths
            .iter()
            .zip(configuration)
            .map(|(path, &probability)| PathProbabilityRule {
                path: path.clone(),
                probability,
            })
            .collect()
    }
}

/// Latency percentiles reported by the collector, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimes {
    #[serde(rename = "P50")]
    pub p50: f64,
    #[serde(rename = "P75")]
    pub p75: f64,
    #[serde(rename = "P95")]
    pub p95: f64,
}

/// Admin operations the calibration loop needs from the system under test
pub trait DimmerAdmin {
    /// Remove every configured path probability
    fn clear_probabilities(&mut self) -> Result<(), ApiError>;

    /// Replace the configured rules with `rules`
    fn set_probabilities(&mut self, rules: &[PathProbabilityRule]) -> Result<(), ApiError>;

    /// Begin recording response-time percentiles
    fn start_collector(&mut self) -> Result<(), ApiError>;

    /// Stop recording; the collected stats are discarded
    fn stop_collector(&mut self) -> Result<(), ApiError>;

    /// Percentiles recorded since the collector started
    fn collector_stats(&mut self) -> Result<ResponseTimes, ApiError>;
}

/// HTTP implementation of [`DimmerAdmin`]
#[derive(Debug, Clone)]
pub struct HttpDimmerAdmin {
    endpoint: HttpEndpoint,
    training_resource: String,
}

impl HttpDimmerAdmin {
    pub fn new(
        base_url: impl Into<String>,
        training_resource: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(HttpDimmerAdmin {
            endpoint: HttpEndpoint::new(base_url, timeout)?,
            training_resource: training_resource.into(),
        })
    }

    fn stats_resource(&self) -> String {
        format!("{}/stats", self.training_resource.trim_end_matches('/'))
    }
}

impl DimmerAdmin for HttpDimmerAdmin {
    fn clear_probabilities(&mut self) -> Result<(), ApiError> {
        self.endpoint.send(Method::DELETE, "/probabilities")?;
        Ok(())
    }

    fn set_probabilities(&mut self, rules: &[PathProbabilityRule]) -> Result<(), ApiError> {
        self.endpoint
            .send_json(Method::POST, "/probabilities", rules)?;
        Ok(())
    }

    fn start_collector(&mut self) -> Result<(), ApiError> {
        self.endpoint.send(Method::POST, &self.training_resource)?;
        Ok(())
    }

    fn stop_collector(&mut self) -> Result<(), ApiError> {
        self.endpoint.send(Method::DELETE, &self.training_resource)?;
        Ok(())
    }

    fn collector_stats(&mut self) -> Result<ResponseTimes, ApiError> {
        self.endpoint
            .receive_json(Method::GET, &self.stats_resource())
    }
}
