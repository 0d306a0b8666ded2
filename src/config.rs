//! Calibration run configuration
//!
//! Loaded from a TOML file and validated in full before any collaborator is
//! contacted: a run either starts with a complete, consistent configuration or
//! does not start at all.
//!
//! # Example
//! ```toml
//! dimmable_component_paths = ["/cart", "/recommender"]
//!
//! [endpoints]
//! dimmer_admin_host = "localhost"
//! dimmer_admin_port = 8079
//!
//! [load_generator.k6]
//! host = "localhost"
//! port = 6565
//!
//! [load_profile]
//! num_iterations = 50
//! max_users = 100
//! ramp_up_seconds = 10
//! peak_seconds = 30
//! ramp_down_seconds = 10
//! seconds_between_runs = 5
//! ```

use crate::dimmer::DEFAULT_TRAINING_RESOURCE;
use crate::http::base_url;
use crate::loadgen::LoadGeneratorDriver;
use crate::sampler::{SamplerStrategy, Scramble};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "calibration.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration:\n{}", bullet_list(.0))]
    Invalid(Vec<String>),
}

fn bullet_list(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full configuration of one calibration run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationConfig {
    /// Dimmable components, in the order used for sampling and regression
    pub dimmable_component_paths: Vec<String>,
    pub endpoints: Endpoints,
    pub load_generator: LoadGeneratorConfig,
    pub load_profile: LoadProfile,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Endpoints {
    pub dimmer_admin_host: String,
    pub dimmer_admin_port: u16,
    /// Collector resource on the admin API
    #[serde(default = "default_training_resource")]
    pub training_resource: String,
}

fn default_training_resource() -> String {
    DEFAULT_TRAINING_RESOURCE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadGeneratorConfig {
    #[serde(default = "default_driver")]
    pub driver: LoadGeneratorDriver,
    pub k6: K6Config,
}

fn default_driver() -> LoadGeneratorDriver {
    LoadGeneratorDriver::K6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct K6Config {
    pub host: String,
    pub port: u16,
}

/// Shape of every trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadProfile {
    pub num_iterations: usize,
    pub max_users: u32,
    pub ramp_up_seconds: u32,
    pub peak_seconds: u64,
    pub ramp_down_seconds: u32,
    pub seconds_between_runs: u64,
}

/// Digit scrambling selection for the Halton sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrambleKind {
    None,
    #[default]
    Owen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    #[serde(default = "default_strategy")]
    pub strategy: SamplerStrategy,
    #[serde(default)]
    pub scramble: ScrambleKind,
    /// Fixed seed for reproducible runs; wall-clock seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_strategy() -> SamplerStrategy {
    SamplerStrategy::Halton
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            strategy: default_strategy(),
            scramble: ScrambleKind::default(),
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Scramble for the Halton sampler, seeded from the wall clock if no seed is set
    pub fn scramble(&self) -> Scramble {
        match self.scramble {
            ScrambleKind::None => Scramble::None,
            ScrambleKind::Owen => Scramble::Owen {
                seed: self
                    .seed
                    .unwrap_or_else(crate::sampler::wall_clock_seed),
            },
        }
    }
}

/// Per-call timeouts in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    #[serde(default = "default_admin_timeout")]
    pub admin_seconds: u64,
    #[serde(default = "default_reseed_timeout")]
    pub reseed_seconds: u64,
}

fn default_admin_timeout() -> u64 {
    10
}

fn default_reseed_timeout() -> u64 {
    120
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            admin_seconds: default_admin_timeout(),
            reseed_seconds: default_reseed_timeout(),
        }
    }
}

impl Timeouts {
    pub fn admin(&self) -> Duration {
        Duration::from_secs(self.admin_seconds)
    }

    pub fn reseed(&self) -> Duration {
        Duration::from_secs(self.reseed_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Extensions {
    #[serde(default)]
    pub cart_reseeding: ReseedConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReseedConfig {
    #[serde(default)]
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub num_reseed_rows: Option<u64>,
}

/// Where and how much to reseed, once validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReseedTarget {
    pub base_url: String,
    pub rows: u64,
}

impl CalibrationConfig {
    /// Read, parse and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CalibrationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field, reporting all problems at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.dimmable_component_paths.is_empty() {
            problems.push("dimmable_component_paths must name at least one path".to_string());
        }
        let mut seen = HashSet::new();
        for path in &self.dimmable_component_paths {
            if path.trim().is_empty() {
                problems.push("dimmable_component_paths must not contain empty paths".to_string());
            } else if !seen.insert(path) {
                problems.push(format!("dimmable_component_paths lists '{}' twice", path));
            }
        }

        if self.endpoints.dimmer_admin_host.trim().is_empty() {
            problems.push("endpoints.dimmer_admin_host must not be empty".to_string());
        }
        if self.endpoints.dimmer_admin_port == 0 {
            problems.push("endpoints.dimmer_admin_port must be non-zero".to_string());
        }
        if !self.endpoints.training_resource.starts_with('/') {
            problems.push(format!(
                "endpoints.training_resource must start with '/', got '{}'",
                self.endpoints.training_resource
            ));
        }

        if self.load_generator.k6.host.trim().is_empty() {
            problems.push("load_generator.k6.host must not be empty".to_string());
        }
        if self.load_generator.k6.port == 0 {
            problems.push("load_generator.k6.port must be non-zero".to_string());
        }

        let profile = &self.load_profile;
        if profile.num_iterations == 0 {
            problems.push("load_profile.num_iterations must be at least 1".to_string());
        }
        if profile.max_users == 0 {
            problems.push("load_profile.max_users must be at least 1".to_string());
        }
        if profile.ramp_up_seconds == 0 {
            problems.push("load_profile.ramp_up_seconds must be at least 1".to_string());
        }
        if profile.ramp_down_seconds == 0 {
            problems.push("load_profile.ramp_down_seconds must be at least 1".to_string());
        }

        if self.timeouts.admin_seconds == 0 {
            problems.push("timeouts.admin_seconds must be at least 1".to_string());
        }
        if self.timeouts.reseed_seconds == 0 {
            problems.push("timeouts.reseed_seconds must be at least 1".to_string());
        }

        let reseed = &self.extensions.cart_reseeding;
        if reseed.enabled {
            match &reseed.host {
                Some(host) if !host.trim().is_empty() => {}
                _ => problems.push(
                    "extensions.cart_reseeding.host is required when reseeding is enabled"
                        .to_string(),
                ),
            }
            match reseed.port {
                Some(port) if port != 0 => {}
                _ => problems.push(
                    "extensions.cart_reseeding.port is required when reseeding is enabled"
                        .to_string(),
                ),
            }
            if reseed.num_reseed_rows.is_none() {
                problems.push(
                    "extensions.cart_reseeding.num_reseed_rows is required when reseeding is enabled"
                        .to_string(),
                );
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    pub fn admin_base_url(&self) -> String {
        base_url(
            &self.endpoints.dimmer_admin_host,
            self.endpoints.dimmer_admin_port,
        )
    }

    pub fn k6_base_url(&self) -> String {
        base_url(&self.load_generator.k6.host, self.load_generator.k6.port)
    }

    /// Reseeding target, if reseeding is enabled
    pub fn reseed_target(&self) -> Option<ReseedTarget> {
        let reseed = &self.extensions.cart_reseeding;
        if !reseed.enabled {
            return None;
        }
        match (&reseed.host, reseed.port, reseed.num_reseed_rows) {
            (Some(host), Some(port), Some(rows)) => Some(ReseedTarget {
                base_url: base_url(host, port),
                rows,
            }),
            _ => None,
        }
    }
}
