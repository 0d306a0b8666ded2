//! CLI argument parsing for dimcal

use crate::config::DEFAULT_CONFIG_FILE;
use crate::report::ReportFormat;
use crate::sampler::SamplerStrategy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dimcal")]
#[command(version)]
#[command(
    about = "Calibrate brownout dimmer sensitivity by sampling dimming configurations under load",
    long_about = None
)]
pub struct Cli {
    /// Path to the calibration configuration file
    #[arg(short = 'c', long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Report format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Override the configured sampling strategy
    #[arg(long = "sampler", value_enum, value_name = "STRATEGY")]
    pub sampler: Option<SamplerStrategy>,

    /// Fix the sampler seed for a reproducible run
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Validate the configuration and exit without contacting any service
    #[arg(long = "check")]
    pub check: bool,

    /// Enable trace-level logging
    #[arg(long = "debug")]
    pub debug: bool,
}
