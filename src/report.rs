//! Calibration report generation
//!
//! Renders the trained model and its trials either as a human-readable summary
//! or as JSON for downstream tooling.

use crate::orchestrator::{CalibrationRun, TrialRecord};
use crate::regression::Coefficient;
use crate::sampler::{SampleInvariant, SamplerStrategy};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::Write as _;

/// Output format for the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON for machine parsing
    Json,
}

/// One component's place in the sensitivity ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedComponent {
    /// 1 = most sensitive
    pub rank: usize,
    pub path: String,
    /// Normalised sensitivity in [0,1]
    pub sensitivity: f64,
    /// Complementary value: how far this component can be dimmed
    pub headroom: f64,
}

/// Everything a calibration run produced
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub paths: Vec<String>,
    pub sampler: SamplerStrategy,
    pub invariant: SampleInvariant,
    pub trials: Vec<TrialRecord>,
    pub formula: String,
    pub intercept: f64,
    pub r_squared: f64,
    pub coefficients: Vec<Coefficient>,
    pub normalised_coefficients: Vec<Coefficient>,
    pub complementary_coefficients: Vec<Coefficient>,
    pub ranking: Vec<RankedComponent>,
}

impl CalibrationReport {
    /// Build the report for a completed run
    pub fn new(run: &CalibrationRun, sampler: SamplerStrategy) -> Self {
        let model = &run.model;
        let normalised = model.normalised_coefficients();
        let complementary = model.complementary_normalised_coefficients();

        CalibrationReport {
            paths: model.paths().to_vec(),
            sampler,
            invariant: sampler.invariant(),
            trials: run.trials.clone(),
            formula: model.formula(),
            intercept: model.intercept(),
            r_squared: model.r_squared(),
            coefficients: model.coefficients(),
            ranking: rank(&normalised, &complementary),
            normalised_coefficients: normalised,
            complementary_coefficients: complementary,
        }
    }

    /// Render in the requested format
    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_report_string()),
            ReportFormat::Json => serde_json::to_string_pretty(self),
        }
    }

    /// Human-readable summary
    pub fn to_report_string(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "=== Dimmer Calibration Report ===");
        let _ = writeln!(
            out,
            "Sampler: {} ({})",
            self.sampler,
            match self.invariant {
                SampleInvariant::Independent => "independent per component",
                SampleInvariant::SumToOne => "sums to one",
            }
        );
        let _ = writeln!(out, "Trials: {}", self.trials.len());
        let _ = writeln!(out);

        let _ = writeln!(out, "{:>5}  {:>8}  {:>8}  {:>8}", "trial", "P50", "P75", "P95");
        for trial in &self.trials {
            let times = &trial.response_times;
            let _ = writeln!(
                out,
                "{:>5}  {:>8.4}  {:>8.4}  {:>8.4}",
                trial.iteration, times.p50, times.p75, times.p95
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Model: {}", self.formula);
        let _ = writeln!(out, "R²: {:.4}", self.r_squared);
        let _ = writeln!(out);

        let width = self.paths.iter().map(String::len).max().unwrap_or(4).max(4);
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:>11}  {:>10}  {:>8}",
            "rank", "path", "coefficient", "normalised", "headroom"
        );
        for ranked in &self.ranking {
            let raw = self
                .coefficients
                .iter()
                .find(|c| c.path == ranked.path)
                .map(|c| c.value)
                .unwrap_or(f64::NAN);
            let _ = writeln!(
                out,
                "{:>4}  {:<width$}  {:>11.4}  {:>10.4}  {:>8.4}",
                ranked.rank, ranked.path, raw, ranked.sensitivity, ranked.headroom
            );
        }

        out
    }
}

/// Order components by normalised sensitivity, highest first
///
/// Ties keep component order.
fn rank(normalised: &[Coefficient], complementary: &[Coefficient]) -> Vec<RankedComponent> {
    let mut order: Vec<usize> = (0..normalised.len()).collect();
    order.sort_by(|&a, &b| {
        normalised[b]
            .value
            .partial_cmp(&normalised[a].value)
            .unwrap_or(Ordering::Equal)
    });

    order
        .into_iter()
        .enumerate()
        .map(|(position, index)| RankedComponent {
            rank: position + 1,
            path: normalised[index].path.clone(),
            sensitivity: normalised[index].value,
            headroom: complementary[index].value,
        })
        .collect()
}
