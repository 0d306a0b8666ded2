//! Calibration experiment orchestration
//!
//! One run is a RESET followed by `num_iterations` trials and a final fit:
//!
//! ```text
//! RESET: pause load, clear probabilities, stop collector
//! per trial:
//!   RESEED? -> SAMPLE -> CONFIGURE -> COLLECT_START -> RAMP_UP -> PEAK_HOLD
//!   -> RAMP_DOWN -> COLLECT_STOP -> RECORD -> COOLDOWN (not after the last)
//! TRAIN
//! ```
//!
//! Any collaborator failure aborts the run with the iteration and stage it
//! happened in. The only tolerated failure is pausing a load generator that is
//! not running during RESET.

use crate::clock::Clock;
use crate::config::LoadProfile;
use crate::dimmer::{DimmerAdmin, PathProbabilityRule, ResponseTimes};
use crate::http::ApiError;
use crate::loadgen::{LoadGenerator, LoadGeneratorError};
use crate::ramp::{RampController, RampError};
use crate::regression::{FitError, SensitivityModel};
use crate::reseed::DataReseeder;
use crate::sampler::{ConfigurationVector, Sampler};
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

/// Phase of a calibration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialStage {
    Reset,
    Reseed,
    Sample,
    Configure,
    CollectStart,
    RampUp,
    PeakHold,
    RampDown,
    CollectStop,
    Record,
    Cooldown,
}

impl fmt::Display for TrialStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrialStage::Reset => "RESET",
            TrialStage::Reseed => "RESEED",
            TrialStage::Sample => "SAMPLE",
            TrialStage::Configure => "CONFIGURE",
            TrialStage::CollectStart => "COLLECT_START",
            TrialStage::RampUp => "RAMP_UP",
            TrialStage::PeakHold => "PEAK_HOLD",
            TrialStage::RampDown => "RAMP_DOWN",
            TrialStage::CollectStop => "COLLECT_STOP",
            TrialStage::Record => "RECORD",
            TrialStage::Cooldown => "COOLDOWN",
        };
        f.write_str(name)
    }
}

/// Collaborator failure inside a stage
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    LoadGenerator(#[from] LoadGeneratorError),

    #[error(transparent)]
    Ramp(#[from] RampError),
}

/// Why a calibration run stopped
#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("RESET failed: {source}")]
    Reset {
        #[source]
        source: StageError,
    },

    #[error("Iteration {iteration}: {stage} failed: {source}")]
    Stage {
        iteration: usize,
        stage: TrialStage,
        #[source]
        source: StageError,
    },

    #[error("Regression fit over {observations} trials failed: {source}")]
    Fit {
        observations: usize,
        #[source]
        source: FitError,
    },
}

impl ExperimentError {
    /// Stage the run stopped in; `None` for a failed fit
    pub fn stage(&self) -> Option<TrialStage> {
        match self {
            ExperimentError::Reset { .. } => Some(TrialStage::Reset),
            ExperimentError::Stage { stage, .. } => Some(*stage),
            ExperimentError::Fit { .. } => None,
        }
    }

    /// 1-based trial the run stopped in, if it stopped inside a trial
    pub fn iteration(&self) -> Option<usize> {
        match self {
            ExperimentError::Stage { iteration, .. } => Some(*iteration),
            _ => None,
        }
    }
}

fn at<E: Into<StageError>>(iteration: usize, stage: TrialStage) -> impl FnOnce(E) -> ExperimentError {
    move |e| ExperimentError::Stage {
        iteration,
        stage,
        source: e.into(),
    }
}

fn enter(stage: TrialStage) {
    debug!(%stage, "Entering stage");
}

fn during_reset<E: Into<StageError>>(e: E) -> ExperimentError {
    ExperimentError::Reset { source: e.into() }
}

/// One completed trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    /// 1-based trial number
    pub iteration: usize,
    pub rules: Vec<PathProbabilityRule>,
    pub response_times: ResponseTimes,
}

impl TrialRecord {
    /// Dimming probabilities in component order
    pub fn configuration(&self) -> ConfigurationVector {
        self.rules.iter().map(|r| r.probability).collect()
    }
}

/// Result of a successful run: the trained model and every trial behind it
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    pub model: SensitivityModel,
    pub trials: Vec<TrialRecord>,
}

/// A calibration run wired to its collaborators
///
/// Collaborators are generic so the whole loop can run against in-memory
/// fakes. `R` defaults to [`Infallible`] for runs without reseeding.
pub struct Experiment<S, D, L, C, R = Infallible> {
    paths: Vec<String>,
    profile: LoadProfile,
    sampler: S,
    dimmer: D,
    load_generator: L,
    clock: C,
    reseeder: Option<R>,
}

impl<S, D, L, C> Experiment<S, D, L, C, Infallible>
where
    S: Sampler,
    D: DimmerAdmin,
    L: LoadGenerator,
    C: Clock,
{
    /// # Panics
    /// If the sampler does not produce one value per path.
    pub fn new(
        paths: Vec<String>,
        profile: LoadProfile,
        sampler: S,
        dimmer: D,
        load_generator: L,
        clock: C,
    ) -> Self {
        assert_eq!(
            sampler.dimensions(),
            paths.len(),
            "developer error: sampler covers {} dimensions for {} paths",
            sampler.dimensions(),
            paths.len()
        );

        Experiment {
            paths,
            profile,
            sampler,
            dimmer,
            load_generator,
            clock,
            reseeder: None,
        }
    }

    /// Reseed backing data before every trial
    pub fn with_reseeder<R: DataReseeder>(self, reseeder: R) -> Experiment<S, D, L, C, R> {
        Experiment {
            paths: self.paths,
            profile: self.profile,
            sampler: self.sampler,
            dimmer: self.dimmer,
            load_generator: self.load_generator,
            clock: self.clock,
            reseeder: Some(reseeder),
        }
    }
}

impl<S, D, L, C, R> Experiment<S, D, L, C, R>
where
    S: Sampler,
    D: DimmerAdmin,
    L: LoadGenerator,
    C: Clock,
    R: DataReseeder,
{
    /// Run RESET, every trial and the final fit
    pub fn run(mut self) -> Result<CalibrationRun, ExperimentError> {
        let total = self.profile.num_iterations;
        let mut model = SensitivityModel::for_invariant(self.paths.clone(), self.sampler.invariant());
        let mut ramp = RampController::new();
        let mut trials = Vec::with_capacity(total);

        info!(
            components = self.paths.len(),
            iterations = total,
            "Starting calibration"
        );
        self.reset()?;

        for iteration in 1..=total {
            let span = info_span!("trial", iteration, of = total);
            let _enter = span.enter();

            let (configuration, record) = self.trial(iteration, &mut ramp)?;
            enter(TrialStage::Record);
            info!(p95 = record.response_times.p95, "Added response time");

            model.add_observation(record.response_times.p95, configuration);
            trials.push(record);

            if iteration < total {
                enter(TrialStage::Cooldown);
                self.clock
                    .sleep(Duration::from_secs(self.profile.seconds_between_runs));
            }
        }

        model.train().map_err(|source| ExperimentError::Fit {
            observations: model.len(),
            source,
        })?;

        info!(
            r_squared = model.r_squared(),
            formula = %model.formula(),
            "Calibration complete"
        );

        Ok(CalibrationRun { model, trials })
    }

    fn reset(&mut self) -> Result<(), ExperimentError> {
        enter(TrialStage::Reset);
        match self.load_generator.stop() {
            Ok(()) => {}
            Err(LoadGeneratorError::NotRunning(reason)) => {
                warn!(%reason, "Load generator was not running");
            }
            Err(e) => return Err(during_reset(e)),
        }
        self.dimmer.clear_probabilities().map_err(during_reset)?;
        self.dimmer.stop_collector().map_err(during_reset)?;
        Ok(())
    }

    fn trial(
        &mut self,
        iteration: usize,
        ramp: &mut RampController,
    ) -> Result<(ConfigurationVector, TrialRecord), ExperimentError> {
        if let Some(reseeder) = self.reseeder.as_mut() {
            enter(TrialStage::Reseed);
            reseeder.reseed().map_err(at(iteration, TrialStage::Reseed))?;
        }

        enter(TrialStage::Sample);
        let configuration = self.sampler.sample();
        let rules = PathProbabilityRule::from_configuration(&self.paths, &configuration);
        debug!(?rules, "Using probabilities");
        enter(TrialStage::Configure);
        self.dimmer
            .set_probabilities(&rules)
            .map_err(at(iteration, TrialStage::Configure))?;

        enter(TrialStage::CollectStart);
        self.dimmer
            .start_collector()
            .map_err(at(iteration, TrialStage::CollectStart))?;

        enter(TrialStage::RampUp);
        self.load_generator
            .start()
            .map_err(at(iteration, TrialStage::RampUp))?;
        ramp.ramp(
            &mut self.load_generator,
            &mut self.clock,
            self.profile.max_users,
            self.profile.ramp_up_seconds,
        )
        .map_err(at(iteration, TrialStage::RampUp))?;

        enter(TrialStage::PeakHold);
        self.clock
            .sleep(Duration::from_secs(self.profile.peak_seconds));

        enter(TrialStage::RampDown);
        ramp.ramp(
            &mut self.load_generator,
            &mut self.clock,
            0,
            self.profile.ramp_down_seconds,
        )
        .map_err(at(iteration, TrialStage::RampDown))?;
        self.load_generator
            .stop()
            .map_err(at(iteration, TrialStage::RampDown))?;

        enter(TrialStage::CollectStop);
        let response_times = self
            .dimmer
            .collector_stats()
            .map_err(at(iteration, TrialStage::CollectStop))?;
        self.dimmer
            .stop_collector()
            .map_err(at(iteration, TrialStage::CollectStop))?;
        self.dimmer
            .clear_probabilities()
            .map_err(at(iteration, TrialStage::CollectStop))?;

        let record = TrialRecord {
            iteration,
            rules,
            response_times,
        };
        Ok((configuration, record))
    }
}
