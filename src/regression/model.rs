// Two-phase sensitivity model
//
// Accumulating -> Trained. Observations can only be added while accumulating;
// coefficients and the formula only exist once trained. Calling an operation in
// the wrong phase is a caller bug and panics. A failed fit is not: train()
// returns the FitError and leaves the observations in place.

use crate::regression::coefficients::{complement, normalise, Coefficient};
use crate::regression::ols::{fit_with, FitError, InterceptTerm, LinearFit};
use crate::sampler::{ConfigurationVector, SampleInvariant};

/// Label of the dependent variable in the formula
const OBSERVED_LABEL: &str = "Response time, s";

/// One completed trial
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    response_time: f64,
    configuration: ConfigurationVector,
}

impl Observation {
    pub fn new(response_time: f64, configuration: ConfigurationVector) -> Self {
        Observation {
            response_time,
            configuration,
        }
    }

    /// Observed response time in seconds
    pub fn response_time(&self) -> f64 {
        self.response_time
    }

    /// Configuration in component order
    pub fn configuration(&self) -> &[f64] {
        &self.configuration
    }
}

#[derive(Debug, Clone)]
enum ModelState {
    Accumulating(Vec<Observation>),
    Trained {
        observations: Vec<Observation>,
        fit: LinearFit,
    },
}

/// Linear model of response time against per-component dimming
///
/// # Example
/// ```
/// use dimcal::regression::SensitivityModel;
///
/// let mut model = SensitivityModel::new(vec!["/a".to_string(), "/b".to_string()]);
/// model.add_observation(1.0, vec![0.0, 0.0]);
/// model.add_observation(3.0, vec![1.0, 0.0]);
/// model.add_observation(1.5, vec![0.0, 1.0]);
/// model.add_observation(2.5, vec![0.5, 1.0]);
/// model.train().unwrap();
///
/// let normalised = model.normalised_coefficients();
/// assert_eq!(normalised[0].path, "/a");
/// assert_eq!(normalised[0].value, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct SensitivityModel {
    paths: Vec<String>,
    intercept_term: InterceptTerm,
    state: ModelState,
}

impl SensitivityModel {
    /// Create an untrained model bound to the ordered component paths
    pub fn new(paths: Vec<String>) -> Self {
        SensitivityModel {
            paths,
            intercept_term: InterceptTerm::Fitted,
            state: ModelState::Accumulating(Vec::new()),
        }
    }

    /// Create a model matching what the sampler guarantees about its vectors
    ///
    /// Sum-to-one configurations are fitted without an intercept.
    pub fn for_invariant(paths: Vec<String>, invariant: SampleInvariant) -> Self {
        let intercept_term = match invariant {
            SampleInvariant::Independent => InterceptTerm::Fitted,
            SampleInvariant::SumToOne => InterceptTerm::Absorbed,
        };
        SensitivityModel {
            intercept_term,
            ..Self::new(paths)
        }
    }

    pub fn intercept_term(&self) -> InterceptTerm {
        self.intercept_term
    }

    /// Component paths in binding order
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Whether `train` has succeeded
    pub fn is_trained(&self) -> bool {
        matches!(self.state, ModelState::Trained { .. })
    }

    /// Number of accumulated observations
    pub fn len(&self) -> usize {
        self.observations().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observations in insertion order
    pub fn observations(&self) -> &[Observation] {
        match &self.state {
            ModelState::Accumulating(observations) => observations,
            ModelState::Trained { observations, .. } => observations,
        }
    }

    /// Append one trial result
    ///
    /// # Panics
    /// If the model is already trained, or the configuration does not have one
    /// entry per component.
    pub fn add_observation(&mut self, response_time: f64, configuration: ConfigurationVector) {
        let ModelState::Accumulating(observations) = &mut self.state else {
            panic!("developer error: called add_observation after training complete");
        };

        assert_eq!(
            configuration.len(),
            self.paths.len(),
            "developer error: configuration has {} entries for {} paths",
            configuration.len(),
            self.paths.len()
        );

        observations.push(Observation::new(response_time, configuration));
    }

    /// Fit the model over every accumulated observation
    ///
    /// On failure the model stays untrained and keeps its observations.
    ///
    /// # Panics
    /// If the model is already trained.
    pub fn train(&mut self) -> Result<(), FitError> {
        let ModelState::Accumulating(observations) = &self.state else {
            panic!("developer error: called train after training complete");
        };

        let fit = fit_with(observations, self.paths.len(), self.intercept_term)?;

        let state = std::mem::replace(&mut self.state, ModelState::Accumulating(Vec::new()));
        if let ModelState::Accumulating(observations) = state {
            self.state = ModelState::Trained { observations, fit };
        }

        Ok(())
    }

    fn fit(&self, operation: &str) -> &LinearFit {
        match &self.state {
            ModelState::Trained { fit, .. } => fit,
            ModelState::Accumulating(_) => {
                panic!("developer error: called {operation} before training complete")
            }
        }
    }

    /// Fitted slope per component, in component order
    pub fn coefficients(&self) -> Vec<Coefficient> {
        let fit = self.fit("coefficients");
        self.paths
            .iter()
            .zip(&fit.slopes)
            .map(|(path, &slope)| Coefficient::new(path.clone(), slope))
            .collect()
    }

    /// Coefficients min-max normalised into [0,1]
    pub fn normalised_coefficients(&self) -> Vec<Coefficient> {
        self.fit("normalised_coefficients");
        normalise(&self.coefficients())
    }

    /// `1 - normalised` per component: how far each one can be dimmed
    pub fn complementary_normalised_coefficients(&self) -> Vec<Coefficient> {
        self.fit("complementary_normalised_coefficients");
        complement(&self.normalised_coefficients())
    }

    /// Fitted constant term
    pub fn intercept(&self) -> f64 {
        self.fit("intercept").intercept
    }

    /// Coefficient of determination on the training observations
    pub fn r_squared(&self) -> f64 {
        self.fit("r_squared").r_squared
    }

    /// Predicted response time for a configuration
    pub fn predict(&self, configuration: &[f64]) -> f64 {
        self.fit("predict").predict(configuration)
    }

    /// Human-readable fitted equation
    ///
    /// `Response time, s = 1.0000 + 2.0000*/a - 0.2500*/b`, or without the
    /// constant for a mixture fit: `Response time, s = 2.0000*/a + 1.0000*/b`
    pub fn formula(&self) -> String {
        let fit = self.fit("formula");
        let mut formula = format!("{} =", OBSERVED_LABEL);
        let mut first = match self.intercept_term {
            InterceptTerm::Fitted => {
                formula.push_str(&format!(" {:.4}", fit.intercept));
                false
            }
            InterceptTerm::Absorbed => true,
        };
        for (path, &slope) in self.paths.iter().zip(&fit.slopes) {
            let magnitude = format!("{:.4}", slope.abs());
            let negative = slope < 0.0 && magnitude != "0.0000";
            let term = match (first, negative) {
                (true, true) => format!(" -{}*{}", magnitude, path),
                (true, false) => format!(" {}*{}", magnitude, path),
                (false, true) => format!(" - {}*{}", magnitude, path),
                (false, false) => format!(" + {}*{}", magnitude, path),
            };
            formula.push_str(&term);
            first = false;
        }
        formula
    }
}
