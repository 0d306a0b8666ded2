// Scenario tests for the sensitivity model
//
// Realistic calibration shapes: one dominant component, components that speed
// things up when dimmed, and the lifecycle faults a caller can trigger.

use super::*;

fn paths(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Four linearly independent configurations over three components
fn independent_configurations() -> Vec<Vec<f64>> {
    vec![
        vec![0.0, 0.0, 0.0],
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
        vec![0.4, 0.6, 0.2],
        vec![0.9, 0.1, 0.7],
    ]
}

/// Cart service dominates: recommender barely matters, search is moderate
#[test]
fn test_dominant_component_ranks_first() {
    let mut model = SensitivityModel::new(paths(&["/recommender", "/cart", "/search"]));
    for p in independent_configurations() {
        let p95 = 0.2 + 0.05 * p[0] + 1.5 * p[1] + 0.4 * p[2];
        model.add_observation(p95, p);
    }
    model.train().unwrap();

    let coefficients = model.coefficients();
    assert_eq!(coefficients.len(), 3);
    assert_eq!(
        coefficients.iter().map(|c| c.path.as_str()).collect::<Vec<_>>(),
        vec!["/recommender", "/cart", "/search"]
    );

    let normalised = model.normalised_coefficients();
    assert_eq!(normalised[1].value, 1.0);
    assert_eq!(normalised[0].value, 0.0);
    assert!(normalised[2].value > 0.0 && normalised[2].value < 1.0);

    let complementary = model.complementary_normalised_coefficients();
    assert_eq!(complementary[0].value, 1.0);
    assert_eq!(complementary[1].value, 0.0);
}

/// Exactly four independent observations for three components is enough
#[test]
fn test_minimum_observations_for_three_components() {
    let mut model = SensitivityModel::new(paths(&["a", "b", "c"]));
    for p in independent_configurations().into_iter().take(4) {
        let p95 = 1.0 + p[0] - p[2];
        model.add_observation(p95, p);
    }
    assert!(model.train().is_ok());
    assert_eq!(model.coefficients().len(), 3);
    assert!((model.intercept() - 1.0).abs() < 1e-9);
}

/// A component whose dimming lowers latency gets a negative slope
#[test]
fn test_negative_slope_in_formula() {
    let mut model = SensitivityModel::new(paths(&["/a", "/b", "/c"]));
    for p in independent_configurations() {
        let p95 = 1.0 + 2.0 * p[0] - 0.25 * p[1];
        model.add_observation(p95, p);
    }
    model.train().unwrap();

    assert_eq!(
        model.formula(),
        "Response time, s = 1.0000 + 2.0000*/a - 0.2500*/b + 0.0000*/c"
    );
    assert!((model.r_squared() - 1.0).abs() < 1e-9);
    assert!((model.predict(&[1.0, 1.0, 1.0]) - 2.75).abs() < 1e-9);
}

/// Equal sensitivity everywhere falls back to 0.5
#[test]
fn test_degenerate_coefficients_fall_back() {
    let mut model = SensitivityModel::new(paths(&["a", "b", "c"]));
    for p in independent_configurations() {
        let p95 = 0.5 + 0.3 * (p[0] + p[1] + p[2]);
        model.add_observation(p95, p);
    }
    model.train().unwrap();

    for c in model.normalised_coefficients() {
        assert_eq!(c.value, DEGENERATE_NORMALISED_VALUE);
    }
    for c in model.complementary_normalised_coefficients() {
        assert_eq!(c.value, 1.0 - DEGENERATE_NORMALISED_VALUE);
    }
}

/// Failed fits keep the observations and leave the model untrained
#[test]
fn test_failed_train_is_recoverable() {
    let mut model = SensitivityModel::new(paths(&["a", "b"]));
    model.add_observation(1.0, vec![0.1, 0.2]);
    model.add_observation(1.2, vec![0.3, 0.1]);

    let err = model.train().unwrap_err();
    assert!(matches!(err, FitError::NotEnoughObservations { .. }));
    assert!(!model.is_trained());
    assert_eq!(model.len(), 2);

    model.add_observation(1.4, vec![0.8, 0.5]);
    model.add_observation(0.9, vec![0.0, 0.9]);
    assert!(model.train().is_ok());
    assert!(model.is_trained());
    assert_eq!(model.len(), 4);
}

#[test]
fn test_sum_to_one_model_fits_without_intercept() {
    let mut model = SensitivityModel::for_invariant(
        paths(&["/cart", "/recommender"]),
        crate::sampler::SampleInvariant::SumToOne,
    );
    assert_eq!(model.intercept_term(), InterceptTerm::Absorbed);

    for share in [0.0, 0.25, 0.5, 0.8, 1.0] {
        let configuration = vec![share, 1.0 - share];
        model.add_observation(3.0 * share + 1.0 * (1.0 - share), configuration);
    }
    model.train().unwrap();

    assert_eq!(model.intercept(), 0.0);
    assert_eq!(
        model.formula(),
        "Response time, s = 3.0000*/cart + 1.0000*/recommender"
    );
    assert_eq!(model.normalised_coefficients()[0].value, 1.0);
    assert_eq!(model.normalised_coefficients()[1].value, 0.0);
}

#[test]
fn test_independent_model_keeps_intercept() {
    let model = SensitivityModel::for_invariant(
        paths(&["a"]),
        crate::sampler::SampleInvariant::Independent,
    );
    assert_eq!(model.intercept_term(), InterceptTerm::Fitted);
}

#[test]
#[should_panic(expected = "add_observation after training")]
fn test_add_after_train_panics() {
    let mut model = SensitivityModel::new(paths(&["a"]));
    model.add_observation(1.0, vec![0.1]);
    model.add_observation(2.0, vec![0.9]);
    model.train().unwrap();
    model.add_observation(3.0, vec![0.5]);
}

#[test]
#[should_panic(expected = "train after training")]
fn test_train_twice_panics() {
    let mut model = SensitivityModel::new(paths(&["a"]));
    model.add_observation(1.0, vec![0.1]);
    model.add_observation(2.0, vec![0.9]);
    model.train().unwrap();
    let _ = model.train();
}

#[test]
#[should_panic(expected = "coefficients before training")]
fn test_coefficients_before_train_panics() {
    let model = SensitivityModel::new(paths(&["a"]));
    model.coefficients();
}

#[test]
#[should_panic(expected = "formula before training")]
fn test_formula_before_train_panics() {
    let model = SensitivityModel::new(paths(&["a"]));
    model.formula();
}

#[test]
#[should_panic(expected = "normalised_coefficients before training")]
fn test_normalised_before_train_panics() {
    let model = SensitivityModel::new(paths(&["a", "b"]));
    model.normalised_coefficients();
}

#[test]
#[should_panic(expected = "configuration has 1 entries for 2 paths")]
fn test_dimension_mismatch_panics() {
    let mut model = SensitivityModel::new(paths(&["a", "b"]));
    model.add_observation(1.0, vec![0.5]);
}
