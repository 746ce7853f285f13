//! The four ensemble members
//!
//! Each model is a stateless `PlayerFeatures -> ModelPrediction` function with a
//! fixed ensemble weight. The random forest is the only model that draws from
//! the per-request random stream; the others ignore it.

use crate::config::ModelParameters;
use crate::types::{ModelKind, ModelPrediction, PlayerFeatures};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A model that can take part in the ensemble
pub trait ForecastModel: Send + Sync {
    /// Which consensus slot this model fills
    fn kind(&self) -> ModelKind;

    /// Fixed ensemble weight
    fn weight(&self) -> f64;

    /// Run the model; the returned prediction is never negative
    fn predict(&self, features: &PlayerFeatures, rng: &mut StdRng) -> ModelPrediction;
}

fn importance(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(name, value)| (name.to_string(), *value)).collect()
}

/// Weighted sum of averages and favorability terms
#[derive(Debug, Clone)]
pub struct LinearRegression {
    weight: f64,
    confidence: f64,
}

impl LinearRegression {
    pub fn new(weight: f64, confidence: f64) -> Self {
        Self { weight, confidence }
    }
}

impl ForecastModel for LinearRegression {
    fn kind(&self) -> ModelKind {
        ModelKind::LinearRegression
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn predict(&self, features: &PlayerFeatures, _rng: &mut StdRng) -> ModelPrediction {
        let prediction = features.recent_average() * 0.4
            + features.season_average * 0.3
            + features.matchup_favorability() * 15.0 * 0.2
            + features.team_favorability() * 10.0 * 0.1;

        ModelPrediction {
            prediction: prediction.max(0.0),
            confidence: self.confidence,
            weight: self.weight,
            feature_importance: importance(&[
                ("recentPerformance", 0.4),
                ("seasonAverage", 0.3),
                ("matchupDifficulty", 0.2),
                ("teamOffense", 0.1),
            ]),
        }
    }
}

/// Simulated bagging over randomly perturbed trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    weight: f64,
    trees: usize,
}

impl RandomForest {
    pub fn new(weight: f64, trees: usize) -> Self {
        Self { weight, trees: trees.max(1) }
    }
}

impl ForecastModel for RandomForest {
    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn predict(&self, features: &PlayerFeatures, rng: &mut StdRng) -> ModelPrediction {
        let recent = features.recent_average();
        let matchup = features.matchup_favorability();

        let trees: Vec<f64> = (0..self.trees)
            .map(|_| {
                let factor = rng.gen_range(0.8..=1.2);
                let noise = rng.gen_range(0.0..=2.0);
                recent * factor + matchup * 5.0 + noise
            })
            .collect();

        let n = trees.len() as f64;
        let mean = trees.iter().sum::<f64>() / n;
        let variance = trees.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
        let prediction = mean.max(0.0);

        let confidence = if prediction > 0.0 {
            (1.0 - variance.sqrt() / prediction).clamp(0.5, 0.95)
        } else {
            0.5
        };

        ModelPrediction {
            prediction,
            confidence,
            weight: self.weight,
            feature_importance: importance(&[("recentPerformance", 0.7), ("matchupDifficulty", 0.3)]),
        }
    }
}

/// Residual correction from the season average toward recent form with a
/// linearly decaying learning rate
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    weight: f64,
    confidence: f64,
    iterations: usize,
    learning_rate: f64,
}

impl GradientBoosting {
    pub fn new(weight: f64, confidence: f64, iterations: usize, learning_rate: f64) -> Self {
        Self { weight, confidence, iterations, learning_rate }
    }
}

impl ForecastModel for GradientBoosting {
    fn kind(&self) -> ModelKind {
        ModelKind::GradientBoosting
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn predict(&self, features: &PlayerFeatures, _rng: &mut StdRng) -> ModelPrediction {
        let target = features.recent_average();
        let mut prediction = features.season_average;

        let n = self.iterations as f64;
        for i in 0..self.iterations {
            let residual = target - prediction;
            prediction += self.learning_rate * residual * (1.0 - i as f64 / n);
        }

        prediction *= 1.0 + (features.matchup_favorability() - 0.5) * 0.02;
        prediction *= 1.0 + (features.team_favorability() - 0.5) * 0.01;

        ModelPrediction {
            prediction: prediction.max(0.0),
            confidence: self.confidence,
            weight: self.weight,
            feature_importance: importance(&[
                ("recentPerformance", 0.5),
                ("seasonAverage", 0.35),
                ("matchupDifficulty", 0.1),
                ("teamOffense", 0.05),
            ]),
        }
    }
}

const NN_INPUTS: usize = 5;
const NN_HIDDEN_1: usize = 5;
const NN_INPUT_NAMES: [&str; NN_INPUTS] =
    ["recentPerformance", "seasonAverage", "matchupDifficulty", "teamOffense", "consistencyScore"];

/// Second hidden layer: each unit is a fixed convex combination of layer 1
const NN_HIDDEN_2: [[f64; NN_HIDDEN_1]; 3] = [
    [0.5, 0.3, 0.2, 0.0, 0.0],
    [0.0, 0.0, 0.2, 0.3, 0.5],
    [0.25, 0.25, 0.0, 0.25, 0.25],
];
const NN_OUTPUT: [f64; 3] = [0.4, 0.4, 0.2];

/// Scores are normalized by this before the forward pass and scaled back after
const NN_SCALE: f64 = 30.0;

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// Layer-1 weight for hidden unit `unit` and input `input`, in [0, 1]
fn layer1_weight(unit: usize, input: usize) -> f64 {
    0.5 + 0.5 * ((unit * NN_INPUTS + input + 1) as f64).sin()
}

/// Fixed-weight two-hidden-layer forward pass
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    weight: f64,
    confidence: f64,
}

impl NeuralNetwork {
    pub fn new(weight: f64, confidence: f64) -> Self {
        Self { weight, confidence }
    }

    fn forward(inputs: &[f64; NN_INPUTS]) -> f64 {
        let mut hidden1 = [0.0; NN_HIDDEN_1];
        for (unit, h) in hidden1.iter_mut().enumerate() {
            let sum: f64 = inputs.iter().enumerate().map(|(i, x)| x * layer1_weight(unit, i)).sum();
            *h = relu(sum / NN_INPUTS as f64);
        }

        let hidden2: Vec<f64> = NN_HIDDEN_2
            .iter()
            .map(|row| relu(row.iter().zip(hidden1.iter()).map(|(w, h)| w * h).sum()))
            .collect();

        hidden2.iter().zip(NN_OUTPUT.iter()).map(|(h, w)| h * w).sum::<f64>() * NN_SCALE
    }

    /// Share of total layer-1 weight attached to each input
    fn input_importance() -> BTreeMap<String, f64> {
        let per_input: Vec<f64> = (0..NN_INPUTS)
            .map(|i| (0..NN_HIDDEN_1).map(|unit| layer1_weight(unit, i)).sum())
            .collect();
        let total: f64 = per_input.iter().sum();

        NN_INPUT_NAMES
            .iter()
            .zip(per_input)
            .map(|(name, w)| (name.to_string(), w / total))
            .collect()
    }
}

impl ForecastModel for NeuralNetwork {
    fn kind(&self) -> ModelKind {
        ModelKind::NeuralNetwork
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn predict(&self, features: &PlayerFeatures, _rng: &mut StdRng) -> ModelPrediction {
        let inputs = [
            features.recent_average() / NN_SCALE,
            features.season_average / NN_SCALE,
            features.matchup_favorability(),
            features.team_favorability(),
            features.consistency_score,
        ];

        ModelPrediction {
            prediction: Self::forward(&inputs).max(0.0),
            confidence: self.confidence,
            weight: self.weight,
            feature_importance: Self::input_importance(),
        }
    }
}

/// The four models that make up the ensemble, one per consensus slot
#[derive(Clone)]
pub struct ModelSuite {
    models: [Arc<dyn ForecastModel>; 4],
}

impl ModelSuite {
    /// Build the standard suite from configuration
    pub fn from_params(params: &ModelParameters) -> Self {
        Self {
            models: [
                Arc::new(LinearRegression::new(
                    params.linear_regression_weight,
                    params.linear_regression_confidence,
                )),
                Arc::new(RandomForest::new(params.random_forest_weight, params.random_forest_trees)),
                Arc::new(GradientBoosting::new(
                    params.gradient_boosting_weight,
                    params.gradient_boosting_confidence,
                    params.boosting_iterations,
                    params.boosting_learning_rate,
                )),
                Arc::new(NeuralNetwork::new(
                    params.neural_network_weight,
                    params.neural_network_confidence,
                )),
            ],
        }
    }

    /// Replace the model in the slot named by `model.kind()`
    pub fn with_model(mut self, model: Arc<dyn ForecastModel>) -> Self {
        let slot = model.kind().index() as usize;
        self.models[slot] = model;
        self
    }

    /// Models in `ModelKind::ALL` order
    pub fn models(&self) -> &[Arc<dyn ForecastModel>; 4] {
        &self.models
    }

    /// Always four; one model per consensus slot
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.models.len()
    }
}

impl std::fmt::Debug for ModelSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.models.iter().map(|m| m.kind())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use rand::SeedableRng;

    fn scenario_features() -> PlayerFeatures {
        let mut features = FeatureExtractor::default().default_features("p1", 1);
        features.recent_performance = vec![10.0, 12.0, 11.0, 9.0, 13.0];
        features.season_average = 11.0;
        features.career_average = 11.0 * 0.95;
        features.matchup_difficulty = 2.0;
        features.team_offensive_rank = 5;
        features.consistency_score = 0.87;
        features.cold_start = false;
        features
    }

    fn zero_features() -> PlayerFeatures {
        let mut features = FeatureExtractor::default().default_features("p0", 1);
        features.recent_performance = vec![0.0; 5];
        features.season_average = 0.0;
        features.matchup_difficulty = 10.0;
        features.team_offensive_rank = 32;
        features.consistency_score = 0.0;
        features
    }

    #[test]
    fn test_linear_regression_formula() {
        let model = LinearRegression::new(0.15, 0.75);
        let mut rng = StdRng::seed_from_u64(0);
        let result = model.predict(&scenario_features(), &mut rng);

        // 11*0.4 + 11*0.3 + 0.8*15*0.2 + (27/32)*10*0.1
        let expected = 4.4 + 3.3 + 2.4 + 0.84375;
        assert!((result.prediction - expected).abs() < 1e-9);
        assert_eq!(format!("{:.2}", result.prediction), "10.94");
        assert_eq!(result.confidence, 0.75);
        assert_eq!(result.weight, 0.15);
    }

    #[test]
    fn test_random_forest_is_seeded_and_bounded() {
        let model = RandomForest::new(0.25, 100);
        let features = scenario_features();

        let a = model.predict(&features, &mut StdRng::seed_from_u64(5));
        let b = model.predict(&features, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);

        // Each tree lies in [11*0.8 + 4, 11*1.2 + 4 + 2]
        assert!(a.prediction >= 12.8 && a.prediction <= 19.2);
        assert!((0.5..=0.95).contains(&a.confidence));
    }

    #[test]
    fn test_gradient_boosting_moves_toward_recent_form() {
        let model = GradientBoosting::new(0.25, 0.85, 50, 0.1);
        let mut features = scenario_features();
        features.recent_performance = vec![20.0; 5];
        features.season_average = 10.0;
        features.matchup_difficulty = 5.0;
        features.team_offensive_rank = 16;

        let result = model.predict(&features, &mut StdRng::seed_from_u64(0));
        assert!(result.prediction > 10.0 && result.prediction < 20.0);
        assert_eq!(result.confidence, 0.85);

        // With neutral favorability the adjustments cancel to 1.0
        let mut expected = 10.0;
        for i in 0..50 {
            expected += 0.1 * (20.0 - expected) * (1.0 - i as f64 / 50.0);
        }
        assert!((result.prediction - expected).abs() < 1e-9);
    }

    #[test]
    fn test_neural_network_is_deterministic() {
        let model = NeuralNetwork::new(0.35, 0.78);
        let features = scenario_features();
        let a = model.predict(&features, &mut StdRng::seed_from_u64(1));
        let b = model.predict(&features, &mut StdRng::seed_from_u64(2));

        assert_eq!(a, b);
        assert!(a.prediction > 0.0);
        let total: f64 = a.feature_importance.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_predictions_never_negative() {
        let features = zero_features();
        let suite = ModelSuite::from_params(&ModelParameters::default());
        for model in suite.models() {
            let result = model.predict(&features, &mut StdRng::seed_from_u64(3));
            assert!(result.prediction >= 0.0, "{} went negative", model.kind());
        }
    }

    #[test]
    fn test_suite_weights_sum_to_one() {
        let suite = ModelSuite::from_params(&ModelParameters::default());
        let total: f64 = suite.models().iter().map(|m| m.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);

        let kinds: Vec<ModelKind> = suite.models().iter().map(|m| m.kind()).collect();
        assert_eq!(kinds, ModelKind::ALL.to_vec());
    }

    #[test]
    fn test_with_model_replaces_slot() {
        let suite = ModelSuite::from_params(&ModelParameters::default())
            .with_model(Arc::new(LinearRegression::new(0.35, 0.5)) as Arc<dyn ForecastModel>);
        // Linear regression slot now carries the new weight
        assert_eq!(suite.models()[0].weight(), 0.35);
        assert_eq!(suite.len(), 4);
    }
}
