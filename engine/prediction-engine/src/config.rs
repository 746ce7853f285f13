//! Configuration for the Prediction Engine

use crate::error::{PredictionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Configuration for the Prediction Engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Engine-level parameters (seed, cache)
    pub engine: EngineParameters,

    /// Ensemble model parameters
    pub models: ModelParameters,

    /// Player comparison thresholds
    pub comparison: ComparisonParameters,

    /// Baseline projections used when a prediction cannot be computed
    pub fallback: FallbackParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParameters {
    /// Seed for placeholder features and the random forest
    pub random_seed: u64,

    /// Prediction cache time-to-live in seconds
    pub cache_ttl_secs: u64,

    /// Enable the prediction cache
    pub cache_enabled: bool,

    /// Maximum number of recent games used for feature extraction
    pub max_recent_games: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameters {
    pub linear_regression_weight: f64,
    pub random_forest_weight: f64,
    pub gradient_boosting_weight: f64,
    pub neural_network_weight: f64,

    pub linear_regression_confidence: f64,
    pub gradient_boosting_confidence: f64,
    pub neural_network_confidence: f64,

    /// Number of simulated trees in the random forest
    pub random_forest_trees: usize,

    /// Number of residual-correction steps in gradient boosting
    pub boosting_iterations: usize,

    /// Gradient boosting learning rate before decay
    pub boosting_learning_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonParameters {
    /// Point gap below which two players may be a toss-up
    pub toss_up_points: f64,

    /// Confidence gap below which two players may be a toss-up
    pub toss_up_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackParameters {
    /// Baseline fantasy points per position (e.g. "QB" -> 18.0)
    pub baseline_points: HashMap<String, f64>,

    /// Baseline for positions not listed above
    pub default_points: f64,

    /// Confidence attached to every baseline prediction
    pub confidence: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            engine: EngineParameters::default(),
            models: ModelParameters::default(),
            comparison: ComparisonParameters::default(),
            fallback: FallbackParameters::default(),
        }
    }
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            random_seed: 42,
            cache_ttl_secs: 30 * 60, // 30 minutes
            cache_enabled: true,
            max_recent_games: 5,
        }
    }
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            linear_regression_weight: 0.15,
            random_forest_weight: 0.25,
            gradient_boosting_weight: 0.25,
            neural_network_weight: 0.35,
            linear_regression_confidence: 0.75,
            gradient_boosting_confidence: 0.85,
            neural_network_confidence: 0.78,
            random_forest_trees: 100,
            boosting_iterations: 50,
            boosting_learning_rate: 0.1,
        }
    }
}

impl Default for ComparisonParameters {
    fn default() -> Self {
        Self { toss_up_points: 1.0, toss_up_confidence: 0.1 }
    }
}

impl Default for FallbackParameters {
    fn default() -> Self {
        let mut baseline_points = HashMap::new();
        baseline_points.insert("QB".to_string(), 18.0);
        baseline_points.insert("RB".to_string(), 12.0);
        baseline_points.insert("WR".to_string(), 11.0);
        baseline_points.insert("TE".to_string(), 8.0);
        baseline_points.insert("K".to_string(), 7.0);
        baseline_points.insert("DEF".to_string(), 7.0);

        Self { baseline_points, default_points: 10.0, confidence: 0.5 }
    }
}

impl PredictionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(seed) = std::env::var("PREDICTION_SEED") {
            config.engine.random_seed = seed.parse().unwrap_or(42);
        }

        if let Ok(ttl) = std::env::var("PREDICTION_CACHE_TTL_SECS") {
            config.engine.cache_ttl_secs = ttl.parse().unwrap_or(30 * 60);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from defaults, an optional file, and
    /// `PREDICTION__<SECTION>__<KEY>` environment variables, in that order
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix("PREDICTION").separator("__").try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check weights, confidences and thresholds
    pub fn validate(&self) -> Result<()> {
        let weights = self.models.weights();
        if weights.iter().any(|w| *w < 0.0) {
            return Err(PredictionError::Configuration("model weights must be non-negative".into()));
        }

        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(PredictionError::Configuration(format!(
                "model weights must sum to 1.0, got {total:.4}"
            )));
        }

        let confidences = [
            self.models.linear_regression_confidence,
            self.models.gradient_boosting_confidence,
            self.models.neural_network_confidence,
            self.fallback.confidence,
        ];
        if confidences.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(PredictionError::Configuration("confidences must lie in [0, 1]".into()));
        }

        if self.models.random_forest_trees == 0 {
            return Err(PredictionError::Configuration("random forest needs at least one tree".into()));
        }

        if self.comparison.toss_up_points < 0.0 || self.comparison.toss_up_confidence < 0.0 {
            return Err(PredictionError::Configuration("toss-up thresholds must be non-negative".into()));
        }

        Ok(())
    }

    /// Cache time-to-live as a `Duration`
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.engine.cache_ttl_secs)
    }

    /// Baseline projection for a position, ignoring case
    pub fn get_baseline_for_position(&self, position: &str) -> f64 {
        self.fallback
            .baseline_points
            .iter()
            .find(|(pos, _)| pos.eq_ignore_ascii_case(position))
            .map(|(_, points)| *points)
            .unwrap_or(self.fallback.default_points)
    }
}

impl ModelParameters {
    /// Weights in model order: linear regression, random forest, gradient boosting, neural network
    pub fn weights(&self) -> [f64; 4] {
        [
            self.linear_regression_weight,
            self.random_forest_weight,
            self.gradient_boosting_weight,
            self.neural_network_weight,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = PredictionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.engine.max_recent_games, 5);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = PredictionConfig::default();
        config.models.neural_network_weight = 0.5;
        assert!(matches!(config.validate(), Err(PredictionError::Configuration(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = PredictionConfig::default();
        config.models.linear_regression_weight = -0.15;
        config.models.neural_network_weight = 0.65;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("PREDICTION_SEED", "99");
        std::env::set_var("PREDICTION_CACHE_TTL_SECS", "not-a-number");
        let config = PredictionConfig::from_env().unwrap();
        std::env::remove_var("PREDICTION_SEED");
        std::env::remove_var("PREDICTION_CACHE_TTL_SECS");

        assert_eq!(config.engine.random_seed, 99);
        // Unparseable values fall back to the default
        assert_eq!(config.engine.cache_ttl_secs, 1800);
    }

    #[test]
    fn test_baseline_lookup() {
        let config = PredictionConfig::default();
        assert_eq!(config.get_baseline_for_position("QB"), 18.0);
        assert_eq!(config.get_baseline_for_position("rb"), 12.0);
        assert_eq!(config.get_baseline_for_position("LS"), 10.0);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[engine]\nrandom_seed = 7\ncache_ttl_secs = 60").unwrap();

        let config = PredictionConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.engine.random_seed, 7);
        assert_eq!(config.engine.cache_ttl_secs, 60);
        // Untouched sections keep their defaults
        assert_eq!(config.models.random_forest_trees, 100);
        assert_eq!(config.comparison.toss_up_points, 1.0);
    }
}
