//! Shared types for the Prediction Engine
//!
//! Field names serialize in camelCase; the calling layer renders these shapes
//! directly (`fantasyPoints.expected`, `modelConsensus.randomForest`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Direction of recent production relative to the earlier games in the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

/// Expected competitive flow of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameScript {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherImpact {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Healthy,
    Questionable,
    Recovering,
}

/// Optional per-player efficiency metrics supplied by upstream context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedMetrics {
    pub air_yards_share: f64,
    pub yards_after_contact: f64,
    pub yards_per_touch: f64,
    pub pressure_rate: f64,
}

/// Feature vector for one player and one week
///
/// Built fresh for every prediction request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFeatures {
    pub player_id: String,
    pub week: u32,

    /// Recent scores, most recent first
    pub recent_performance: Vec<f64>,
    pub season_average: f64,
    pub career_average: f64,
    /// 0-1, higher = more stable
    pub consistency_score: f64,
    pub trend_direction: TrendDirection,

    /// 0-10, higher = harder opponent
    pub matchup_difficulty: f64,
    /// 1-32
    pub position_rank: u32,
    pub target_share: f64,
    pub red_zone_targets: u32,
    pub snap_count_percentage: f64,

    /// 1-32, lower = better offense
    pub team_offensive_rank: u32,
    /// 1-32, lower = better defense
    pub team_defensive_rank: u32,
    pub game_script: GameScript,

    pub weather_impact: WeatherImpact,
    pub venue: Venue,
    pub rest_days: u32,
    /// Stadium altitude in feet
    pub altitude: f64,

    /// 0-1
    pub injury_risk: f64,
    pub recovery_status: RecoveryStatus,

    pub advanced_metrics: Option<AdvancedMetrics>,

    /// True when no historical data existed and defaults were used
    pub cold_start: bool,
}

impl PlayerFeatures {
    /// Mean of the recent scores, or the season average when there are none
    pub fn recent_average(&self) -> f64 {
        if self.recent_performance.is_empty() {
            return self.season_average;
        }
        self.recent_performance.iter().sum::<f64>() / self.recent_performance.len() as f64
    }

    /// `(10 - difficulty) / 10`, 1.0 = easiest matchup
    pub fn matchup_favorability(&self) -> f64 {
        (10.0 - self.matchup_difficulty) / 10.0
    }

    /// `(32 - offensive rank) / 32`
    pub fn team_favorability(&self) -> f64 {
        (32.0 - self.team_offensive_rank as f64) / 32.0
    }
}

/// Contextual inputs supplied by the caller
///
/// Every field is optional; anything left out is sampled as a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameContext {
    pub matchup_difficulty: Option<f64>,
    pub position_rank: Option<u32>,
    pub target_share: Option<f64>,
    pub red_zone_targets: Option<u32>,
    pub snap_count_percentage: Option<f64>,
    pub team_offensive_rank: Option<u32>,
    pub team_defensive_rank: Option<u32>,
    pub game_script: Option<GameScript>,
    pub weather_impact: Option<WeatherImpact>,
    pub venue: Option<Venue>,
    pub rest_days: Option<u32>,
    pub altitude: Option<f64>,
    pub injury_risk: Option<f64>,
    pub recovery_status: Option<RecoveryStatus>,
    pub advanced_metrics: Option<AdvancedMetrics>,
}

/// Identity of the player being predicted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSubject {
    pub player_id: String,
    pub name: String,
    pub position: String,
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<GameContext>,
}

impl PlayerSubject {
    pub fn new(
        player_id: impl Into<String>,
        name: impl Into<String>,
        position: impl Into<String>,
        team: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
            position: position.into(),
            team: team.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: GameContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// The four ensemble members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelKind {
    LinearRegression,
    RandomForest,
    GradientBoosting,
    NeuralNetwork,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::LinearRegression,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
        ModelKind::NeuralNetwork,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "linearRegression",
            ModelKind::RandomForest => "randomForest",
            ModelKind::GradientBoosting => "gradientBoosting",
            ModelKind::NeuralNetwork => "neuralNetwork",
        }
    }

    /// Position in `ModelKind::ALL`, used to derive per-model random streams
    pub fn index(&self) -> u64 {
        match self {
            ModelKind::LinearRegression => 0,
            ModelKind::RandomForest => 1,
            ModelKind::GradientBoosting => 2,
            ModelKind::NeuralNetwork => 3,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of a single model run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPrediction {
    /// Point estimate, never negative
    pub prediction: f64,
    /// 0-1
    pub confidence: f64,
    /// Fixed per model type
    pub weight: f64,
    /// Named contributing factors, values sum to ~1.0
    pub feature_importance: BTreeMap<String, f64>,
}

/// All four model outputs plus the weighted consensus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConsensus {
    pub linear_regression: ModelPrediction,
    pub random_forest: ModelPrediction,
    pub gradient_boosting: ModelPrediction,
    pub neural_network: ModelPrediction,
    /// Weight is always 1.0
    pub ensemble: ModelPrediction,
}

impl ModelConsensus {
    /// The four member predictions in `ModelKind::ALL` order
    pub fn members(&self) -> [(ModelKind, &ModelPrediction); 4] {
        [
            (ModelKind::LinearRegression, &self.linear_regression),
            (ModelKind::RandomForest, &self.random_forest),
            (ModelKind::GradientBoosting, &self.gradient_boosting),
            (ModelKind::NeuralNetwork, &self.neural_network),
        ]
    }
}

/// Expected value with a low/high band; always `low <= expected <= high`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRange {
    pub expected: f64,
    pub low: f64,
    pub high: f64,
    pub confidence: f64,
}

impl PredictionRange {
    /// Create a range, widening the bounds if needed so they enclose `expected`
    pub fn new(expected: f64, low: f64, high: f64, confidence: f64) -> Self {
        Self { expected, low: low.min(expected), high: high.max(expected), confidence }
    }

    pub fn contains_expected(&self) -> bool {
        self.low <= self.expected && self.expected <= self.high
    }
}

/// Complete prediction for one player and one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPrediction {
    pub player_id: String,
    pub player_name: String,
    pub position: String,
    pub team: String,
    pub week: u32,

    pub fantasy_points: PredictionRange,
    pub ceiling: f64,
    pub floor: f64,

    /// Position-specific stat lines (`passingYards`, `receptions`, ...)
    #[serde(flatten)]
    pub projected_stats: BTreeMap<String, PredictionRange>,

    pub confidence: f64,
    /// 0.1 - 2.0
    pub volatility: f64,
    pub model_consensus: ModelConsensus,

    pub key_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub upside: Vec<String>,
    pub reasoning: String,

    /// True when this is the baseline projection substituted after a failure
    pub is_fallback: bool,
    pub last_updated: DateTime<Utc>,
}

/// Recommendation produced by a head-to-head comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Player1,
    Player2,
    TossUp,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Player1 => "player1",
            Recommendation::Player2 => "player2",
            Recommendation::TossUp => "toss_up",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonAdvantages {
    pub player1: Vec<String>,
    pub player2: Vec<String>,
}

/// Head-to-head comparison of two predictions; derived, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerComparison {
    pub player1: PlayerPrediction,
    pub player2: PlayerPrediction,
    pub recommendation: Recommendation,
    /// `player1.expected - player2.expected`
    pub point_difference: f64,
    /// `player1.confidence - player2.confidence`
    pub confidence_difference: f64,
    pub advantages: ComparisonAdvantages,
    pub risk_comparison: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Success,
    Fallback,
}

/// One entry of a batch prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPrediction {
    pub player_id: String,
    pub status: PredictionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub prediction: PlayerPrediction,
}

/// Service status snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub models_loaded: usize,
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_range_encloses_expected() {
        let range = PredictionRange::new(10.0, 12.0, 8.0, 0.7);
        assert!(range.contains_expected());
        assert_eq!(range.low, 10.0);
        assert_eq!(range.high, 10.0);

        let range = PredictionRange::new(10.0, 7.0, 14.5, 0.7);
        assert_eq!((range.low, range.high), (7.0, 14.5));
    }

    #[test]
    fn test_recommendation_serialization() {
        assert_eq!(serde_json::to_string(&Recommendation::TossUp).unwrap(), "\"toss_up\"");
        assert_eq!(serde_json::to_string(&Recommendation::Player1).unwrap(), "\"player1\"");
        assert_eq!(Recommendation::Player2.to_string(), "player2");
    }

    #[test]
    fn test_model_kind_names() {
        let names: Vec<&str> = ModelKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["linearRegression", "randomForest", "gradientBoosting", "neuralNetwork"]);
    }

    #[test]
    fn test_game_context_deserializes_partially() {
        let context: GameContext =
            serde_json::from_str(r#"{"matchupDifficulty": 3.5, "weatherImpact": "negative"}"#).unwrap();
        assert_eq!(context.matchup_difficulty, Some(3.5));
        assert_eq!(context.weather_impact, Some(WeatherImpact::Negative));
        assert!(context.team_offensive_rank.is_none());
    }
}
