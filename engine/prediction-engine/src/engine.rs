//! Prediction Engine façade
//!
//! Pipeline per request: history lookup -> feature extraction -> four model
//! tasks fanned out on the blocking pool and joined -> ensemble -> range,
//! volatility, stat lines and narrative -> cached `PlayerPrediction`.

use crate::cache::{CacheKey, PredictionCache};
use crate::comparison::{compare_predictions, rank_predictions};
use crate::config::PredictionConfig;
use crate::ensemble::build_consensus;
use crate::error::{PredictionError, Result};
use crate::features::FeatureExtractor;
use crate::history::HistoricalStats;
use crate::models::ModelSuite;
use crate::narrative::narrate;
use crate::projections::project_stats;
use crate::types::{
    BatchPrediction, EngineStatus, ModelConsensus, ModelPrediction, PlayerComparison, PlayerFeatures,
    PlayerPrediction, PlayerSubject, PredictionRange, PredictionStatus,
};
use crate::volatility::{fantasy_points_range, volatility};
use chrono::Utc;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use siphasher::sip::SipHasher13;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Narrative entry attached to every baseline prediction
pub const FALLBACK_NOTE: &str = "Using baseline projection due to limited data";

/// Position filter that keeps every subject in `rank`
pub const ALL_POSITIONS: &str = "ALL";

const FALLBACK_BAND: f64 = 0.3;
const FALLBACK_VOLATILITY: f64 = 1.0;

pub struct PredictionEngine {
    config: PredictionConfig,
    history: Arc<dyn HistoricalStats>,
    cache: Arc<PredictionCache>,
    extractor: FeatureExtractor,
    models: ModelSuite,
}

impl PredictionEngine {
    /// Create an engine with a fresh cache and the standard model suite
    pub fn new(config: PredictionConfig, history: Arc<dyn HistoricalStats>) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(PredictionCache::new(config.cache_ttl()));
        let extractor = FeatureExtractor::new(config.engine.max_recent_games);
        let models = ModelSuite::from_params(&config.models);

        info!(
            "🔧 Prediction engine ready: {} models, seed {}, cache ttl {}s",
            models.len(),
            config.engine.random_seed,
            config.engine.cache_ttl_secs
        );

        Ok(Self { config, history, cache, extractor, models })
    }

    /// Swap in a different model suite
    pub fn with_models(mut self, models: ModelSuite) -> Self {
        self.models = models;
        self
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Predict one player, substituting the baseline projection on any failure
    pub async fn predict(&self, subject: &PlayerSubject, week: u32) -> PlayerPrediction {
        match self.try_predict(subject, week).await {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!("Prediction failed for {} ({}): {}, using baseline", subject.name, subject.player_id, e);
                self.default_prediction(subject, week)
            }
        }
    }

    /// Predict one player, surfacing failures
    ///
    /// Results are cached by `(player_id, week)` only. A later request for the
    /// same key within the TTL gets the cached prediction even if it carries a
    /// different `GameContext`; call `clear_cache` after changing context.
    /// Concurrent misses for one key both compute and the last write wins.
    pub async fn try_predict(&self, subject: &PlayerSubject, week: u32) -> Result<PlayerPrediction> {
        let key = CacheKey::new(subject.player_id.clone(), week);
        if self.config.engine.cache_enabled {
            if let Some(cached) = self.cache.get(&key) {
                debug!("Cache hit for {} week {}", subject.player_id, week);
                return Ok((*cached).clone());
            }
        }

        let recent = self
            .history
            .recent_stats(&subject.player_id)
            .await
            .map_err(|e| match e {
                PredictionError::DataAccess(_) => e,
                other => PredictionError::DataAccess(other.to_string()),
            })?;

        let seed = self.request_seed(&subject.player_id, week);
        let mut rng = StdRng::seed_from_u64(seed);
        let features =
            self.extractor.extract(&subject.player_id, week, &recent, subject.context.as_ref(), &mut rng)?;

        let consensus = self.run_models(Arc::new(features.clone()), seed).await?;
        let prediction = self.assemble(subject, week, &features, consensus);

        info!(
            "🔮 {} ({}) week {}: {:.1} pts [{:.1}-{:.1}], {:.0}% confidence",
            prediction.player_name,
            prediction.position,
            week,
            prediction.fantasy_points.expected,
            prediction.floor,
            prediction.ceiling,
            prediction.confidence * 100.0
        );

        if self.config.engine.cache_enabled {
            self.cache.insert(key, Arc::new(prediction.clone()));
        }

        Ok(prediction)
    }

    /// Predict many players concurrently; one entry per subject, input order kept
    pub async fn predict_batch(&self, subjects: &[PlayerSubject], week: u32) -> Vec<BatchPrediction> {
        let results = join_all(subjects.iter().map(|s| self.try_predict(s, week))).await;

        let batch: Vec<BatchPrediction> = subjects
            .iter()
            .zip(results)
            .map(|(subject, result)| match result {
                Ok(prediction) => BatchPrediction {
                    player_id: subject.player_id.clone(),
                    status: PredictionStatus::Success,
                    error: None,
                    prediction,
                },
                Err(e) => {
                    warn!("Batch prediction failed for {}: {}", subject.player_id, e);
                    BatchPrediction {
                        player_id: subject.player_id.clone(),
                        status: PredictionStatus::Fallback,
                        error: Some(e.to_string()),
                        prediction: self.default_prediction(subject, week),
                    }
                }
            })
            .collect();

        let fallbacks = batch.iter().filter(|b| b.status == PredictionStatus::Fallback).count();
        info!("✅ Batch of {} predictions complete ({} fallbacks)", batch.len(), fallbacks);
        batch
    }

    /// Compare two players for the same week
    pub async fn compare(
        &self,
        player1: &PlayerSubject,
        player2: &PlayerSubject,
        week: u32,
    ) -> PlayerComparison {
        let (p1, p2) = tokio::join!(self.predict(player1, week), self.predict(player2, week));
        let comparison = compare_predictions(p1, p2, &self.config.comparison);
        info!("Comparison {} vs {}: {}", player1.name, player2.name, comparison.recommendation);
        comparison
    }

    /// Predict and sort players by expected points, highest first
    ///
    /// `position` filters subjects case-insensitively; `"ALL"` or an empty string
    /// keeps everyone. Failed subjects appear with their baseline projection.
    pub async fn rank(&self, position: &str, week: u32, subjects: &[PlayerSubject]) -> Vec<PlayerPrediction> {
        let keep_all = position.trim().is_empty() || position.eq_ignore_ascii_case(ALL_POSITIONS);
        let selected: Vec<&PlayerSubject> = subjects
            .iter()
            .filter(|s| keep_all || s.position.eq_ignore_ascii_case(position.trim()))
            .collect();

        let predictions = join_all(selected.iter().map(|s| self.predict(s, week))).await;
        rank_predictions(predictions)
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            models_loaded: self.models.len(),
            cache_size: self.cache.len(),
            cache_ttl_secs: self.config.engine.cache_ttl_secs,
            seed: self.config.engine.random_seed,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Prediction cache cleared");
    }

    /// Drop expired cache entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let purged = self.cache.purge_expired();
        debug!("Purged {} expired predictions", purged);
        purged
    }

    /// Baseline projection used when a prediction cannot be computed
    pub fn default_prediction(&self, subject: &PlayerSubject, week: u32) -> PlayerPrediction {
        let baseline = self.config.get_baseline_for_position(&subject.position);
        let confidence = self.config.fallback.confidence;

        let member = |weight: f64| ModelPrediction {
            prediction: baseline,
            confidence,
            weight,
            feature_importance: BTreeMap::new(),
        };
        let weights = self.config.models.weights();
        let model_consensus = ModelConsensus {
            linear_regression: member(weights[0]),
            random_forest: member(weights[1]),
            gradient_boosting: member(weights[2]),
            neural_network: member(weights[3]),
            ensemble: member(1.0),
        };

        let fantasy_points = PredictionRange::new(
            baseline,
            baseline * (1.0 - FALLBACK_BAND),
            baseline * (1.0 + FALLBACK_BAND),
            confidence,
        );

        PlayerPrediction {
            player_id: subject.player_id.clone(),
            player_name: subject.name.clone(),
            position: subject.position.clone(),
            team: subject.team.clone(),
            week,
            fantasy_points,
            ceiling: fantasy_points.high,
            floor: fantasy_points.low,
            projected_stats: project_stats(&subject.position, baseline, confidence),
            confidence,
            volatility: FALLBACK_VOLATILITY,
            model_consensus,
            key_factors: vec![FALLBACK_NOTE.to_string()],
            risk_factors: Vec::new(),
            upside: Vec::new(),
            reasoning: format!(
                "{FALLBACK_NOTE}: {} is projected at the {} baseline of {:.1} points.",
                subject.name, subject.position, baseline
            ),
            is_fallback: true,
            last_updated: Utc::now(),
        }
    }

    /// Per-request seed; independent of request order and concurrency
    fn request_seed(&self, player_id: &str, week: u32) -> u64 {
        let seed = self.config.engine.random_seed;
        let mut hasher = SipHasher13::new_with_keys(seed, seed ^ 0x9E37_79B9_7F4A_7C15);
        player_id.hash(&mut hasher);
        week.hash(&mut hasher);
        hasher.finish()
    }

    /// Run the four models as independent blocking tasks and join them
    async fn run_models(&self, features: Arc<PlayerFeatures>, seed: u64) -> Result<ModelConsensus> {
        let handles = self.models.models().iter().map(|model| {
            let model = Arc::clone(model);
            let features = Arc::clone(&features);
            tokio::task::spawn_blocking(move || {
                // Stream 0 belongs to feature extraction
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1 + model.kind().index()));
                let prediction = model.predict(&features, &mut rng);
                (model.kind(), prediction)
            })
        });

        let mut outputs = Vec::with_capacity(self.models.len());
        for joined in join_all(handles).await {
            let (kind, prediction) = joined?;
            if !prediction.prediction.is_finite() || !prediction.confidence.is_finite() {
                return Err(PredictionError::Computation(format!("{kind} produced a non-finite output")));
            }
            debug!(
                "{}: {:.2} pts (confidence {:.2}, weight {:.2})",
                kind, prediction.prediction, prediction.confidence, prediction.weight
            );
            outputs.push(prediction);
        }

        let [linear_regression, random_forest, gradient_boosting, neural_network]: [ModelPrediction; 4] =
            outputs
                .try_into()
                .map_err(|_| PredictionError::Computation("expected four model outputs".into()))?;

        build_consensus(linear_regression, random_forest, gradient_boosting, neural_network)
    }

    fn assemble(
        &self,
        subject: &PlayerSubject,
        week: u32,
        features: &PlayerFeatures,
        model_consensus: ModelConsensus,
    ) -> PlayerPrediction {
        let expected = model_consensus.ensemble.prediction.max(0.0);
        let confidence = model_consensus.ensemble.confidence.clamp(0.0, 1.0);

        let fantasy_points = fantasy_points_range(expected, confidence, features);
        let narrative = narrate(&subject.name, &subject.position, features, &model_consensus.ensemble);

        PlayerPrediction {
            player_id: subject.player_id.clone(),
            player_name: subject.name.clone(),
            position: subject.position.clone(),
            team: subject.team.clone(),
            week,
            fantasy_points,
            ceiling: fantasy_points.high,
            floor: fantasy_points.low,
            projected_stats: project_stats(&subject.position, expected, confidence),
            confidence,
            volatility: volatility(features),
            model_consensus,
            key_factors: narrative.key_factors,
            risk_factors: narrative.risk_factors,
            upside: narrative.upside,
            reasoning: narrative.reasoning,
            is_fallback: false,
            last_updated: Utc::now(),
        }
    }
}

impl std::fmt::Debug for PredictionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionEngine")
            .field("config", &self.config)
            .field("models", &self.models)
            .field("cache_size", &self.cache.len())
            .finish()
    }
}
