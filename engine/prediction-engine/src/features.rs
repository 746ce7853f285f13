//! Feature extraction from recent scores and game context

use crate::error::{PredictionError, Result};
use crate::types::{
    GameContext, GameScript, PlayerFeatures, RecoveryStatus, TrendDirection, Venue, WeatherImpact,
};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Relative change between the 3 most recent games and the rest of the window
/// needed to call a trend
const TREND_THRESHOLD: f64 = 0.15;

/// Games counted as "most recent" when computing the trend
const TREND_WINDOW: usize = 3;

/// Consistency used when it cannot be computed
const DEFAULT_CONSISTENCY: f64 = 0.5;

/// Season average used for cold-start players
const COLD_START_AVERAGE: f64 = 10.0;

/// Builds `PlayerFeatures` for a single request
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    max_recent_games: usize,
}

impl FeatureExtractor {
    pub fn new(max_recent_games: usize) -> Self {
        Self { max_recent_games: max_recent_games.max(1) }
    }

    /// Extract features for a player
    ///
    /// `recent_scores` is most-recent-first; only the first `max_recent_games`
    /// entries are used. An empty slice yields the cold-start vector.
    pub fn extract<R: Rng + ?Sized>(
        &self,
        player_id: &str,
        week: u32,
        recent_scores: &[f64],
        context: Option<&GameContext>,
        rng: &mut R,
    ) -> Result<PlayerFeatures> {
        let window = &recent_scores[..recent_scores.len().min(self.max_recent_games)];

        if let Some(bad) = window.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(PredictionError::Computation(format!(
                "invalid historical score {bad} for player {player_id}"
            )));
        }

        if let Some(context) = context {
            check_context(player_id, context)?;
        }

        if window.is_empty() {
            debug!("No history for player {}, using cold-start features", player_id);
            let mut features = self.default_features(player_id, week);
            if let Some(context) = context {
                apply_context(&mut features, context);
            }
            return Ok(features);
        }

        let season_average = mean(window);
        let mut features = PlayerFeatures {
            player_id: player_id.to_string(),
            week,
            recent_performance: window.to_vec(),
            season_average,
            career_average: season_average * 0.95,
            consistency_score: consistency_score(window),
            trend_direction: trend_direction(window),
            matchup_difficulty: rng.gen_range(0.0..=10.0),
            position_rank: rng.gen_range(1..=32),
            target_share: rng.gen_range(0.05..=0.30),
            red_zone_targets: rng.gen_range(0..=6),
            snap_count_percentage: rng.gen_range(0.5..=1.0),
            team_offensive_rank: rng.gen_range(1..=32),
            team_defensive_rank: rng.gen_range(1..=32),
            game_script: pick(rng, &[GameScript::Positive, GameScript::Neutral, GameScript::Negative]),
            weather_impact: pick(
                rng,
                &[WeatherImpact::Positive, WeatherImpact::Neutral, WeatherImpact::Negative],
            ),
            venue: pick(rng, &[Venue::Home, Venue::Away]),
            rest_days: rng.gen_range(4..=14),
            altitude: rng.gen_range(0.0..=1000.0),
            injury_risk: rng.gen_range(0.0..=0.5),
            recovery_status: RecoveryStatus::Healthy,
            advanced_metrics: None,
            cold_start: false,
        };
        features.recovery_status = recovery_for_risk(features.injury_risk);

        if let Some(context) = context {
            apply_context(&mut features, context);
        }

        debug!(
            "Extracted features for {}: season_avg={:.2}, consistency={:.2}, trend={:?}",
            player_id, features.season_average, features.consistency_score, features.trend_direction
        );

        Ok(features)
    }

    /// Fixed mid-range feature vector for players with no history
    pub fn default_features(&self, player_id: &str, week: u32) -> PlayerFeatures {
        PlayerFeatures {
            player_id: player_id.to_string(),
            week,
            recent_performance: vec![COLD_START_AVERAGE; self.max_recent_games],
            season_average: COLD_START_AVERAGE,
            career_average: COLD_START_AVERAGE * 0.95,
            consistency_score: DEFAULT_CONSISTENCY,
            trend_direction: TrendDirection::Stable,
            matchup_difficulty: 5.0,
            position_rank: 16,
            target_share: 0.15,
            red_zone_targets: 2,
            snap_count_percentage: 0.65,
            team_offensive_rank: 16,
            team_defensive_rank: 16,
            game_script: GameScript::Neutral,
            weather_impact: WeatherImpact::Neutral,
            venue: Venue::Home,
            rest_days: 7,
            altitude: 0.0,
            injury_risk: 0.1,
            recovery_status: RecoveryStatus::Healthy,
            advanced_metrics: None,
            cold_start: true,
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Reject context values that clamping cannot repair
fn check_context(player_id: &str, context: &GameContext) -> Result<()> {
    let mut values = vec![
        ("matchupDifficulty", context.matchup_difficulty),
        ("targetShare", context.target_share),
        ("snapCountPercentage", context.snap_count_percentage),
        ("altitude", context.altitude),
        ("injuryRisk", context.injury_risk),
    ];
    if let Some(m) = &context.advanced_metrics {
        values.extend([
            ("airYardsShare", Some(m.air_yards_share)),
            ("yardsAfterContact", Some(m.yards_after_contact)),
            ("yardsPerTouch", Some(m.yards_per_touch)),
            ("pressureRate", Some(m.pressure_rate)),
        ]);
    }

    match values.into_iter().find(|(_, v)| v.is_some_and(|v| !v.is_finite())) {
        Some((name, Some(v))) => Err(PredictionError::Computation(format!(
            "invalid context value {name}={v} for player {player_id}"
        ))),
        _ => Ok(()),
    }
}

/// Override sampled fields with caller-supplied context, clamped to range
fn apply_context(features: &mut PlayerFeatures, context: &GameContext) {
    if let Some(v) = context.matchup_difficulty {
        features.matchup_difficulty = v.clamp(0.0, 10.0);
    }
    if let Some(v) = context.position_rank {
        features.position_rank = v.clamp(1, 32);
    }
    if let Some(v) = context.target_share {
        features.target_share = v.clamp(0.0, 1.0);
    }
    if let Some(v) = context.red_zone_targets {
        features.red_zone_targets = v;
    }
    if let Some(v) = context.snap_count_percentage {
        features.snap_count_percentage = v.clamp(0.0, 1.0);
    }
    if let Some(v) = context.team_offensive_rank {
        features.team_offensive_rank = v.clamp(1, 32);
    }
    if let Some(v) = context.team_defensive_rank {
        features.team_defensive_rank = v.clamp(1, 32);
    }
    if let Some(v) = context.game_script {
        features.game_script = v;
    }
    if let Some(v) = context.weather_impact {
        features.weather_impact = v;
    }
    if let Some(v) = context.venue {
        features.venue = v;
    }
    if let Some(v) = context.rest_days {
        features.rest_days = v;
    }
    if let Some(v) = context.altitude {
        features.altitude = v.max(0.0);
    }
    if let Some(v) = context.injury_risk {
        features.injury_risk = v.clamp(0.0, 1.0);
        features.recovery_status = recovery_for_risk(features.injury_risk);
    }
    if let Some(v) = context.recovery_status {
        features.recovery_status = v;
    }
    if let Some(v) = &context.advanced_metrics {
        features.advanced_metrics = Some(v.clone());
    }
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, options: &[T]) -> T {
    // options are non-empty literals
    *options.choose(rng).unwrap_or(&options[0])
}

fn recovery_for_risk(injury_risk: f64) -> RecoveryStatus {
    if injury_risk > 0.35 {
        RecoveryStatus::Recovering
    } else if injury_risk > 0.2 {
        RecoveryStatus::Questionable
    } else {
        RecoveryStatus::Healthy
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `1 - stddev/mean`, clamped to [0, 1]
pub fn consistency_score(scores: &[f64]) -> f64 {
    let m = mean(scores);
    if scores.is_empty() || m == 0.0 {
        return DEFAULT_CONSISTENCY;
    }
    (1.0 - std_dev(scores) / m).clamp(0.0, 1.0)
}

/// Compare the 3 most recent games against the rest of the window
pub fn trend_direction(scores: &[f64]) -> TrendDirection {
    if scores.len() < TREND_WINDOW {
        return TrendDirection::Stable;
    }

    let (recent, earlier) = scores.split_at(TREND_WINDOW);
    let earlier_mean = mean(earlier);
    if earlier.is_empty() || earlier_mean <= 0.0 {
        return TrendDirection::Stable;
    }

    let delta = (mean(recent) - earlier_mean) / earlier_mean;
    if delta > TREND_THRESHOLD {
        TrendDirection::Improving
    } else if delta < -TREND_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_season_and_career_average() {
        let extractor = FeatureExtractor::default();
        let mut rng = StdRng::seed_from_u64(1);
        let features =
            extractor.extract("p1", 3, &[10.0, 12.0, 11.0, 9.0, 13.0], None, &mut rng).unwrap();

        assert!((features.season_average - 11.0).abs() < 1e-9);
        assert!((features.career_average - 10.45).abs() < 1e-9);
        assert!(!features.cold_start);
        assert_eq!(features.recent_performance.len(), 5);
    }

    #[test]
    fn test_window_is_truncated() {
        let extractor = FeatureExtractor::new(3);
        let mut rng = StdRng::seed_from_u64(1);
        let features = extractor.extract("p1", 1, &[1.0, 2.0, 3.0, 40.0], None, &mut rng).unwrap();
        assert_eq!(features.recent_performance, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_consistency_score() {
        assert_eq!(consistency_score(&[]), 0.5);
        assert_eq!(consistency_score(&[0.0, 0.0]), 0.5);
        assert_eq!(consistency_score(&[8.0, 8.0, 8.0]), 1.0);
        // Huge spread clamps at zero
        assert_eq!(consistency_score(&[0.0, 0.0, 0.0, 40.0]), 0.0);

        let scores = [10.0, 12.0, 11.0, 9.0, 13.0];
        let expected = 1.0 - 2.0_f64.sqrt() / 11.0;
        assert!((consistency_score(&scores) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_trend_direction() {
        assert_eq!(trend_direction(&[20.0, 20.0]), TrendDirection::Stable);
        assert_eq!(trend_direction(&[20.0, 20.0, 20.0]), TrendDirection::Stable);
        assert_eq!(trend_direction(&[20.0, 18.0, 22.0, 10.0, 12.0]), TrendDirection::Improving);
        assert_eq!(trend_direction(&[8.0, 9.0, 10.0, 15.0, 16.0]), TrendDirection::Declining);
        assert_eq!(trend_direction(&[10.0, 12.0, 11.0, 9.0, 13.0]), TrendDirection::Stable);
    }

    #[test]
    fn test_cold_start_features() {
        let extractor = FeatureExtractor::default();
        let mut rng = StdRng::seed_from_u64(1);
        let features = extractor.extract("rookie", 1, &[], None, &mut rng).unwrap();

        assert!(features.cold_start);
        assert_eq!(features, extractor.default_features("rookie", 1));
        assert_eq!(features.consistency_score, 0.5);
        assert_eq!(features.matchup_difficulty, 5.0);
    }

    #[test]
    fn test_context_overrides_and_clamps() {
        let extractor = FeatureExtractor::default();
        let mut rng = StdRng::seed_from_u64(9);
        let context = GameContext {
            matchup_difficulty: Some(14.0),
            team_offensive_rank: Some(5),
            weather_impact: Some(WeatherImpact::Negative),
            injury_risk: Some(0.4),
            ..Default::default()
        };
        let features =
            extractor.extract("p1", 2, &[10.0, 11.0, 12.0], Some(&context), &mut rng).unwrap();

        assert_eq!(features.matchup_difficulty, 10.0);
        assert_eq!(features.team_offensive_rank, 5);
        assert_eq!(features.weather_impact, WeatherImpact::Negative);
        assert_eq!(features.recovery_status, RecoveryStatus::Recovering);
    }

    #[test]
    fn test_placeholders_are_seeded() {
        let extractor = FeatureExtractor::default();
        let scores = [14.0, 9.0, 17.5];
        let a = extractor.extract("p1", 4, &scores, None, &mut StdRng::seed_from_u64(77)).unwrap();
        let b = extractor.extract("p1", 4, &scores, None, &mut StdRng::seed_from_u64(77)).unwrap();
        assert_eq!(a, b);

        assert!((0.0..=10.0).contains(&a.matchup_difficulty));
        assert!((1..=32).contains(&a.team_offensive_rank));
        assert!((0.0..=1.0).contains(&a.injury_risk));
    }

    #[test]
    fn test_invalid_scores_fail() {
        let extractor = FeatureExtractor::default();
        let mut rng = StdRng::seed_from_u64(1);
        let result = extractor.extract("p1", 1, &[10.0, f64::NAN], None, &mut rng);
        assert!(matches!(result, Err(PredictionError::Computation(_))));
    }

    #[test]
    fn test_non_finite_context_fails() {
        let extractor = FeatureExtractor::default();
        let mut rng = StdRng::seed_from_u64(1);

        let context = GameContext { injury_risk: Some(f64::NAN), ..Default::default() };
        let result = extractor.extract("p1", 1, &[10.0, 12.0], Some(&context), &mut rng);
        assert!(matches!(result, Err(PredictionError::Computation(msg)) if msg.contains("injuryRisk")));

        // Cold-start players are checked too
        let context = GameContext { altitude: Some(f64::INFINITY), ..Default::default() };
        assert!(extractor.extract("p1", 1, &[], Some(&context), &mut rng).is_err());
    }
}
