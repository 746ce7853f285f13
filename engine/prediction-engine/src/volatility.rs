//! Ceiling/floor bounds and volatility score

use crate::types::{PlayerFeatures, PredictionRange, WeatherImpact};

pub const MIN_VOLATILITY: f64 = 0.1;
pub const MAX_VOLATILITY: f64 = 2.0;

/// Volatility score in [0.1, 2.0]
pub fn volatility(features: &PlayerFeatures) -> f64 {
    let mut volatility = (1.0 - features.consistency_score).clamp(MIN_VOLATILITY, MAX_VOLATILITY);
    volatility *= 1.0 + features.matchup_difficulty * 0.1;
    volatility *= 1.0 + features.injury_risk * 0.5;
    if features.weather_impact == WeatherImpact::Negative {
        volatility *= 1.2;
    }
    volatility.clamp(MIN_VOLATILITY, MAX_VOLATILITY)
}

/// Ceiling and floor around an expected score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub ceiling: f64,
    pub floor: f64,
}

pub fn bounds(expected: f64, features: &PlayerFeatures) -> Bounds {
    let base_volatility = expected * 0.3;
    let consistency_multiplier = 2.0 - features.consistency_score;
    let matchup_multiplier = 1.0 + (features.matchup_difficulty - 5.0) * 0.1;
    let total_volatility = base_volatility * consistency_multiplier * matchup_multiplier;

    Bounds {
        ceiling: expected + total_volatility * 1.5,
        floor: (expected - total_volatility).max(0.0),
    }
}

/// Fantasy-points range: `low` = floor, `high` = ceiling
pub fn fantasy_points_range(expected: f64, confidence: f64, features: &PlayerFeatures) -> PredictionRange {
    let Bounds { ceiling, floor } = bounds(expected, features);
    PredictionRange::new(expected, floor, ceiling, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;

    fn features(consistency: f64, matchup: f64, injury: f64) -> PlayerFeatures {
        let mut f = FeatureExtractor::default().default_features("p1", 1);
        f.consistency_score = consistency;
        f.matchup_difficulty = matchup;
        f.injury_risk = injury;
        f
    }

    #[test]
    fn test_perfectly_consistent_player_hits_floor() {
        assert_eq!(volatility(&features(1.0, 0.0, 0.0)), 0.1);
    }

    #[test]
    fn test_volatility_inflation() {
        // 0.5 * 1.5 * 1.1 = 0.825
        let v = volatility(&features(0.5, 5.0, 0.2));
        assert!((v - 0.825).abs() < 1e-9);

        let mut wet = features(0.5, 5.0, 0.2);
        wet.weather_impact = WeatherImpact::Negative;
        assert!((volatility(&wet) - 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_volatility_caps_at_two() {
        let mut f = features(0.0, 10.0, 1.0);
        f.weather_impact = WeatherImpact::Negative;
        assert_eq!(volatility(&f), 2.0);
    }

    #[test]
    fn test_bounds_formula() {
        // base 3.0, consistency x1.5, matchup x1.2 -> 5.4
        let b = bounds(10.0, &features(0.5, 7.0, 0.0));
        assert!((b.ceiling - 18.1).abs() < 1e-9);
        assert!((b.floor - 4.6).abs() < 1e-9);
    }

    #[test]
    fn test_floor_never_negative() {
        // Widest band: 4.0 * 0.3 * 2.0 * 1.5 = 3.6
        let b = bounds(4.0, &features(0.0, 10.0, 0.0));
        assert!((b.floor - 0.4).abs() < 1e-9);
        assert!(b.floor >= 0.0);

        let range = fantasy_points_range(0.0, 0.8, &features(0.3, 2.0, 0.1));
        assert_eq!((range.low, range.expected, range.high), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_range_encloses_expected() {
        for matchup in [0.0, 2.5, 5.0, 7.5, 10.0] {
            for consistency in [0.0, 0.5, 1.0] {
                let range = fantasy_points_range(12.3, 0.7, &features(consistency, matchup, 0.0));
                assert!(range.contains_expected());
            }
        }
    }
}
