//! Head-to-head comparison and ranking of finished predictions

use crate::config::ComparisonParameters;
use crate::types::{ComparisonAdvantages, PlayerComparison, PlayerPrediction, Recommendation};
use std::cmp::Ordering;

/// Volatility gap that is worth mentioning in the risk text
const VOLATILITY_GAP: f64 = 0.1;

/// Compare two predictions
///
/// A toss-up requires both `|point gap| < toss_up_points` and
/// `|confidence gap| < toss_up_confidence`; otherwise the higher expectation
/// wins, with confidence breaking an exact tie.
pub fn compare_predictions(
    player1: PlayerPrediction,
    player2: PlayerPrediction,
    params: &ComparisonParameters,
) -> PlayerComparison {
    let point_difference = player1.fantasy_points.expected - player2.fantasy_points.expected;
    let confidence_difference = player1.confidence - player2.confidence;

    let recommendation = if point_difference.abs() < params.toss_up_points
        && confidence_difference.abs() < params.toss_up_confidence
    {
        Recommendation::TossUp
    } else if point_difference > 0.0 || (point_difference == 0.0 && confidence_difference > 0.0) {
        Recommendation::Player1
    } else {
        Recommendation::Player2
    };

    let advantages = ComparisonAdvantages {
        player1: advantages_of(&player1, &player2),
        player2: advantages_of(&player2, &player1),
    };
    let risk_comparison = risk_comparison(&player1, &player2);
    let reasoning = reasoning(&player1, &player2, recommendation, point_difference);

    PlayerComparison {
        player1,
        player2,
        recommendation,
        point_difference,
        confidence_difference,
        advantages,
        risk_comparison,
        reasoning,
    }
}

fn advantages_of(this: &PlayerPrediction, other: &PlayerPrediction) -> Vec<String> {
    let mut advantages = Vec::new();
    let gap = this.fantasy_points.expected - other.fantasy_points.expected;
    if gap > 0.0 {
        advantages.push(format!("Higher projection (+{gap:.1} pts)"));
    }
    if this.ceiling > other.ceiling {
        advantages.push("Higher ceiling".to_string());
    }
    if this.floor > other.floor {
        advantages.push("Safer floor".to_string());
    }
    if this.confidence > other.confidence {
        advantages.push("More confident projection".to_string());
    }
    if this.volatility < other.volatility {
        advantages.push("More consistent".to_string());
    }
    advantages
}

fn risk_comparison(p1: &PlayerPrediction, p2: &PlayerPrediction) -> String {
    let gap = p1.volatility - p2.volatility;
    if gap.abs() < VOLATILITY_GAP {
        return format!(
            "{} and {} carry similar risk ({:.2}x vs {:.2}x volatility)",
            p1.player_name, p2.player_name, p1.volatility, p2.volatility
        );
    }

    let (riskier, safer) = if gap > 0.0 { (p1, p2) } else { (p2, p1) };
    format!(
        "{} is the riskier play ({:.2}x vs {:.2}x volatility, {} risk factors vs {})",
        riskier.player_name,
        riskier.volatility,
        safer.volatility,
        riskier.risk_factors.len(),
        safer.risk_factors.len()
    )
}

fn reasoning(
    p1: &PlayerPrediction,
    p2: &PlayerPrediction,
    recommendation: Recommendation,
    point_difference: f64,
) -> String {
    let margin = point_difference.abs();
    match recommendation {
        Recommendation::TossUp => format!(
            "Toss-up: {} and {} are separated by {:.1} points with similar confidence",
            p1.player_name, p2.player_name, margin
        ),
        Recommendation::Player1 => format!(
            "{} is projected to outscore {} by {:.1} points",
            p1.player_name, p2.player_name, margin
        ),
        Recommendation::Player2 => format!(
            "{} is projected to outscore {} by {:.1} points",
            p2.player_name, p1.player_name, margin
        ),
    }
}

/// Sort descending by expected fantasy points; ties keep input order
pub fn rank_predictions(mut predictions: Vec<PlayerPrediction>) -> Vec<PlayerPrediction> {
    predictions.sort_by(|a, b| {
        b.fantasy_points
            .expected
            .partial_cmp(&a.fantasy_points.expected)
            .unwrap_or(Ordering::Equal)
    });
    predictions
}
