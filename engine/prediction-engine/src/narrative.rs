//! Rule-based narrative: key factors, risks, upside and a reasoning sentence

use crate::projections::Role;
use crate::types::{GameScript, ModelPrediction, PlayerFeatures, TrendDirection, WeatherImpact};

const FAVORABLE_MATCHUP: f64 = 3.0;
const DIFFICULT_MATCHUP: f64 = 7.0;
const INJURY_RISK_THRESHOLD: f64 = 0.3;
const HIGH_CONFIDENCE: f64 = 0.8;
const LOW_CONFIDENCE: f64 = 0.6;
const HIGH_TARGET_SHARE: f64 = 0.25;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Narrative {
    pub key_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub upside: Vec<String>,
    pub reasoning: String,
}

/// Apply the rule list in a fixed order
pub fn narrate(
    player_name: &str,
    position: &str,
    features: &PlayerFeatures,
    ensemble: &ModelPrediction,
) -> Narrative {
    let mut n = Narrative::default();
    let role = Role::from_position(position);

    match features.trend_direction {
        TrendDirection::Improving => n.key_factors.push("Trending upward over recent games".into()),
        TrendDirection::Declining => n.risk_factors.push("Production declining over recent games".into()),
        TrendDirection::Stable => {}
    }

    if features.matchup_difficulty <= FAVORABLE_MATCHUP {
        n.key_factors.push("Favorable matchup against a weak defense".into());
    } else if features.matchup_difficulty >= DIFFICULT_MATCHUP {
        n.risk_factors.push("Difficult matchup against a strong defense".into());
    }

    if features.injury_risk > INJURY_RISK_THRESHOLD {
        n.risk_factors.push("Elevated injury risk".into());
    }

    match features.weather_impact {
        WeatherImpact::Positive => n.upside.push("Favorable weather conditions".into()),
        WeatherImpact::Negative => n.risk_factors.push("Adverse weather may limit production".into()),
        WeatherImpact::Neutral => {}
    }

    match (features.game_script, role) {
        (GameScript::Positive, Some(r)) if r.is_rushing_role() => {
            n.upside.push("Positive game script favors rushing volume".into())
        }
        (GameScript::Negative, Some(r)) if r.is_passing_game_role() => {
            n.upside.push("Negative game script could force extra passing volume".into())
        }
        (GameScript::Negative, Some(r)) if r.is_rushing_role() => {
            n.risk_factors.push("Negative game script may reduce rushing attempts".into())
        }
        _ => {}
    }

    if features.target_share > HIGH_TARGET_SHARE && role.is_some_and(|r| r != Role::Passer) {
        n.upside.push("Strong target share supports a high ceiling".into());
    }

    if ensemble.confidence > HIGH_CONFIDENCE {
        n.key_factors.push("High model consensus".into());
    } else if ensemble.confidence < LOW_CONFIDENCE {
        n.risk_factors.push("Low model agreement".into());
    }

    n.reasoning = reasoning(player_name, ensemble, &n);
    n
}

fn list_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join("; ").to_lowercase()
    }
}

fn reasoning(player_name: &str, ensemble: &ModelPrediction, n: &Narrative) -> String {
    let mut text = format!(
        "{} projects for {:.1} fantasy points with {:.0}% confidence. Key factors: {}. Risks: {}.",
        player_name,
        ensemble.prediction,
        ensemble.confidence * 100.0,
        list_or(&n.key_factors, "none identified"),
        list_or(&n.risk_factors, "none identified"),
    );
    if !n.upside.is_empty() {
        text.push_str(&format!(" Upside: {}.", list_or(&n.upside, "")));
    }
    text
}
