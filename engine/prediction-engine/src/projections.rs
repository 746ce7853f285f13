//! Position-specific stat lines derived from the ensemble scalar

use crate::types::PredictionRange;
use std::collections::BTreeMap;

/// Stat name, ratio to fantasy points, relative volatility
type StatRatio = (&'static str, f64, f64);

const PASSER: &[StatRatio] = &[
    ("passingYards", 14.0, 0.25),
    ("passingTDs", 0.12, 0.45),
    ("interceptions", 0.04, 0.8),
    ("rushingYards", 1.5, 0.6),
    ("rushingTDs", 0.02, 0.8),
];

const RUSHER: &[StatRatio] = &[
    ("rushingYards", 5.5, 0.35),
    ("rushingTDs", 0.08, 0.6),
    ("receptions", 0.25, 0.4),
    ("receivingYards", 2.0, 0.5),
];

const RECEIVER: &[StatRatio] = &[
    ("receptions", 0.4, 0.35),
    ("receivingYards", 6.0, 0.35),
    ("receivingTDs", 0.06, 0.6),
    ("targets", 0.6, 0.3),
];

const TIGHT_END: &[StatRatio] = &[
    ("receptions", 0.4, 0.4),
    ("receivingYards", 5.5, 0.4),
    ("receivingTDs", 0.06, 0.7),
];

/// Flex-style role splitting work between rushing and receiving
const BLENDED: &[StatRatio] = &[
    ("rushingYards", 3.0, 0.5),
    ("receivingYards", 3.0, 0.5),
    ("receptions", 0.25, 0.45),
    ("totalTDs", 0.07, 0.7),
];

/// Production role inferred from a position tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Passer,
    Rusher,
    Receiver,
    TightEnd,
    Blended,
}

impl Role {
    /// Map a position tag to a role; `None` for positions without stat lines
    pub fn from_position(position: &str) -> Option<Role> {
        match position.trim().to_ascii_uppercase().as_str() {
            "QB" => Some(Role::Passer),
            "RB" | "FB" => Some(Role::Rusher),
            "WR" => Some(Role::Receiver),
            "TE" => Some(Role::TightEnd),
            "FLEX" => Some(Role::Blended),
            _ => None,
        }
    }

    fn ratios(&self) -> &'static [StatRatio] {
        match self {
            Role::Passer => PASSER,
            Role::Rusher => RUSHER,
            Role::Receiver => RECEIVER,
            Role::TightEnd => TIGHT_END,
            Role::Blended => BLENDED,
        }
    }

    pub fn is_rushing_role(&self) -> bool {
        matches!(self, Role::Rusher | Role::Blended)
    }

    pub fn is_passing_game_role(&self) -> bool {
        matches!(self, Role::Passer | Role::Receiver | Role::TightEnd)
    }
}

/// Project named stat ranges for a position
///
/// Unknown positions yield an empty map. Negative scalars are treated as zero.
pub fn project_stats(position: &str, fantasy_points: f64, confidence: f64) -> BTreeMap<String, PredictionRange> {
    let Some(role) = Role::from_position(position) else {
        return BTreeMap::new();
    };

    let points = fantasy_points.max(0.0);
    role.ratios()
        .iter()
        .map(|(name, ratio, volatility)| {
            let expected = points * ratio;
            let range = PredictionRange::new(
                expected,
                (expected * (1.0 - volatility)).max(0.0),
                expected * (1.0 + volatility),
                (confidence * (1.0 - volatility * 0.5)).clamp(0.0, 1.0),
            );
            (name.to_string(), range)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarterback_stats() {
        let stats = project_stats("QB", 20.0, 0.8);
        assert_eq!(stats.len(), 5);

        let yards = stats["passingYards"];
        assert!((yards.expected - 280.0).abs() < 1e-9);
        assert!((yards.low - 210.0).abs() < 1e-9);
        assert!((yards.high - 350.0).abs() < 1e-9);
        assert!((yards.confidence - 0.7).abs() < 1e-9);

        assert!((stats["passingTDs"].expected - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_receiver_and_rusher_stats() {
        let wr = project_stats("wr", 15.0, 0.7);
        assert!(wr.contains_key("receptions"));
        assert!(wr.contains_key("targets"));
        assert!(!wr.contains_key("passingYards"));

        let rb = project_stats("RB", 15.0, 0.7);
        assert!((rb["rushingYards"].expected - 82.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_position_is_empty() {
        assert!(project_stats("K", 9.0, 0.8).is_empty());
        assert!(project_stats("", 9.0, 0.8).is_empty());
    }

    #[test]
    fn test_stats_never_negative() {
        for position in ["QB", "RB", "WR", "TE", "FLEX"] {
            for points in [-5.0, 0.0, 0.4, 31.0] {
                for range in project_stats(position, points, 0.7).values() {
                    assert!(range.low >= 0.0 && range.expected >= 0.0 && range.high >= 0.0);
                    assert!(range.contains_expected());
                }
            }
        }
    }

    #[test]
    fn test_roles() {
        assert_eq!(Role::from_position(" te "), Some(Role::TightEnd));
        assert!(Role::Rusher.is_rushing_role());
        assert!(Role::Receiver.is_passing_game_role());
        assert!(!Role::Blended.is_passing_game_role());
    }
}
