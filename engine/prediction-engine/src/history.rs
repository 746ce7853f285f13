//! Read-only access to historical per-week fantasy scores

use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Historical statistics lookup consumed by the feature extractor
#[async_trait]
pub trait HistoricalStats: Send + Sync {
    /// Recent fantasy scores, most recent first; empty when the player is unknown
    async fn recent_stats(&self, player_id: &str) -> Result<Vec<f64>>;
}

/// In-memory history store
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    scores: DashMap<String, Vec<f64>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: HashMap<String, Vec<f64>>) -> Self {
        Self { scores: map.into_iter().collect() }
    }

    /// Set a player's recent scores (most recent first)
    pub fn insert(&self, player_id: impl Into<String>, scores: Vec<f64>) {
        self.scores.insert(player_id.into(), scores);
    }

    /// Prepend the newest weekly score
    pub fn record_score(&self, player_id: &str, score: f64) {
        self.scores.entry(player_id.to_string()).or_default().insert(0, score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[async_trait]
impl HistoricalStats for InMemoryHistory {
    async fn recent_stats(&self, player_id: &str) -> Result<Vec<f64>> {
        Ok(self.scores.get(player_id).map(|s| s.clone()).unwrap_or_default())
    }
}

/// On-disk layout: `{ "players": { "<player_id>": [scores, most recent first] } }`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryFile {
    pub players: HashMap<String, Vec<f64>>,
}

/// History loaded once from a JSON file
#[derive(Debug)]
pub struct JsonFileHistory {
    inner: InMemoryHistory,
}

impl JsonFileHistory {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading historical stats from: {:?}", path.as_ref());

        let content = tokio::fs::read_to_string(&path).await?;
        let file: HistoryFile = serde_json::from_str(&content)?;

        info!("Loaded history for {} players", file.players.len());
        Ok(Self { inner: InMemoryHistory::from_map(file.players) })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl HistoricalStats for JsonFileHistory {
    async fn recent_stats(&self, player_id: &str) -> Result<Vec<f64>> {
        self.inner.recent_stats(player_id).await
    }
}

/// History source with no data; every player is a cold start
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

#[async_trait]
impl HistoricalStats for NoHistory {
    async fn recent_stats(&self, _player_id: &str) -> Result<Vec<f64>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictionError;
    use std::io::Write;

    #[tokio::test]
    async fn test_in_memory_history() {
        let history = InMemoryHistory::new();
        history.insert("p1", vec![12.0, 9.5]);
        history.record_score("p1", 20.0);

        assert_eq!(history.recent_stats("p1").await.unwrap(), vec![20.0, 12.0, 9.5]);
        assert!(history.recent_stats("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_file_history() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"players": {{"p1": [18.4, 12.1, 23.7], "p2": []}}}}"#).unwrap();

        let history = JsonFileHistory::load(file.path()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.recent_stats("p1").await.unwrap(), vec![18.4, 12.1, 23.7]);
        assert!(history.recent_stats("p3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_file_history_missing_file() {
        let result = JsonFileHistory::load("/nonexistent/history.json").await;
        assert!(matches!(result, Err(PredictionError::Io(_))));
    }
}
