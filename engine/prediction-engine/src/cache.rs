//! Short-lived prediction cache keyed by (player, week)
//!
//! Concurrent requests for the same key may both compute and both write; the
//! last write wins. Recomputation is idempotent, so entries are not locked per key.

use crate::types::PlayerPrediction;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub player_id: String,
    pub week: u32,
}

impl CacheKey {
    pub fn new(player_id: impl Into<String>, week: u32) -> Self {
        Self { player_id: player_id.into(), week }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    prediction: Arc<PlayerPrediction>,
    /// `None` when the TTL runs past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Keyed store with a fixed TTL, safe to share across tasks
#[derive(Debug)]
pub struct PredictionCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl PredictionCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    /// Fetch a live entry; expired entries are evicted on read
    pub fn get(&self, key: &CacheKey) -> Option<Arc<PlayerPrediction>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(Arc::clone(&entry.prediction));
            }
        }
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    /// Insert or replace, resetting the expiry
    pub fn insert(&self, key: CacheKey, prediction: Arc<PlayerPrediction>) {
        let entry = CacheEntry { prediction, expires_at: Instant::now().checked_add(self.ttl) };
        self.entries.insert(key, entry);
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
