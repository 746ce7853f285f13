//! Prediction Engine
//!
//! Produces per-player weekly fantasy projections from recent scoring history.
//! Four models (linear regression, random forest, gradient boosting and a small
//! feed-forward network) run concurrently and are blended into a weighted
//! consensus, then decorated with a floor/ceiling band, position stat lines and
//! a rule-based narrative. On top of single predictions the engine offers
//! batch prediction, head-to-head comparison and ranking.

pub mod cache;
pub mod cli;
pub mod comparison;
pub mod config;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod history;
pub mod models;
pub mod narrative;
pub mod projections;
pub mod types;
pub mod volatility;

pub use cache::{CacheKey, PredictionCache};
pub use config::PredictionConfig;
pub use engine::PredictionEngine;
pub use error::{PredictionError, Result};
pub use history::{HistoricalStats, InMemoryHistory, JsonFileHistory, NoHistory};
pub use models::{ForecastModel, ModelSuite};
pub use types::*;
