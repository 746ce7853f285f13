//! # Command Line Interface
//!
//! Subcommands print pretty JSON to stdout.

use crate::config::PredictionConfig;
use crate::engine::PredictionEngine;
use crate::history::{HistoricalStats, JsonFileHistory, NoHistory};
use crate::types::PlayerSubject;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fantasy projection CLI
#[derive(Parser)]
#[command(name = "prediction-engine")]
#[command(about = "Ensemble fantasy point projections, comparisons and rankings")]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Historical scores file: {"players": {"<id>": [scores, most recent first]}}
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict a single player
    Predict {
        /// Player given as id,name,position,team
        #[arg(value_parser = parse_subject)]
        player: PlayerSubject,
        #[arg(short, long, default_value = "1")]
        week: u32,
    },
    /// Compare two players head to head
    Compare {
        #[arg(value_parser = parse_subject)]
        player1: PlayerSubject,
        #[arg(value_parser = parse_subject)]
        player2: PlayerSubject,
        #[arg(short, long, default_value = "1")]
        week: u32,
    },
    /// Rank players by expected points
    Rank {
        /// Position filter, or ALL
        #[arg(short, long, default_value = "ALL")]
        position: String,
        #[arg(short, long, default_value = "1")]
        week: u32,
        #[arg(value_parser = parse_subject, required = true)]
        players: Vec<PlayerSubject>,
    },
    /// Show engine status
    Status,
}

/// Parse `id,name,position,team`
pub fn parse_subject(raw: &str) -> std::result::Result<PlayerSubject, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [id, name, position, team] if !id.is_empty() && !position.is_empty() => {
            Ok(PlayerSubject::new(*id, *name, position.to_uppercase(), *team))
        }
        _ => Err(format!("expected id,name,position,team but got '{raw}'")),
    }
}

/// CLI handler
pub struct CliHandler {
    engine: PredictionEngine,
}

impl CliHandler {
    pub async fn new(config_path: Option<&Path>, history_path: Option<&Path>) -> Result<Self> {
        let config = PredictionConfig::load(config_path).context("failed to load configuration")?;

        let history: Arc<dyn HistoricalStats> = match history_path {
            Some(path) => Arc::new(
                JsonFileHistory::load(path)
                    .await
                    .with_context(|| format!("failed to load history from {}", path.display()))?,
            ),
            None => Arc::new(NoHistory),
        };

        Ok(Self { engine: PredictionEngine::new(config, history)? })
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Predict { player, week } => {
                let prediction = self.engine.predict(&player, week).await;
                print_json(&prediction)?;
            }
            Commands::Compare { player1, player2, week } => {
                let comparison = self.engine.compare(&player1, &player2, week).await;
                print_json(&comparison)?;
            }
            Commands::Rank { position, week, players } => {
                let ranked = self.engine.rank(&position, week, &players).await;
                print_json(&ranked)?;
            }
            Commands::Status => {
                print_json(&self.engine.status())?;
            }
        }
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
