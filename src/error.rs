//! Error types
//!
//! Configuration errors are fatal at startup. Leaderboard and audio errors are
//! recovered locally and never reach the simulation.

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::Tier;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid difficulty profile for {tier:?}: {reason}")]
    InvalidProfile { tier: Tier, reason: &'static str },
    #[error("score_per_tier must be greater than zero")]
    InvalidScorePerTier,
    #[error("tier thresholds must be positive and strictly ascending, got {thresholds:?}")]
    NonMonotonicThresholds { thresholds: [u32; 2] },
    #[error("invalid {field}: {reason}")]
    InvalidRange {
        field: &'static str,
        reason: &'static str,
    },
    #[error("{field} must be a probability in [0, 1], got {value}")]
    InvalidChance { field: &'static str, value: f32 },
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("leaderboard data is corrupt: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("player name is empty")]
    EmptyName,
    #[error("no finished run to submit")]
    NoFinalScore,
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
    #[error("leaderboard worker has shut down")]
    WorkerGone,
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio backend unavailable: {0}")]
    BackendUnavailable(String),
}
