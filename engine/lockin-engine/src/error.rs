//! Error types for the lock-in engine

use crate::models::PlayerId;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, LockEngineError>;

/// Errors raised by the numeric core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LockEngineError {
    #[error("Invalid distribution parameters for player {player_id}: {reason}")]
    InvalidDistributionParameters { player_id: PlayerId, reason: String },

    #[error("Player {player_id} found no game to lock in replicate {replicate_index}")]
    NoLockFound { player_id: PlayerId, replicate_index: u32 },

    #[error("Player {player_id} is listed as both locked and open for team {team}")]
    PlayerLockedAndOpen { team: String, player_id: PlayerId },

    #[error("Player {player_id} on team {team} was not part of the simulation run")]
    PlayerNotSimulated { team: String, player_id: PlayerId },

    #[error("Player {0} appears more than once in the simulation input")]
    DuplicatePlayer(PlayerId),

    #[error("Replicate counts differ: {left} vs {right}")]
    ReplicateMismatch { left: usize, right: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LockEngineError {
    /// Create a new invalid-parameters error
    pub fn invalid_parameters(player_id: PlayerId, reason: impl Into<String>) -> Self {
        Self::InvalidDistributionParameters { player_id, reason: reason.into() }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
