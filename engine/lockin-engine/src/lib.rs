//! # Lock-in Engine
//!
//! Weekly lock-in decision and matchup simulation for fantasy rosters.
//!
//! Every player's remaining games are replayed as Monte Carlo replicates. Each
//! replicate walks the player's games in order and stops at the first game whose
//! score makes a better later game unlikely, which is the score a manager would
//! lock in. The resulting samples feed two reducers: a per-player adjusted
//! projection and a per-team total distribution used to price matchups. A
//! separate recommender applies the same probability model to the scores that
//! have actually been posted this week.

pub mod config;
pub mod error;
pub mod matchup;
pub mod models;
pub mod probability;
pub mod projection;
pub mod recommender;
pub mod simulator;
pub mod team;


pub use config::{EngineConfig, NoLockPolicy, RecommendationConfig, SimulationConfig};
pub use error::{LockEngineError, Result};
pub use matchup::{percentile, MatchupEvaluator};
pub use models::*;
pub use probability::{probability_of_better_outcome, ProbabilityModel};
pub use projection::ProjectionAggregator;
pub use recommender::{LockRecommender, OpenPlayerObservation, RecommendationSet};
pub use simulator::{LockSimulator, PlayerSamples, SimulationRun};
pub use team::{TeamAggregator, TeamDistribution};

/// Current version of the lock-in engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of Monte Carlo replicates per player
pub const DEFAULT_REPLICATE_COUNT: u32 = 100;

/// Default lock cutoff: lock when the chance of a better later game drops below this
pub const DEFAULT_LOCK_THRESHOLD: f64 = 0.5;

/// Standard deviations at or below this are treated as a point mass at the mean
pub const DEFAULT_DEGENERATE_STD_DEV: f64 = 0.1;
