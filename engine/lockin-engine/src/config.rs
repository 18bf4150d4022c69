//! Configuration for the lock-in engine

use crate::error::{LockEngineError, Result};
use crate::{DEFAULT_DEGENERATE_STD_DEV, DEFAULT_LOCK_THRESHOLD, DEFAULT_REPLICATE_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Monte Carlo lock simulation parameters
    pub simulation: SimulationConfig,

    /// Point-in-time lock recommendation parameters
    pub recommendation: RecommendationConfig,
}

/// Parameters of the lock simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of replicates per player (default: 100)
    pub replicate_count: u32,

    /// A simulated game is locked when the chance of a better later game is below this
    pub lock_threshold: f64,

    /// Seed for the run; a random seed is drawn and logged when unset.
    /// TOML files can only hold seeds up to `i64::MAX`.
    pub seed: Option<u64>,

    /// What a replicate contributes when none of its games satisfied the lock rule
    pub no_lock_policy: NoLockPolicy,

    /// Standard deviations at or below this are treated as a point mass at the mean
    pub degenerate_std_dev: f64,

    /// Standard deviation used for players with too little history to estimate one
    pub fallback_std_dev: Option<f64>,

    /// Evaluate players and replicates on the rayon pool
    pub parallel: bool,
}

/// Parameters of the lock recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Recommend LOCK when the chance of a better later game is below this
    pub lock_threshold: f64,
}

/// Resolution of a replicate that exhausted its games without locking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoLockPolicy {
    /// Keep the score of the last simulated game; no games at all contributes zero
    FinalGame,
    /// Contribute zero points
    ZeroPoints,
    /// Leave the sample empty; projections skip it and team totals count it as zero
    Exclude,
    /// Abort the run with `NoLockFound`
    Fail,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            replicate_count: DEFAULT_REPLICATE_COUNT,
            lock_threshold: DEFAULT_LOCK_THRESHOLD,
            seed: None,
            no_lock_policy: NoLockPolicy::FinalGame,
            degenerate_std_dev: DEFAULT_DEGENERATE_STD_DEV,
            fallback_std_dev: None,
            parallel: true,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self { lock_threshold: DEFAULT_LOCK_THRESHOLD }
    }
}

impl Default for NoLockPolicy {
    fn default() -> Self {
        NoLockPolicy::FinalGame
    }
}

impl fmt::Display for NoLockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoLockPolicy::FinalGame => "final_game",
            NoLockPolicy::ZeroPoints => "zero_points",
            NoLockPolicy::Exclude => "exclude",
            NoLockPolicy::Fail => "fail",
        };
        write!(f, "{name}")
    }
}

impl FromStr for NoLockPolicy {
    type Err = LockEngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "final_game" => Ok(NoLockPolicy::FinalGame),
            "zero_points" | "zero" => Ok(NoLockPolicy::ZeroPoints),
            "exclude" => Ok(NoLockPolicy::Exclude),
            "fail" => Ok(NoLockPolicy::Fail),
            other => Err(LockEngineError::config(format!("unknown no-lock policy '{other}'"))),
        }
    }
}

impl SimulationConfig {
    /// Check the simulation parameters
    pub fn validate(&self) -> Result<()> {
        if self.replicate_count == 0 {
            return Err(LockEngineError::config("replicate_count must be greater than 0"));
        }

        validate_threshold("simulation.lock_threshold", self.lock_threshold)?;

        if !self.degenerate_std_dev.is_finite() || self.degenerate_std_dev < 0.0 {
            return Err(LockEngineError::config(
                "degenerate_std_dev must be a finite, non-negative number",
            ));
        }

        if let Some(fallback) = self.fallback_std_dev {
            if !fallback.is_finite() || fallback < 0.0 {
                return Err(LockEngineError::config(
                    "fallback_std_dev must be a finite, non-negative number",
                ));
            }
        }

        Ok(())
    }
}

impl RecommendationConfig {
    /// Check the recommendation parameters
    pub fn validate(&self) -> Result<()> {
        validate_threshold("recommendation.lock_threshold", self.lock_threshold)
    }
}

impl EngineConfig {
    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.recommendation.validate()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LockEngineError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| LockEngineError::config(format!("invalid TOML in {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LockEngineError::config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            LockEngineError::config(format!("failed to write {}: {e}", path.as_ref().display()))
        })?;
        Ok(())
    }

    /// Load defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `LOCKIN_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(replicates) = std::env::var("LOCKIN_REPLICATES") {
            self.simulation.replicate_count = parse_env("LOCKIN_REPLICATES", &replicates)?;
        }

        if let Ok(threshold) = std::env::var("LOCKIN_SIM_THRESHOLD") {
            self.simulation.lock_threshold = parse_env("LOCKIN_SIM_THRESHOLD", &threshold)?;
        }

        if let Ok(threshold) = std::env::var("LOCKIN_REC_THRESHOLD") {
            self.recommendation.lock_threshold = parse_env("LOCKIN_REC_THRESHOLD", &threshold)?;
        }

        if let Ok(seed) = std::env::var("LOCKIN_SEED") {
            self.simulation.seed = Some(parse_env("LOCKIN_SEED", &seed)?);
        }

        if let Ok(policy) = std::env::var("LOCKIN_NO_LOCK_POLICY") {
            self.simulation.no_lock_policy = policy.parse()?;
        }

        if let Ok(fallback) = std::env::var("LOCKIN_FALLBACK_STD_DEV") {
            self.simulation.fallback_std_dev = Some(parse_env("LOCKIN_FALLBACK_STD_DEV", &fallback)?);
        }

        self.validate()
    }
}

fn validate_threshold(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(LockEngineError::config(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LockEngineError::config(format!("{name} has an invalid value '{value}'")))
}
