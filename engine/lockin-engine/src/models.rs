//! Data types shared by the simulator, the reducers and the recommender

use crate::error::{LockEngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream player identifier
pub type PlayerId = u32;

/// Scoring model of one player for the period being simulated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerModel {
    pub player_id: PlayerId,
    pub name: String,

    /// Historical mean fantasy points per game
    pub mean: f64,

    /// Historical standard deviation of fantasy points per game
    pub std_dev: f64,

    /// Games left to play in the period
    pub games_remaining: u32,

    /// Which roster the player belongs to (e.g. "My Team", "Free Agent")
    pub roster_label: String,

    pub starter_flag: bool,
}

impl PlayerModel {
    /// Build a validated player model.
    ///
    /// `std_dev` is `None` when the upstream history was too short to estimate
    /// one; `fallback_std_dev` is used in that case, and construction fails
    /// without it.
    pub fn new(
        player_id: PlayerId,
        name: impl Into<String>,
        mean: f64,
        std_dev: Option<f64>,
        games_remaining: u32,
        fallback_std_dev: Option<f64>,
    ) -> Result<Self> {
        let std_dev = match std_dev.filter(|sd| !sd.is_nan()).or(fallback_std_dev) {
            Some(sd) => sd,
            None => {
                return Err(LockEngineError::invalid_parameters(
                    player_id,
                    "standard deviation is undefined and no fallback is configured",
                ))
            }
        };

        let model = Self {
            player_id,
            name: name.into(),
            mean,
            std_dev,
            games_remaining,
            roster_label: String::new(),
            starter_flag: false,
        };
        model.validate()?;
        Ok(model)
    }

    /// Attach roster membership
    pub fn with_roster(mut self, roster_label: impl Into<String>, starter_flag: bool) -> Self {
        self.roster_label = roster_label.into();
        self.starter_flag = starter_flag;
        self
    }

    /// Same player with a different number of games left
    pub fn with_games_remaining(&self, games_remaining: u32) -> Self {
        Self { games_remaining, ..self.clone() }
    }

    /// Check the distribution parameters
    pub fn validate(&self) -> Result<()> {
        if !self.mean.is_finite() {
            return Err(LockEngineError::invalid_parameters(
                self.player_id,
                format!("mean must be finite, got {}", self.mean),
            ));
        }
        if !self.std_dev.is_finite() || self.std_dev < 0.0 {
            return Err(LockEngineError::invalid_parameters(
                self.player_id,
                format!("standard deviation must be finite and non-negative, got {}", self.std_dev),
            ));
        }
        Ok(())
    }
}

/// How a replicate's locked score was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockResolution {
    /// A game satisfied the lock rule
    Locked,
    /// No game locked; the last simulated game's score was kept
    FinalGame,
    /// No game locked; zero points were assigned
    ZeroPoints,
    /// No game locked; the replicate carries no score
    Excluded,
}

/// One Monte Carlo replicate of a player's week under the lock policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateSample {
    pub player_id: PlayerId,

    /// 1-based replicate index, aligned across every player of a run
    pub replicate_index: u32,

    pub locked_score: Option<f64>,

    /// 1-based game index the score was locked on
    pub game_index_locked: Option<u32>,

    pub resolution: LockResolution,
}

impl ReplicateSample {
    /// Points this replicate adds to a team total
    pub fn contribution(&self) -> f64 {
        self.locked_score.unwrap_or(0.0)
    }

    /// True when the lock rule fired rather than a fallback
    pub fn is_locked(&self) -> bool {
        self.resolution == LockResolution::Locked
    }
}

/// One team's total for one replicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamReplicateTotal {
    pub team_name: String,
    pub replicate_index: u32,
    pub total: f64,
}

/// Points already banked by a player this week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub points: f64,
}

/// A team's players for the week, split by whether their score is final
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub name: String,
    pub locked: Vec<LockedEntry>,
    pub open: Vec<PlayerId>,

    /// Open players with no usable model; they still count as players left
    #[serde(default)]
    pub unmodeled_open: usize,
}

impl TeamRoster {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_locked(mut self, player_id: PlayerId, name: impl Into<String>, points: f64) -> Self {
        self.locked.push(LockedEntry { player_id, name: name.into(), points });
        self
    }

    pub fn with_open(mut self, player_id: PlayerId) -> Self {
        self.open.push(player_id);
        self
    }

    pub fn with_unmodeled_open(mut self, count: usize) -> Self {
        self.unmodeled_open += count;
        self
    }

    /// Sum of points already banked
    pub fn locked_points(&self) -> f64 {
        self.locked.iter().map(|entry| entry.points).sum()
    }

    /// Every open player, simulated or not
    pub fn players_left(&self) -> usize {
        self.open.len() + self.unmodeled_open
    }
}

/// Distribution summary of one team's weekly total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team: String,
    pub mean_total: f64,
    pub pct05: f64,
    pub pct95: f64,
    pub locked_points: f64,
    pub players_left: usize,
}

/// Head-to-head comparison of two teams' paired replicate totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupResult {
    pub team_a: TeamSummary,
    pub team_b: TeamSummary,

    /// Per replicate: did team A finish strictly ahead of team B
    pub replicate_wins: Vec<bool>,

    /// Fraction of replicates won by team A
    pub win_probability: f64,
}

/// LOCK or WAIT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockDecision {
    Lock,
    Wait,
}

impl fmt::Display for LockDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockDecision::Lock => write!(f, "LOCK"),
            LockDecision::Wait => write!(f, "WAIT"),
        }
    }
}

/// Guidance for one open player based on the score already posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecommendation {
    pub player_id: PlayerId,
    pub name: String,
    pub current_score: f64,
    pub probability_better: f64,
    pub decision: LockDecision,
    pub games_left: u32,
    pub mean: f64,
    pub std_dev: f64,
}

/// Expected weekly output of a roster candidate under the lock policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedProjection {
    pub player_id: PlayerId,
    pub name: String,
    pub roster_label: String,
    pub mean: f64,
    pub std_dev: f64,
    pub games_next_period: u32,

    /// Mean locked score across replicates; `None` when no replicate produced a score
    pub adjusted_projection: Option<f64>,
}

/// Why an entry could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OmissionReason {
    /// The name could not be matched to a known player
    UnknownPlayer,
    /// No scoring history to build a model from
    NoHistory,
    /// A model could not be built from the history
    InvalidModel(String),
    /// No game has been scored yet this week
    NoScoreThisWeek,
    /// Another row for the same player was used instead
    ConflictingEntry(String),
}

impl fmt::Display for OmissionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmissionReason::UnknownPlayer => write!(f, "player not found"),
            OmissionReason::NoHistory => write!(f, "no scoring history"),
            OmissionReason::InvalidModel(reason) => write!(f, "{reason}"),
            OmissionReason::NoScoreThisWeek => write!(f, "no game scored this week"),
            OmissionReason::ConflictingEntry(reason) => write!(f, "{reason}"),
        }
    }
}

/// An entry that was left out of a result, reported as "not available"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Omission {
    pub player_id: Option<PlayerId>,
    pub name: String,
    pub context: String,
    pub reason: OmissionReason,
}

impl Omission {
    pub fn new(
        player_id: Option<PlayerId>,
        name: impl Into<String>,
        context: impl Into<String>,
        reason: OmissionReason,
    ) -> Self {
        Self { player_id, name: name.into(), context: context.into(), reason }
    }
}

impl fmt::Display for Omission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): not available - {}", self.name, self.context, self.reason)
    }
}
