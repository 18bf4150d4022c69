//! Service configuration management

use crate::error::{Result, ServiceError};
use chrono::NaiveDate;
use clap::ValueEnum;
use lockin_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Lock-in engine configuration
    pub engine: EngineConfig,

    /// Input table location
    pub data: DataConfig,

    /// League and roster settings
    pub league: LeagueConfig,

    /// Report output settings
    pub report: ReportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Input table location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the exported JSON tables
    pub dir: PathBuf,
}

/// League and roster settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    /// First day of week 1
    pub season_start: NaiveDate,

    /// League roster id of the managed team
    pub my_roster_id: u32,

    /// Team label of the managed team in the locked-points table
    pub my_team: String,

    /// Team label of this week's opponent in the locked-points table
    pub opponent_team: String,

    /// Roster label given to unrostered players
    pub free_agent_label: String,

    /// Number of free agents, by search rank, compared against the roster
    pub free_agent_pool: usize,
}

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format
    pub format: ReportFormat,

    /// Report file path (if None, the report goes to stdout)
    pub output: Option<PathBuf>,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (plain, pretty, json)
    pub format: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("./data") }
    }
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            season_start: NaiveDate::from_ymd_opt(2024, 10, 22).unwrap_or(NaiveDate::MIN),
            my_roster_id: 8,
            my_team: "My Team".to_string(),
            opponent_team: "Opponent".to_string(),
            free_agent_label: "Free Agent".to_string(),
            free_agent_pool: 25,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { format: ReportFormat::Text, output: None }
    }
}

impl Default for ReportFormat {
    fn default() -> Self {
        ReportFormat::Text
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "plain".to_string() }
    }
}

impl ServiceConfig {
    /// Load configuration: defaults or `path`, then `.env` and environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        dotenv::dotenv().ok();
        config.apply_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| ServiceError::config(format!("invalid TOML in {}: {e}", path.display())))
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.engine.apply_env()?;

        if let Ok(dir) = std::env::var("LOCKIN_DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }

        if let Ok(start) = std::env::var("LOCKIN_SEASON_START") {
            self.league.season_start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")
                .map_err(|e| ServiceError::config(format!("LOCKIN_SEASON_START: {e}")))?;
        }

        if let Ok(roster) = std::env::var("LOCKIN_MY_ROSTER_ID") {
            self.league.my_roster_id = roster
                .trim()
                .parse()
                .map_err(|_| ServiceError::config(format!("LOCKIN_MY_ROSTER_ID: invalid value '{roster}'")))?;
        }

        if let Ok(level) = std::env::var("LOCKIN_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("LOCKIN_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;

        if self.league.my_team == self.league.opponent_team {
            return Err(ServiceError::config("my_team and opponent_team must differ"));
        }

        if self.league.my_team.is_empty() || self.league.opponent_team.is_empty() {
            return Err(ServiceError::config("team labels must not be empty"));
        }

        if !matches!(self.logging.format.as_str(), "plain" | "pretty" | "json") {
            return Err(ServiceError::config(format!(
                "unknown log format '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }
}
