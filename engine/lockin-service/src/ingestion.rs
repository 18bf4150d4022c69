//! Input tables and the sources they are loaded from

use crate::error::{Result, ServiceError};
use chrono::NaiveDateTime;
use lockin_engine::PlayerId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PLAYERS_TABLE: &str = "players";
pub const LEAGUE_PLAYERS_TABLE: &str = "league_players";
pub const STATS_TABLE: &str = "stats";
pub const GAMES_TABLE: &str = "games";
pub const LOCKED_POINTS_TABLE: &str = "locked_points";

/// A player known to the stats provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub team_id: u32,
}

impl PlayerRecord {
    /// Upper-cased full name, the key league players are joined on
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim()).to_uppercase()
    }
}

/// A player as listed by the fantasy league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaguePlayerRecord {
    pub player_name: String,

    /// League roster holding the player, None for free agents
    #[serde(default)]
    pub roster_id: Option<u32>,

    #[serde(default)]
    pub is_starter: bool,

    /// League search rank, lower is better
    #[serde(default)]
    pub search_rank: Option<u32>,
}

/// One player's fantasy points in one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub game_id: u64,
    pub player_id: PlayerId,
    pub week_number: u32,
    pub game_date: NaiveDateTime,
    #[serde(default)]
    pub fantasy_points: Option<f64>,
}

/// A scheduled or played game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: u64,
    pub week_number: u32,
    pub game_date: NaiveDateTime,
    pub home_id: u32,
    pub guest_id: u32,
}

/// Points a fantasy team has already committed for a player this week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedPointsRecord {
    pub week_number: u32,
    pub team: String,
    pub player_id: PlayerId,
    pub player_name: String,

    /// None while the player is still open
    #[serde(default)]
    pub locked_points: Option<f64>,
}

/// Everything a weekly report is built from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekTables {
    pub players: Vec<PlayerRecord>,
    pub league_players: Vec<LeaguePlayerRecord>,
    pub stats: Vec<StatRecord>,
    pub games: Vec<GameRecord>,
    pub locked_points: Vec<LockedPointsRecord>,
}

/// Where the input tables come from
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    async fn players(&self) -> Result<Vec<PlayerRecord>>;

    async fn league_players(&self) -> Result<Vec<LeaguePlayerRecord>>;

    async fn stats(&self) -> Result<Vec<StatRecord>>;

    async fn games(&self) -> Result<Vec<GameRecord>>;

    async fn locked_points(&self) -> Result<Vec<LockedPointsRecord>>;
}

/// Load every table concurrently. Any missing or unreadable table fails the load.
pub async fn load_tables<S: DataSource + ?Sized>(source: &S) -> Result<WeekTables> {
    let (players, league_players, stats, games, locked_points) = tokio::try_join!(
        source.players(),
        source.league_players(),
        source.stats(),
        source.games(),
        source.locked_points(),
    )?;

    info!(
        "Loaded tables: {} players, {} league players, {} stats, {} games, {} locked rows",
        players.len(),
        league_players.len(),
        stats.len(),
        games.len(),
        locked_points.len()
    );

    Ok(WeekTables { players, league_players, stats, games, locked_points })
}

/// Reads `<table>.json` arrays from a directory
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    dir: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_table<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let path = self.dir.join(format!("{table}.json"));
        debug!("Reading table {} from {:?}", table, path);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ServiceError::upstream(table, format!("{}: {e}", path.display())))?;

        serde_json::from_str(&content)
            .map_err(|e| ServiceError::upstream(table, format!("{}: {e}", path.display())))
    }
}

#[async_trait::async_trait]
impl DataSource for JsonDirectorySource {
    async fn players(&self) -> Result<Vec<PlayerRecord>> {
        self.read_table(PLAYERS_TABLE).await
    }

    async fn league_players(&self) -> Result<Vec<LeaguePlayerRecord>> {
        self.read_table(LEAGUE_PLAYERS_TABLE).await
    }

    async fn stats(&self) -> Result<Vec<StatRecord>> {
        self.read_table(STATS_TABLE).await
    }

    async fn games(&self) -> Result<Vec<GameRecord>> {
        self.read_table(GAMES_TABLE).await
    }

    async fn locked_points(&self) -> Result<Vec<LockedPointsRecord>> {
        self.read_table(LOCKED_POINTS_TABLE).await
    }
}

/// Serves tables already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: WeekTables,
}

impl InMemorySource {
    pub fn new(tables: WeekTables) -> Self {
        Self { tables }
    }
}

#[async_trait::async_trait]
impl DataSource for InMemorySource {
    async fn players(&self) -> Result<Vec<PlayerRecord>> {
        Ok(self.tables.players.clone())
    }

    async fn league_players(&self) -> Result<Vec<LeaguePlayerRecord>> {
        Ok(self.tables.league_players.clone())
    }

    async fn stats(&self) -> Result<Vec<StatRecord>> {
        Ok(self.tables.stats.clone())
    }

    async fn games(&self) -> Result<Vec<GameRecord>> {
        Ok(self.tables.games.clone())
    }

    async fn locked_points(&self) -> Result<Vec<LockedPointsRecord>> {
        Ok(self.tables.locked_points.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_full_name_is_trimmed_and_upper_cased() {
        let player = PlayerRecord {
            player_id: 1,
            first_name: " Nikola".to_string(),
            last_name: "Jokic ".to_string(),
            team_id: 7,
        };
        assert_eq!(player.full_name(), "NIKOLA JOKIC");
    }

    #[test]
    fn test_nullable_columns_default() {
        let record: LeaguePlayerRecord =
            serde_json::from_str(r#"{"player_name": "Free Agent One"}"#).unwrap();
        assert_eq!(record.roster_id, None);
        assert!(!record.is_starter);

        let stat: StatRecord = serde_json::from_str(
            r#"{"game_id": 1, "player_id": 2, "week_number": 3,
                "game_date": "2024-11-05T19:30:00", "fantasy_points": null}"#,
        )
        .unwrap();
        assert_eq!(stat.fantasy_points, None);
    }

    #[tokio::test]
    async fn test_missing_table_is_upstream_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("players.json"), "[]").unwrap();

        let source = JsonDirectorySource::new(dir.path());
        assert!(source.players().await.unwrap().is_empty());

        let err = load_tables(&source).await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamDataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_table_is_upstream_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("games.json"), "{not json").unwrap();

        let source = JsonDirectorySource::new(dir.path());
        match source.games().await.unwrap_err() {
            ServiceError::UpstreamDataUnavailable { table, .. } => assert_eq!(table, "games"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_in_memory_source_round_trips_tables() {
        let tables = WeekTables {
            players: vec![PlayerRecord {
                player_id: 1,
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                team_id: 2,
            }],
            ..Default::default()
        };
        let loaded = load_tables(&InMemorySource::new(tables.clone())).await.unwrap();
        assert_eq!(loaded, tables);
    }
}
