//! Joins league listings to player history and builds player models

use crate::ingestion::WeekTables;
use lockin_engine::{Omission, OmissionReason, PlayerId, PlayerModel};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A player's scoring history and league status
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub name: String,
    pub team_id: u32,

    /// Non-null scores observed
    pub games_played: usize,

    /// None without history
    pub mean: Option<f64>,

    /// Sample standard deviation, None with fewer than two scores
    pub std_dev: Option<f64>,

    pub roster_id: Option<u32>,
    pub is_starter: bool,
    pub search_rank: Option<u32>,

    /// Listed by the fantasy league
    pub listed: bool,
}

impl PlayerProfile {
    /// Build an engine model for `games_remaining` games.
    ///
    /// Players without history, or whose history does not give a usable
    /// distribution, come back as an omission for `context`.
    pub fn to_model(
        &self,
        games_remaining: u32,
        roster_label: &str,
        fallback_std_dev: Option<f64>,
        context: &str,
    ) -> std::result::Result<PlayerModel, Omission> {
        let mean = self.mean.ok_or_else(|| {
            Omission::new(Some(self.player_id), self.name.clone(), context, OmissionReason::NoHistory)
        })?;

        PlayerModel::new(
            self.player_id,
            self.name.clone(),
            mean,
            self.std_dev,
            games_remaining,
            fallback_std_dev,
        )
        .map(|model| model.with_roster(roster_label, self.is_starter))
        .map_err(|e| {
            Omission::new(
                Some(self.player_id),
                self.name.clone(),
                context,
                OmissionReason::InvalidModel(e.to_string()),
            )
        })
    }
}

/// Every known player, keyed by id
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    profiles: HashMap<PlayerId, PlayerProfile>,
}

impl PlayerDirectory {
    /// Join the league listing to the player and stat tables.
    ///
    /// League names are matched on the upper-cased full name. Names that match
    /// nobody are returned as omissions.
    pub fn build(tables: &WeekTables) -> (Self, Vec<Omission>) {
        let mut scores: HashMap<PlayerId, Vec<f64>> = HashMap::new();
        for stat in &tables.stats {
            if let Some(points) = stat.fantasy_points.filter(|p| p.is_finite()) {
                scores.entry(stat.player_id).or_default().push(points);
            }
        }

        let mut profiles = HashMap::with_capacity(tables.players.len());
        let mut by_name: HashMap<String, PlayerId> = HashMap::with_capacity(tables.players.len());

        for player in &tables.players {
            let history = scores.remove(&player.player_id).unwrap_or_default();
            let (mean, std_dev) = summarize(&history);

            let key = player.full_name();
            match by_name.get(&key) {
                Some(existing) => {
                    warn!("Players {} and {} share the name {}", existing, player.player_id, key)
                }
                None => {
                    by_name.insert(key, player.player_id);
                }
            }

            profiles.insert(
                player.player_id,
                PlayerProfile {
                    player_id: player.player_id,
                    name: format!("{} {}", player.first_name.trim(), player.last_name.trim()),
                    team_id: player.team_id,
                    games_played: history.len(),
                    mean,
                    std_dev,
                    roster_id: None,
                    is_starter: false,
                    search_rank: None,
                    listed: false,
                },
            );
        }

        let mut omissions = Vec::new();
        for listing in &tables.league_players {
            let key = listing.player_name.trim().to_uppercase();
            match by_name.get(&key).and_then(|id| profiles.get_mut(id)) {
                Some(profile) => {
                    profile.name = listing.player_name.trim().to_string();
                    profile.roster_id = listing.roster_id;
                    profile.is_starter = listing.is_starter;
                    profile.search_rank = listing.search_rank;
                    profile.listed = true;
                }
                None => {
                    debug!("League player {} has no match", listing.player_name);
                    omissions.push(Omission::new(
                        None,
                        listing.player_name.clone(),
                        "league roster",
                        OmissionReason::UnknownPlayer,
                    ));
                }
            }
        }

        (Self { profiles }, omissions)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&PlayerProfile> {
        self.profiles.get(&player_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Players on a league roster, by id
    pub fn on_roster(&self, roster_id: u32) -> Vec<&PlayerProfile> {
        let mut players: Vec<_> =
            self.profiles.values().filter(|p| p.roster_id == Some(roster_id)).collect();
        players.sort_by_key(|p| p.player_id);
        players
    }

    /// The best `limit` unrostered league players by search rank
    pub fn free_agents(&self, limit: usize) -> Vec<&PlayerProfile> {
        let mut players: Vec<_> =
            self.profiles.values().filter(|p| p.listed && p.roster_id.is_none()).collect();
        players.sort_by_key(|p| (p.search_rank.unwrap_or(u32::MAX), p.player_id));
        players.truncate(limit);
        players
    }
}

/// Mean and sample standard deviation of a score history
fn summarize(history: &[f64]) -> (Option<f64>, Option<f64>) {
    match history.len() {
        0 => (None, None),
        1 => (Some(history[0]), None),
        _ => (Some(history.mean()), Some(history.std_dev())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::{LeaguePlayerRecord, PlayerRecord, StatRecord};
    use chrono::NaiveDate;

    fn player(player_id: PlayerId, first: &str, last: &str) -> PlayerRecord {
        PlayerRecord { player_id, first_name: first.to_string(), last_name: last.to_string(), team_id: 1 }
    }

    fn listing(name: &str, roster_id: Option<u32>, rank: u32) -> LeaguePlayerRecord {
        LeaguePlayerRecord {
            player_name: name.to_string(),
            roster_id,
            is_starter: roster_id.is_some(),
            search_rank: Some(rank),
        }
    }

    fn stat(player_id: PlayerId, day: u32, points: Option<f64>) -> StatRecord {
        StatRecord {
            game_id: day as u64,
            player_id,
            week_number: 1,
            game_date: NaiveDate::from_ymd_opt(2024, 10, day).unwrap().and_hms_opt(19, 0, 0).unwrap(),
            fantasy_points: points,
        }
    }

    fn tables() -> WeekTables {
        WeekTables {
            players: vec![player(1, "Ann", "Able"), player(2, "Bob", "Baker"), player(3, "Cy", "Cole")],
            league_players: vec![
                listing("ann able", Some(8), 5),
                listing("Bob Baker", None, 2),
                listing("Cy Cole", None, 1),
                listing("Nobody Known", None, 3),
            ],
            stats: vec![
                stat(1, 22, Some(20.0)),
                stat(1, 23, Some(30.0)),
                stat(1, 24, None),
                stat(1, 25, Some(40.0)),
                stat(2, 22, Some(12.0)),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_join_by_upper_cased_name() {
        let (directory, omissions) = PlayerDirectory::build(&tables());

        assert_eq!(directory.len(), 3);
        let ann = directory.get(1).unwrap();
        assert_eq!(ann.roster_id, Some(8));
        assert_eq!(ann.games_played, 3);
        assert_eq!(ann.mean, Some(30.0));
        assert!((ann.std_dev.unwrap() - 10.0).abs() < 1e-12);

        assert_eq!(omissions.len(), 1);
        assert_eq!(omissions[0].name, "Nobody Known");
        assert_eq!(omissions[0].reason, OmissionReason::UnknownPlayer);
    }

    #[test]
    fn test_short_history_has_no_std_dev() {
        let (directory, _) = PlayerDirectory::build(&tables());
        assert_eq!(directory.get(2).unwrap().mean, Some(12.0));
        assert_eq!(directory.get(2).unwrap().std_dev, None);
        assert_eq!(directory.get(3).unwrap().mean, None);
    }

    #[test]
    fn test_roster_and_free_agents() {
        let (directory, _) = PlayerDirectory::build(&tables());

        let mine: Vec<_> = directory.on_roster(8).iter().map(|p| p.player_id).collect();
        assert_eq!(mine, vec![1]);

        let agents: Vec<_> = directory.free_agents(25).iter().map(|p| p.player_id).collect();
        assert_eq!(agents, vec![3, 2]);
        assert_eq!(directory.free_agents(1).len(), 1);
    }

    #[test]
    fn test_to_model_omissions() {
        let (directory, _) = PlayerDirectory::build(&tables());

        let model = directory.get(1).unwrap().to_model(3, "My Team", None, "matchup").unwrap();
        assert_eq!(model.games_remaining, 3);
        assert_eq!(model.roster_label, "My Team");
        assert!(model.starter_flag);

        let err = directory.get(3).unwrap().to_model(3, "Free Agent", None, "adds").unwrap_err();
        assert_eq!(err.reason, OmissionReason::NoHistory);

        let err = directory.get(2).unwrap().to_model(3, "Free Agent", None, "adds").unwrap_err();
        assert!(matches!(err.reason, OmissionReason::InvalidModel(_)));

        let model = directory.get(2).unwrap().to_model(3, "Free Agent", Some(5.0), "adds").unwrap();
        assert_eq!(model.std_dev, 5.0);
    }
}
