//! Week numbering and per-team game schedule

use crate::ingestion::{GameRecord, StatRecord};
use chrono::{NaiveDate, NaiveDateTime};
use lockin_engine::PlayerId;
use std::collections::HashMap;

/// Fantasy week containing `as_of`. Week 1 starts on `season_start`;
/// earlier dates count as week 1.
pub fn week_number(as_of: NaiveDate, season_start: NaiveDate) -> u32 {
    let days = (as_of - season_start).num_days();
    if days < 0 {
        1
    } else {
        (days / 7) as u32 + 1
    }
}

/// Game dates per team, home and away
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    by_team: HashMap<u32, Vec<(u32, NaiveDateTime)>>,
}

impl Schedule {
    pub fn new(games: &[GameRecord]) -> Self {
        let mut by_team: HashMap<u32, Vec<(u32, NaiveDateTime)>> = HashMap::new();
        for game in games {
            by_team.entry(game.home_id).or_default().push((game.week_number, game.game_date));
            if game.guest_id != game.home_id {
                by_team.entry(game.guest_id).or_default().push((game.week_number, game.game_date));
            }
        }
        Self { by_team }
    }

    /// Games of `team` in `week` dated strictly after `as_of`
    pub fn games_remaining(&self, team: u32, week: u32, as_of: NaiveDateTime) -> u32 {
        self.games(team).filter(|(w, date)| *w == week && *date > as_of).count() as u32
    }

    /// All games of `team` in `week`
    pub fn games_in_week(&self, team: u32, week: u32) -> u32 {
        self.games(team).filter(|(w, _)| *w == week).count() as u32
    }

    fn games(&self, team: u32) -> impl Iterator<Item = &(u32, NaiveDateTime)> {
        self.by_team.get(&team).into_iter().flatten()
    }
}

/// Latest non-null fantasy score per player in `week`
pub fn most_recent_scores(stats: &[StatRecord], week: u32) -> HashMap<PlayerId, f64> {
    let mut latest: HashMap<PlayerId, (NaiveDateTime, f64)> = HashMap::new();

    for stat in stats.iter().filter(|s| s.week_number == week) {
        let Some(points) = stat.fantasy_points else { continue };
        match latest.get(&stat.player_id) {
            Some((date, _)) if *date >= stat.game_date => {}
            _ => {
                latest.insert(stat.player_id, (stat.game_date, points));
            }
        }
    }

    latest.into_iter().map(|(id, (_, points))| (id, points)).collect()
}
