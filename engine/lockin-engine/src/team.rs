//! Team total distributions built from a shared simulation run

use crate::error::{LockEngineError, Result};
use crate::models::{TeamReplicateTotal, TeamRoster};
use crate::simulator::SimulationRun;
use std::collections::HashSet;
use tracing::{debug, warn};

/// One team's weekly total for every replicate of a run
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDistribution {
    pub team_name: String,

    /// Real points already banked, identical in every replicate
    pub locked_points: f64,

    /// Players still to be locked
    pub players_left: usize,

    /// Totals ordered by replicate index
    pub totals: Vec<TeamReplicateTotal>,
}

impl TeamDistribution {
    /// Total values in replicate order
    pub fn values(&self) -> Vec<f64> {
        self.totals.iter().map(|t| t.total).collect()
    }

    pub fn replicate_count(&self) -> usize {
        self.totals.len()
    }
}

/// Sums banked and simulated points per replicate
pub struct TeamAggregator;

impl TeamAggregator {
    /// Build a team's total distribution.
    ///
    /// Each replicate total is the banked points plus every open player's
    /// locked score for that replicate. A player may not be both banked and
    /// open, and every open player must be part of `run`.
    pub fn reduce(run: &SimulationRun, roster: &TeamRoster) -> Result<TeamDistribution> {
        let banked: HashSet<_> = roster.locked.iter().map(|e| e.player_id).collect();
        if let Some(&player_id) = roster.open.iter().find(|id| banked.contains(id)) {
            return Err(LockEngineError::PlayerLockedAndOpen {
                team: roster.name.clone(),
                player_id,
            });
        }

        let locked_points = roster.locked_points();
        let mut totals: Vec<f64> = vec![locked_points; run.replicate_count() as usize];
        let mut empty_samples = 0usize;

        for &player_id in &roster.open {
            let player = run.player(player_id).ok_or_else(|| LockEngineError::PlayerNotSimulated {
                team: roster.name.clone(),
                player_id,
            })?;

            for sample in &player.samples {
                if sample.locked_score.is_none() {
                    empty_samples += 1;
                }
                totals[(sample.replicate_index - 1) as usize] += sample.contribution();
            }
        }

        if empty_samples > 0 {
            warn!(
                "Team {}: {} replicate samples carried no score and counted as zero",
                roster.name, empty_samples
            );
        }

        debug!(
            "Team {}: {:.1} banked points, {} simulated and {} unmodeled open players, {} replicates",
            roster.name,
            locked_points,
            roster.open.len(),
            roster.unmodeled_open,
            totals.len()
        );

        Ok(TeamDistribution {
            team_name: roster.name.clone(),
            locked_points,
            players_left: roster.players_left(),
            totals: totals
                .into_iter()
                .enumerate()
                .map(|(i, total)| TeamReplicateTotal {
                    team_name: roster.name.clone(),
                    replicate_index: i as u32 + 1,
                    total,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::models::PlayerModel;
    use crate::simulator::LockSimulator;

    fn run() -> SimulationRun {
        let config =
            SimulationConfig { replicate_count: 64, seed: Some(11), ..Default::default() };
        let players = vec![
            PlayerModel::new(1, "A", 30.0, Some(9.0), 3, None).unwrap(),
            PlayerModel::new(2, "B", 18.0, Some(4.0), 2, None).unwrap(),
        ];
        LockSimulator::new(config).unwrap().simulate(&players).unwrap()
    }

    #[test]
    fn test_banked_only_team_is_constant() {
        let roster = TeamRoster::new("Opponent").with_locked(10, "X", 33.0).with_locked(11, "Y", 7.5);
        let dist = TeamAggregator::reduce(&run(), &roster).unwrap();

        assert_eq!(dist.players_left, 0);
        assert_eq!(dist.replicate_count(), 64);
        assert!(dist.values().iter().all(|&v| v == 40.5));
    }

    #[test]
    fn test_locked_and_open_player_rejected() {
        let roster = TeamRoster::new("My Team").with_locked(1, "A", 20.0).with_open(1);
        let err = TeamAggregator::reduce(&run(), &roster).unwrap_err();
        assert_eq!(err, LockEngineError::PlayerLockedAndOpen { team: "My Team".into(), player_id: 1 });
    }

    #[test]
    fn test_unsimulated_open_player_rejected() {
        let roster = TeamRoster::new("My Team").with_open(99);
        let err = TeamAggregator::reduce(&run(), &roster).unwrap_err();
        assert!(matches!(err, LockEngineError::PlayerNotSimulated { player_id: 99, .. }));
    }

    #[test]
    fn test_unmodeled_open_players_count_as_left() {
        let roster = TeamRoster::new("Opponent").with_locked(10, "X", 12.0).with_open(1).with_unmodeled_open(2);
        let with_unmodeled = TeamAggregator::reduce(&run(), &roster).unwrap();
        let simulated_only =
            TeamAggregator::reduce(&run(), &TeamRoster::new("Opponent").with_locked(10, "X", 12.0).with_open(1))
                .unwrap();

        assert_eq!(with_unmodeled.players_left, 3);
        assert_eq!(simulated_only.players_left, 1);
        assert_eq!(with_unmodeled.values(), simulated_only.values());
    }

    #[test]
    fn test_totals_are_indexed_from_one() {
        let roster = TeamRoster::new("My Team").with_open(2);
        let dist = TeamAggregator::reduce(&run(), &roster).unwrap();
        let indices: Vec<u32> = dist.totals.iter().map(|t| t.replicate_index).collect();
        assert_eq!(indices, (1..=64).collect::<Vec<_>>());
        assert!(dist.totals.iter().all(|t| t.team_name == "My Team"));
    }
}
