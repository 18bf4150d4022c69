//! Matchup evaluation over paired replicate totals

use crate::error::{LockEngineError, Result};
use crate::models::{MatchupResult, TeamSummary};
use crate::team::TeamDistribution;
use tracing::info;

/// Compares two teams' total distributions replicate by replicate
pub struct MatchupEvaluator;

impl MatchupEvaluator {
    /// Mean and 5th/95th percentile band of a team's totals
    pub fn summarize(distribution: &TeamDistribution) -> TeamSummary {
        let mut values = distribution.values();
        values.sort_by(f64::total_cmp);

        let mean_total = if values.is_empty() {
            distribution.locked_points
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };

        TeamSummary {
            team: distribution.team_name.clone(),
            mean_total,
            pct05: percentile(&values, 0.05).unwrap_or(mean_total),
            pct95: percentile(&values, 0.95).unwrap_or(mean_total),
            locked_points: distribution.locked_points,
            players_left: distribution.players_left,
        }
    }

    /// Chance that `team_a` finishes strictly ahead of `team_b`.
    ///
    /// Totals are compared by replicate index, never resampled, so both
    /// distributions must come from the same run.
    pub fn evaluate(team_a: &TeamDistribution, team_b: &TeamDistribution) -> Result<MatchupResult> {
        if team_a.replicate_count() != team_b.replicate_count() {
            return Err(LockEngineError::ReplicateMismatch {
                left: team_a.replicate_count(),
                right: team_b.replicate_count(),
            });
        }

        let replicate_wins: Vec<bool> =
            team_a.totals.iter().zip(&team_b.totals).map(|(a, b)| a.total > b.total).collect();

        let win_probability = if replicate_wins.is_empty() {
            0.0
        } else {
            replicate_wins.iter().filter(|&&won| won).count() as f64 / replicate_wins.len() as f64
        };

        info!(
            "{} vs {}: win probability {:.1}% over {} replicates",
            team_a.team_name,
            team_b.team_name,
            win_probability * 100.0,
            replicate_wins.len()
        );

        Ok(MatchupResult {
            team_a: Self::summarize(team_a),
            team_b: Self::summarize(team_b),
            replicate_wins,
            win_probability,
        })
    }
}

/// Percentile of sorted data, interpolating linearly between closest ranks
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeamReplicateTotal;

    fn distribution(name: &str, locked: f64, totals: &[f64]) -> TeamDistribution {
        TeamDistribution {
            team_name: name.to_string(),
            locked_points: locked,
            players_left: 1,
            totals: totals
                .iter()
                .enumerate()
                .map(|(i, &total)| TeamReplicateTotal {
                    team_name: name.to_string(),
                    replicate_index: i as u32 + 1,
                    total,
                })
                .collect(),
        }
    }

    #[test]
    fn test_percentile_interpolation() {
        let data: Vec<f64> = (1..=101).map(f64::from).collect();
        assert_eq!(percentile(&data, 0.05), Some(6.0));
        assert_eq!(percentile(&data, 0.95), Some(96.0));
        assert_eq!(percentile(&[1.0, 2.0], 0.5), Some(1.5));
        assert_eq!(percentile(&[7.0], 0.95), Some(7.0));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn test_win_probability_counts_strict_wins() {
        let a = distribution("A", 0.0, &[10.0, 20.0, 30.0, 40.0]);
        let b = distribution("B", 25.0, &[25.0, 25.0, 25.0, 40.0]);

        let result = MatchupEvaluator::evaluate(&a, &b).unwrap();
        assert_eq!(result.replicate_wins, vec![false, false, true, false]);
        assert_eq!(result.win_probability, 0.25);

        let reverse = MatchupEvaluator::evaluate(&b, &a).unwrap();
        assert_eq!(reverse.win_probability, 0.5);
    }

    #[test]
    fn test_mismatched_replicates_rejected() {
        let a = distribution("A", 0.0, &[1.0, 2.0]);
        let b = distribution("B", 0.0, &[1.0]);
        assert_eq!(
            MatchupEvaluator::evaluate(&a, &b).unwrap_err(),
            LockEngineError::ReplicateMismatch { left: 2, right: 1 }
        );
    }

    #[test]
    fn test_summary_fields() {
        let dist = distribution("A", 12.0, &[20.0, 30.0, 40.0]);
        let summary = MatchupEvaluator::summarize(&dist);
        assert_eq!(summary.team, "A");
        assert_eq!(summary.mean_total, 30.0);
        assert_eq!(summary.locked_points, 12.0);
        assert_eq!(summary.players_left, 1);
        assert!((summary.pct05 - 21.0).abs() < 1e-9);
        assert!((summary.pct95 - 39.0).abs() < 1e-9);
    }
}
