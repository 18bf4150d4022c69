//! Adjusted projections: expected weekly score under the lock policy

use crate::models::{AdjustedProjection, ReplicateSample};
use crate::simulator::SimulationRun;
use std::cmp::Ordering;

/// Reduces replicate samples to one expected value per player
pub struct ProjectionAggregator;

impl ProjectionAggregator {
    /// Mean locked score over the samples that carry one
    pub fn adjusted_projection(samples: &[ReplicateSample]) -> Option<f64> {
        let (sum, count) = samples
            .iter()
            .filter_map(|s| s.locked_score)
            .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// One projection per simulated player, in run order
    pub fn reduce(run: &SimulationRun) -> Vec<AdjustedProjection> {
        run.players()
            .iter()
            .map(|p| AdjustedProjection {
                player_id: p.player.player_id,
                name: p.player.name.clone(),
                roster_label: p.player.roster_label.clone(),
                mean: p.player.mean,
                std_dev: p.player.std_dev,
                games_next_period: p.player.games_remaining,
                adjusted_projection: Self::adjusted_projection(&p.samples),
            })
            .collect()
    }

    /// Rank candidates by adjusted projection, best first.
    ///
    /// Keeps every candidate ranked at or above the lowest-ranked member of
    /// `own_roster`, i.e. the players worth considering against the current
    /// roster. Without any own-roster member the full ranking is returned.
    pub fn rank_candidates(
        mut projections: Vec<AdjustedProjection>,
        own_roster: &str,
    ) -> Vec<AdjustedProjection> {
        projections.sort_by(|a, b| {
            compare_projection(b.adjusted_projection, a.adjusted_projection)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        if let Some(cutoff) = projections.iter().rposition(|p| p.roster_label == own_roster) {
            projections.truncate(cutoff + 1);
        }

        projections
    }
}

/// `None` ranks below every value
fn compare_projection(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
