//! LOCK/WAIT guidance from scores already posted this week

use crate::config::RecommendationConfig;
use crate::error::Result;
use crate::models::{LockDecision, LockRecommendation, Omission, OmissionReason, PlayerModel};
use crate::probability::ProbabilityModel;
use tracing::debug;

/// An open player together with the latest real score posted this week
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPlayerObservation {
    pub player: PlayerModel,
    pub current_score: Option<f64>,
}

/// Recommendations, strongest locks first, plus players that could not be assessed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationSet {
    pub recommendations: Vec<LockRecommendation>,
    pub omissions: Vec<Omission>,
}

/// Applies the probability model to each open player's current score
#[derive(Debug, Clone)]
pub struct LockRecommender {
    lock_threshold: f64,
    model: ProbabilityModel,
}

impl LockRecommender {
    pub fn new(config: &RecommendationConfig, model: ProbabilityModel) -> Result<Self> {
        config.validate()?;
        Ok(Self { lock_threshold: config.lock_threshold, model })
    }

    /// Assess one player
    pub fn recommend_one(&self, player: &PlayerModel, current_score: f64) -> LockRecommendation {
        let probability_better = self.model.probability_better(
            current_score,
            player.games_remaining,
            player.mean,
            player.std_dev,
        );

        let decision = if probability_better < self.lock_threshold {
            LockDecision::Lock
        } else {
            LockDecision::Wait
        };

        debug!(
            "{}: {:.1} points, {:.1}% chance of better over {} games -> {}",
            player.name,
            current_score,
            probability_better * 100.0,
            player.games_remaining,
            decision
        );

        LockRecommendation {
            player_id: player.player_id,
            name: player.name.clone(),
            current_score,
            probability_better,
            decision,
            games_left: player.games_remaining,
            mean: player.mean,
            std_dev: player.std_dev,
        }
    }

    /// Assess every open player, sorted ascending by chance of a better game
    pub fn recommend(&self, observations: &[OpenPlayerObservation]) -> RecommendationSet {
        let mut set = RecommendationSet::default();

        for observation in observations {
            match observation.current_score.filter(|score| score.is_finite()) {
                Some(score) => set.recommendations.push(self.recommend_one(&observation.player, score)),
                None => set.omissions.push(Omission::new(
                    Some(observation.player.player_id),
                    observation.player.name.clone(),
                    "lock recommendations",
                    OmissionReason::NoScoreThisWeek,
                )),
            }
        }

        set.recommendations.sort_by(|a, b| {
            a.probability_better
                .total_cmp(&b.probability_better)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(id: u32, mean: f64, sd: f64, games: u32, score: Option<f64>) -> OpenPlayerObservation {
        OpenPlayerObservation {
            player: PlayerModel::new(id, format!("P{id}"), mean, Some(sd), games, None).unwrap(),
            current_score: score,
        }
    }

    fn recommender(threshold: f64) -> LockRecommender {
        LockRecommender::new(&RecommendationConfig { lock_threshold: threshold }, ProbabilityModel::default())
            .unwrap()
    }

    #[test]
    fn test_sorted_strongest_locks_first() {
        let set = recommender(0.5).recommend(&[
            observation(1, 30.0, 10.0, 2, Some(20.0)),
            observation(2, 30.0, 10.0, 2, Some(55.0)),
            observation(3, 30.0, 10.0, 0, Some(5.0)),
        ]);

        let ids: Vec<u32> = set.recommendations.iter().map(|r| r.player_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(set.recommendations[0].decision, LockDecision::Lock);
        assert_eq!(set.recommendations[0].probability_better, 0.0);
        assert_eq!(set.recommendations[2].decision, LockDecision::Wait);
        assert!(set
            .recommendations
            .windows(2)
            .all(|w| w[0].probability_better <= w[1].probability_better));
    }

    #[test]
    fn test_threshold_is_configurable() {
        // one game left at the mean: exactly 50% chance of better
        let obs = [observation(1, 30.0, 10.0, 1, Some(30.0))];
        assert_eq!(recommender(0.5).recommend(&obs).recommendations[0].decision, LockDecision::Wait);
        assert_eq!(recommender(0.6).recommend(&obs).recommendations[0].decision, LockDecision::Lock);
    }

    #[test]
    fn test_missing_score_is_reported() {
        let set = recommender(0.5).recommend(&[observation(4, 30.0, 10.0, 3, None)]);
        assert!(set.recommendations.is_empty());
        assert_eq!(set.omissions.len(), 1);
        assert_eq!(set.omissions[0].reason, OmissionReason::NoScoreThisWeek);
    }

    #[test]
    fn test_recommendation_carries_model_fields() {
        let rec = recommender(0.5).recommend_one(
            &PlayerModel::new(8, "Eight", 24.0, Some(7.0), 3, None).unwrap(),
            31.0,
        );
        assert_eq!(rec.games_left, 3);
        assert_eq!(rec.mean, 24.0);
        assert_eq!(rec.std_dev, 7.0);
        assert_eq!(rec.current_score, 31.0);
    }
}
