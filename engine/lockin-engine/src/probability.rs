//! Chance that a later game beats a reference score

use crate::DEFAULT_DEGENERATE_STD_DEV;
use statrs::distribution::{ContinuousCDF, Normal};

/// Normal single-game scoring model with a fixed point-mass policy for tiny spreads.
///
/// For `games_left` independent draws from `Normal(mean, std_dev)` the chance
/// that at least one exceeds `current` is `1 - F(current)^games_left`.
/// A spread at or below `degenerate_std_dev` is treated as a point mass at the
/// mean, so `F(current)` is 1 for `current >= mean` and 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityModel {
    degenerate_std_dev: f64,
}

impl Default for ProbabilityModel {
    fn default() -> Self {
        Self { degenerate_std_dev: DEFAULT_DEGENERATE_STD_DEV }
    }
}

impl ProbabilityModel {
    pub fn new(degenerate_std_dev: f64) -> Self {
        Self { degenerate_std_dev: degenerate_std_dev.max(0.0) }
    }

    pub fn degenerate_std_dev(&self) -> f64 {
        self.degenerate_std_dev
    }

    /// True when `std_dev` is handled as a point mass
    pub fn is_degenerate(&self, std_dev: f64) -> bool {
        std_dev.is_nan() || std_dev <= self.degenerate_std_dev
    }

    /// P(X <= current) for a single game
    pub fn single_game_cdf(&self, current: f64, mean: f64, std_dev: f64) -> f64 {
        // an unscored game has nothing to protect
        if current.is_nan() {
            return 0.0;
        }

        if !self.is_degenerate(std_dev) {
            if let Ok(normal) = Normal::new(mean, std_dev) {
                return normal.cdf(current).clamp(0.0, 1.0);
            }
        }

        if current >= mean {
            1.0
        } else {
            0.0
        }
    }

    /// Chance that any of the next `games_left` games scores more than `current`
    pub fn probability_better(&self, current: f64, games_left: u32, mean: f64, std_dev: f64) -> f64 {
        if games_left == 0 {
            return 0.0;
        }

        let p_single = self.single_game_cdf(current, mean, std_dev);
        let exponent = i32::try_from(games_left).unwrap_or(i32::MAX);
        (1.0 - p_single.powi(exponent)).clamp(0.0, 1.0)
    }
}

/// [`ProbabilityModel::probability_better`] with the default degenerate tolerance
pub fn probability_of_better_outcome(current: f64, games_left: u32, mean: f64, std_dev: f64) -> f64 {
    ProbabilityModel::default().probability_better(current, games_left, mean, std_dev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_games_left_means_no_upside() {
        for current in [-10.0, 0.0, 25.0, 80.0, f64::NAN] {
            assert_eq!(probability_of_better_outcome(current, 0, 30.0, 10.0), 0.0);
        }
    }

    #[test]
    fn test_median_score_single_game() {
        let prob = probability_of_better_outcome(30.0, 1, 30.0, 10.0);
        assert!((prob - 0.5).abs() < 1e-9);

        // two games: 1 - 0.5^2
        let prob = probability_of_better_outcome(30.0, 2, 30.0, 10.0);
        assert!((prob - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_one_sigma_above_mean() {
        // F(mean + sd) ~= 0.841345
        let prob = probability_of_better_outcome(40.0, 1, 30.0, 10.0);
        assert!((prob - 0.158655).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_distribution_at_mean() {
        for games_left in 1..5 {
            let prob = probability_of_better_outcome(30.0, games_left, 30.0, 0.0);
            assert_eq!(prob, 0.0);
            assert!(!prob.is_nan());
        }
        assert_eq!(probability_of_better_outcome(29.0, 2, 30.0, 0.0), 1.0);
        assert_eq!(probability_of_better_outcome(31.0, 2, 30.0, 0.0), 0.0);
    }

    #[test]
    fn test_tolerance_controls_degeneracy() {
        let strict = ProbabilityModel::new(0.0);
        assert!(!strict.is_degenerate(0.01));
        assert!(strict.is_degenerate(0.0));

        let loose = ProbabilityModel::default();
        assert!(loose.is_degenerate(0.01));
        assert!(!loose.is_degenerate(5.0));
        assert!(loose.is_degenerate(f64::NAN));
    }

    #[test]
    fn test_unscored_current_always_has_upside() {
        assert_eq!(probability_of_better_outcome(f64::NAN, 2, 30.0, 10.0), 1.0);
    }

    proptest! {
        #[test]
        fn prop_probability_in_unit_interval(
            current in -50.0f64..150.0,
            games_left in 0u32..8,
            mean in 0.0f64..80.0,
            std_dev in 0.0f64..25.0,
        ) {
            let prob = probability_of_better_outcome(current, games_left, mean, std_dev);
            prop_assert!((0.0..=1.0).contains(&prob));
        }

        #[test]
        fn prop_non_increasing_in_current(
            a in -50.0f64..150.0,
            b in -50.0f64..150.0,
            games_left in 0u32..8,
            mean in 0.0f64..80.0,
            std_dev in 0.5f64..25.0,
        ) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let p_low = probability_of_better_outcome(low, games_left, mean, std_dev);
            let p_high = probability_of_better_outcome(high, games_left, mean, std_dev);
            prop_assert!(p_high <= p_low + 1e-12);
        }

        #[test]
        fn prop_non_decreasing_in_games_left(
            current in -50.0f64..150.0,
            games_left in 0u32..8,
            mean in 0.0f64..80.0,
            std_dev in 0.5f64..25.0,
        ) {
            let fewer = probability_of_better_outcome(current, games_left, mean, std_dev);
            let more = probability_of_better_outcome(current, games_left + 1, mean, std_dev);
            prop_assert!(more + 1e-12 >= fewer);
        }
    }
}
