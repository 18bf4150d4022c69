//! Monte Carlo lock simulation
//!
//! Each replicate walks a player's remaining games in order, draws a
//! hypothetical score for the game and locks it as soon as the chance of a
//! better later game falls below the lock threshold. The scan stops at the
//! first lock, so the work per replicate is bounded by the games remaining and
//! usually far less.

use crate::config::{NoLockPolicy, SimulationConfig};
use crate::error::{LockEngineError, Result};
use crate::models::{LockResolution, PlayerId, PlayerModel, ReplicateSample};
use crate::probability::ProbabilityModel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Samples of one player across every replicate of a run
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSamples {
    pub player: PlayerModel,
    pub samples: Vec<ReplicateSample>,
}

impl PlayerSamples {
    /// Replicates resolved by the no-lock policy instead of the lock rule
    pub fn fallback_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_locked()).count()
    }

    /// Number of replicates locked on each game; index 0 is game 1
    pub fn lock_game_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.player.games_remaining as usize];
        for sample in self.samples.iter().filter(|s| s.is_locked()) {
            if let Some(game) = sample.game_index_locked {
                counts[(game - 1) as usize] += 1;
            }
        }
        counts
    }

    /// Fraction of replicates whose lock rule fired on `game`
    pub fn fraction_locked_on(&self, game: u32) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let hits = self
            .samples
            .iter()
            .filter(|s| s.is_locked() && s.game_index_locked == Some(game))
            .count();
        hits as f64 / self.samples.len() as f64
    }
}

/// Output of one simulation pass, shared by the projection and team reducers
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    seed: u64,
    replicate_count: u32,
    players: Vec<PlayerSamples>,
    index: HashMap<PlayerId, usize>,
}

impl SimulationRun {
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn replicate_count(&self) -> u32 {
        self.replicate_count
    }

    /// Per-player samples in input order
    pub fn players(&self) -> &[PlayerSamples] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerSamples> {
        self.index.get(&player_id).map(|&i| &self.players[i])
    }

    /// Every sample of the run, player by player
    pub fn samples(&self) -> impl Iterator<Item = &ReplicateSample> {
        self.players.iter().flat_map(|p| p.samples.iter())
    }

    pub fn fallback_count(&self) -> usize {
        self.players.iter().map(PlayerSamples::fallback_count).sum()
    }
}

/// Hypothetical single-game score source for one player
enum ScoreSampler {
    PointMass(f64),
    Normal(Normal<f64>),
}

impl ScoreSampler {
    fn for_player(player: &PlayerModel, model: &ProbabilityModel) -> Result<Self> {
        player.validate()?;

        if model.is_degenerate(player.std_dev) {
            return Ok(ScoreSampler::PointMass(player.mean));
        }

        Normal::new(player.mean, player.std_dev)
            .map(ScoreSampler::Normal)
            .map_err(|e| LockEngineError::invalid_parameters(player.player_id, e.to_string()))
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ScoreSampler::PointMass(value) => *value,
            ScoreSampler::Normal(normal) => normal.sample(rng),
        }
    }
}

/// Runs the lock policy over Monte Carlo replicates
#[derive(Debug, Clone)]
pub struct LockSimulator {
    config: SimulationConfig,
    model: ProbabilityModel,
}

impl LockSimulator {
    /// Create a new simulator
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let model = ProbabilityModel::new(config.degenerate_std_dev);
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn probability_model(&self) -> &ProbabilityModel {
        &self.model
    }

    /// Simulate every player for `replicate_count` replicates.
    ///
    /// Replicate `r` of every player belongs to the same trial, so team totals
    /// built from the run are paired by replicate index.
    pub fn simulate(&self, players: &[PlayerModel]) -> Result<SimulationRun> {
        let start = Instant::now();
        // Drawn seeds stay within i64 so they can be written back to a TOML config
        let seed = self.config.seed.unwrap_or_else(|| rand::random::<u64>() >> 1);

        let mut index = HashMap::with_capacity(players.len());
        for (i, player) in players.iter().enumerate() {
            if index.insert(player.player_id, i).is_some() {
                return Err(LockEngineError::DuplicatePlayer(player.player_id));
            }
        }

        let samples: Vec<Vec<ReplicateSample>> = if self.config.parallel {
            players
                .par_iter()
                .enumerate()
                .map(|(ordinal, player)| self.simulate_player(player, ordinal as u64, seed))
                .collect::<Result<_>>()?
        } else {
            players
                .iter()
                .enumerate()
                .map(|(ordinal, player)| self.simulate_player(player, ordinal as u64, seed))
                .collect::<Result<_>>()?
        };

        let players: Vec<PlayerSamples> = players
            .iter()
            .cloned()
            .zip(samples)
            .map(|(player, samples)| PlayerSamples { player, samples })
            .collect();

        let run =
            SimulationRun { seed, replicate_count: self.config.replicate_count, players, index };

        let fallbacks = run.fallback_count();
        if fallbacks > 0 {
            warn!(
                "{} replicates found no game to lock and were resolved by the {} policy",
                fallbacks, self.config.no_lock_policy
            );
        }

        info!(
            "Simulated {} players x {} replicates in {:?} (seed {})",
            run.players.len(),
            run.replicate_count,
            start.elapsed(),
            seed
        );

        Ok(run)
    }

    /// Simulate all replicates of one player.
    ///
    /// `ordinal` is the player's position in the run input; together with the
    /// run seed and replicate index it selects an independent random stream.
    pub fn simulate_player(
        &self,
        player: &PlayerModel,
        ordinal: u64,
        seed: u64,
    ) -> Result<Vec<ReplicateSample>> {
        let sampler = ScoreSampler::for_player(player, &self.model)?;
        let replicates = 0..self.config.replicate_count;

        let replicate = |r: u32| {
            let replicate_index = r + 1;
            let mut rng = StdRng::seed_from_u64(stream_seed(seed, ordinal, replicate_index));
            self.simulate_replicate(player, &sampler, &mut rng, replicate_index)
        };

        let samples: Vec<ReplicateSample> = if self.config.parallel {
            replicates.into_par_iter().map(replicate).collect::<Result<_>>()?
        } else {
            replicates.map(replicate).collect::<Result<_>>()?
        };

        debug!(
            "Player {} ({}): {} games, {} replicates, {} fallbacks",
            player.player_id,
            player.name,
            player.games_remaining,
            samples.len(),
            samples.iter().filter(|s| !s.is_locked()).count()
        );

        Ok(samples)
    }

    fn simulate_replicate<R: Rng + ?Sized>(
        &self,
        player: &PlayerModel,
        sampler: &ScoreSampler,
        rng: &mut R,
        replicate_index: u32,
    ) -> Result<ReplicateSample> {
        let games = player.games_remaining;
        let mut last_draw = None;

        for game in 1..=games {
            let score = sampler.sample(rng);
            let games_left = games - game;
            let prob =
                self.model.probability_better(score, games_left, player.mean, player.std_dev);

            if prob < self.config.lock_threshold {
                return Ok(ReplicateSample {
                    player_id: player.player_id,
                    replicate_index,
                    locked_score: Some(score),
                    game_index_locked: Some(game),
                    resolution: LockResolution::Locked,
                });
            }

            last_draw = Some((game, score));
        }

        self.resolve_no_lock(player.player_id, replicate_index, last_draw)
    }

    fn resolve_no_lock(
        &self,
        player_id: PlayerId,
        replicate_index: u32,
        last_draw: Option<(u32, f64)>,
    ) -> Result<ReplicateSample> {
        let (locked_score, game_index_locked, resolution) = match self.config.no_lock_policy {
            NoLockPolicy::FinalGame => match last_draw {
                Some((game, score)) => (Some(score), Some(game), LockResolution::FinalGame),
                None => (Some(0.0), None, LockResolution::ZeroPoints),
            },
            NoLockPolicy::ZeroPoints => (Some(0.0), None, LockResolution::ZeroPoints),
            NoLockPolicy::Exclude => (None, None, LockResolution::Excluded),
            NoLockPolicy::Fail => {
                return Err(LockEngineError::NoLockFound { player_id, replicate_index })
            }
        };

        Ok(ReplicateSample {
            player_id,
            replicate_index,
            locked_score,
            game_index_locked,
            resolution,
        })
    }
}

/// Seed of the random stream for one (player, replicate) pair
fn stream_seed(seed: u64, ordinal: u64, replicate_index: u32) -> u64 {
    let player_key = splitmix64(ordinal.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    let replicate_key = splitmix64((replicate_index as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F));
    splitmix64(seed ^ player_key ^ replicate_key.rotate_left(32))
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(replicates: u32, seed: u64) -> SimulationConfig {
        SimulationConfig { replicate_count: replicates, seed: Some(seed), ..Default::default() }
    }

    fn player(id: PlayerId, mean: f64, std_dev: f64, games: u32) -> PlayerModel {
        PlayerModel::new(id, format!("Player {id}"), mean, Some(std_dev), games, None).unwrap()
    }

    #[test]
    fn test_replicate_indices_cover_one_to_n() {
        let simulator = LockSimulator::new(config(250, 1)).unwrap();
        let run = simulator.simulate(&[player(1, 30.0, 10.0, 3), player(2, 22.0, 6.0, 4)]).unwrap();

        for player in run.players() {
            let indices: Vec<u32> = player.samples.iter().map(|s| s.replicate_index).collect();
            assert_eq!(indices, (1..=250).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_locked_game_within_remaining_games() {
        let simulator = LockSimulator::new(config(500, 2)).unwrap();
        let run = simulator.simulate(&[player(1, 30.0, 10.0, 4)]).unwrap();
        let samples = &run.player(1).unwrap().samples;

        assert!(samples.iter().all(|s| s.is_locked()));
        assert!(samples.iter().all(|s| matches!(s.game_index_locked, Some(1..=4))));
        assert_eq!(run.player(1).unwrap().lock_game_counts().iter().sum::<usize>(), 500);
    }

    #[test]
    fn test_final_game_always_locks() {
        // with no games after it, the last game has zero chance of being beaten
        let simulator = LockSimulator::new(config(200, 3)).unwrap();
        let run = simulator.simulate(&[player(1, 25.0, 8.0, 1)]).unwrap();
        assert_eq!(run.player(1).unwrap().fraction_locked_on(1), 1.0);
        assert_eq!(run.fallback_count(), 0);
    }

    #[test]
    fn test_parallel_and_sequential_runs_match() {
        let players = [player(1, 30.0, 10.0, 3), player(2, 41.0, 12.0, 4), player(3, 12.0, 3.0, 2)];

        let parallel = LockSimulator::new(config(300, 42)).unwrap().simulate(&players).unwrap();
        let sequential = LockSimulator::new(SimulationConfig { parallel: false, ..config(300, 42) })
            .unwrap()
            .simulate(&players)
            .unwrap();

        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_different_seeds_differ() {
        let players = [player(1, 30.0, 10.0, 3)];
        let a = LockSimulator::new(config(50, 1)).unwrap().simulate(&players).unwrap();
        let b = LockSimulator::new(config(50, 2)).unwrap().simulate(&players).unwrap();
        assert_ne!(a.players()[0].samples, b.players()[0].samples);
    }

    #[test]
    fn test_no_games_uses_policy() {
        let idle = player(9, 30.0, 10.0, 0);

        let run = LockSimulator::new(config(10, 5)).unwrap().simulate(&[idle.clone()]).unwrap();
        let sample = &run.players()[0].samples[0];
        assert_eq!(sample.locked_score, Some(0.0));
        assert_eq!(sample.game_index_locked, None);
        assert_eq!(run.fallback_count(), 10);

        let exclude = SimulationConfig { no_lock_policy: NoLockPolicy::Exclude, ..config(10, 5) };
        let run = LockSimulator::new(exclude).unwrap().simulate(&[idle.clone()]).unwrap();
        assert!(run.samples().all(|s| s.locked_score.is_none()));
        assert!(run.samples().all(|s| s.resolution == LockResolution::Excluded));

        let fail = SimulationConfig { no_lock_policy: NoLockPolicy::Fail, ..config(10, 5) };
        let err = LockSimulator::new(fail).unwrap().simulate(&[idle]).unwrap_err();
        assert!(matches!(err, LockEngineError::NoLockFound { player_id: 9, .. }));
    }

    #[test]
    fn test_zero_threshold_falls_back_to_final_game() {
        let never_lock = SimulationConfig { lock_threshold: 0.0, ..config(20, 8) };
        let run = LockSimulator::new(never_lock).unwrap().simulate(&[player(4, 20.0, 5.0, 3)]).unwrap();

        for sample in run.samples() {
            assert_eq!(sample.resolution, LockResolution::FinalGame);
            assert_eq!(sample.game_index_locked, Some(3));
            assert!(sample.locked_score.is_some());
        }
    }

    #[test]
    fn test_duplicate_players_rejected() {
        let simulator = LockSimulator::new(config(10, 1)).unwrap();
        let err = simulator.simulate(&[player(1, 30.0, 10.0, 2), player(1, 30.0, 10.0, 2)]);
        assert_eq!(err.unwrap_err(), LockEngineError::DuplicatePlayer(1));
    }

    #[test]
    fn test_invalid_player_rejected() {
        let mut bad = player(5, 30.0, 10.0, 2);
        bad.std_dev = -3.0;
        let err = LockSimulator::new(config(10, 1)).unwrap().simulate(&[bad]).unwrap_err();
        assert!(matches!(err, LockEngineError::InvalidDistributionParameters { player_id: 5, .. }));
    }

    #[test]
    fn test_drawn_seed_can_be_saved_to_config() {
        let unseeded = SimulationConfig { seed: None, ..config(4, 0) };
        let simulator = LockSimulator::new(unseeded).unwrap();

        for _ in 0..32 {
            let seed = simulator.simulate(&[player(1, 30.0, 10.0, 2)]).unwrap().seed();
            assert!(seed <= i64::MAX as u64);

            let mut saved = crate::config::EngineConfig::default();
            saved.simulation.seed = Some(seed);
            let text = toml::to_string(&saved).unwrap();
            let loaded: crate::config::EngineConfig = toml::from_str(&text).unwrap();
            assert_eq!(loaded.simulation.seed, Some(seed));
        }
    }

    #[test]
    fn test_stream_seeds_are_distinct() {
        let mut seeds = std::collections::HashSet::new();
        for ordinal in 0..20 {
            for replicate in 1..=200 {
                assert!(seeds.insert(stream_seed(7, ordinal, replicate)));
            }
        }
    }
}
