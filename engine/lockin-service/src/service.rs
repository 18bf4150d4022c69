//! Weekly report orchestration: load, join, simulate, render, publish

use crate::config::{ReportFormat, ServiceConfig};
use crate::error::Result;
use crate::ingestion::{load_tables, DataSource, LockedPointsRecord, WeekTables};
use crate::report::{MatchupProjection, WeeklyReport};
use crate::roster::PlayerDirectory;
use crate::schedule::{most_recent_scores, week_number, Schedule};
use chrono::NaiveDateTime;
use lockin_engine::{
    AdjustedProjection, LockRecommender, LockSimulator, LockedEntry, MatchupEvaluator, Omission,
    OmissionReason, OpenPlayerObservation, PlayerId, PlayerModel, ProbabilityModel,
    ProjectionAggregator, RecommendationSet, SimulationRun, TeamAggregator, TeamRoster,
};
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const MATCHUP_CONTEXT: &str = "matchup projections";
const ADDS_CONTEXT: &str = "potential adds";

/// Both teams of this week's matchup and the models of their open players
#[derive(Debug, Clone)]
struct WeekRosters {
    mine: TeamRoster,
    opponent: TeamRoster,
    models: Vec<PlayerModel>,
}

/// Builds and publishes the weekly lock-in report
pub struct LockInService<S: DataSource> {
    source: S,
    config: ServiceConfig,
}

impl<S: DataSource> LockInService<S> {
    pub fn new(source: S, config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Load every table and build the report for `as_of`
    pub async fn run(&self, as_of: NaiveDateTime) -> Result<WeeklyReport> {
        let tables = load_tables(&self.source).await?;
        self.build_report(&tables, as_of)
    }

    /// Build the report from tables already loaded
    pub fn build_report(&self, tables: &WeekTables, as_of: NaiveDateTime) -> Result<WeeklyReport> {
        let league = &self.config.league;
        let week = week_number(as_of.date(), league.season_start);
        info!("Building week {} report as of {}", week, as_of);

        let (directory, mut omissions) = PlayerDirectory::build(tables);
        let schedule = Schedule::new(&tables.games);

        let rosters = self.week_rosters(tables, &directory, &schedule, week, as_of, &mut omissions);

        let simulator = LockSimulator::new(self.config.engine.simulation.clone())?;
        let run = simulator.simulate(&rosters.models)?;
        let matchup = Self::project_matchup(&run, &rosters)?;

        let scores = most_recent_scores(&tables.stats, week);
        let locks = self.recommend_locks(&rosters.models, &scores)?;
        omissions.extend(locks.omissions);

        let potential_adds =
            self.potential_adds(&directory, &schedule, week, run.seed(), &mut omissions)?;

        info!(
            "Week {} report: {:.1}% win probability, {} lock recommendations, {} potential adds, {} omissions",
            week,
            matchup.win_probability * 100.0,
            locks.recommendations.len(),
            potential_adds.len(),
            omissions.len()
        );

        Ok(WeeklyReport {
            as_of,
            week,
            seed: run.seed(),
            my_team: league.my_team.clone(),
            matchup,
            recommendations: locks.recommendations,
            potential_adds,
            omissions,
        })
    }

    /// Split this week's locked-points rows into banked and open players per team.
    ///
    /// Each player counts once. Banked points win over an open row for the same
    /// player, and the first team listing a player keeps them; every row set
    /// aside that way is reported as an omission. Open players without a usable
    /// model are not simulated but still count as players left.
    fn week_rosters(
        &self,
        tables: &WeekTables,
        directory: &PlayerDirectory,
        schedule: &Schedule,
        week: u32,
        as_of: NaiveDateTime,
        omissions: &mut Vec<Omission>,
    ) -> WeekRosters {
        let league = &self.config.league;
        let fallback = self.config.engine.simulation.fallback_std_dev;

        let mut mine = TeamRoster::new(league.my_team.clone());
        let mut opponent = TeamRoster::new(league.opponent_team.clone());
        let mut models = Vec::new();

        let rows: Vec<&LockedPointsRecord> = tables
            .locked_points
            .iter()
            .filter(|r| r.week_number == week)
            .filter(|r| {
                let matched = r.team == league.my_team || r.team == league.opponent_team;
                if !matched {
                    debug!("Skipping locked-points row for team {}", r.team);
                }
                matched
            })
            .collect();

        let mut banked: HashMap<PlayerId, &str> = HashMap::new();
        for (row, points) in rows.iter().filter_map(|r| r.locked_points.map(|p| (r, p))) {
            match banked.get(&row.player_id) {
                None => {
                    banked.insert(row.player_id, row.team.as_str());
                    let roster = if row.team == league.my_team { &mut mine } else { &mut opponent };
                    roster.locked.push(LockedEntry {
                        player_id: row.player_id,
                        name: row.player_name.clone(),
                        points,
                    });
                }
                Some(team) if *team == row.team => {
                    debug!("Ignoring repeated banked row for player {}", row.player_id);
                }
                Some(team) => {
                    warn!("Player {} is banked for both {} and {}", row.player_id, team, row.team);
                    omissions.push(conflict(row, format!("points already banked for {team}")));
                }
            }
        }

        let mut open: HashMap<PlayerId, &str> = HashMap::new();
        for row in rows.iter().filter(|r| r.locked_points.is_none()) {
            if let Some(team) = banked.get(&row.player_id) {
                warn!("Player {} is open for {} but banked for {}", row.player_id, row.team, team);
                omissions.push(conflict(row, format!("points already banked for {team}")));
                continue;
            }

            match open.get(&row.player_id) {
                None => {
                    open.insert(row.player_id, row.team.as_str());
                }
                Some(team) if *team == row.team => {
                    debug!("Ignoring repeated open row for player {}", row.player_id);
                    continue;
                }
                Some(team) => {
                    warn!("Player {} is open for both {} and {}", row.player_id, team, row.team);
                    omissions.push(conflict(row, format!("already open for {team}")));
                    continue;
                }
            }

            let roster = if row.team == league.my_team { &mut mine } else { &mut opponent };

            let Some(profile) = directory.get(row.player_id) else {
                roster.unmodeled_open += 1;
                omissions.push(Omission::new(
                    Some(row.player_id),
                    row.player_name.clone(),
                    MATCHUP_CONTEXT,
                    OmissionReason::UnknownPlayer,
                ));
                continue;
            };

            let games = schedule.games_remaining(profile.team_id, week, as_of);
            match profile.to_model(games, &row.team, fallback, MATCHUP_CONTEXT) {
                Ok(model) => {
                    roster.open.push(model.player_id);
                    models.push(model);
                }
                Err(omission) => {
                    roster.unmodeled_open += 1;
                    omissions.push(omission);
                }
            }
        }

        WeekRosters { mine, opponent, models }
    }

    /// Reduce one shared run to both teams and compare them
    fn project_matchup(
        run: &SimulationRun,
        rosters: &WeekRosters,
    ) -> Result<MatchupProjection> {
        let mine = TeamAggregator::reduce(run, &rosters.mine)?;
        let opponent = TeamAggregator::reduce(run, &rosters.opponent)?;
        let result = MatchupEvaluator::evaluate(&mine, &opponent)?;

        Ok(MatchupProjection {
            teams: vec![result.team_a, result.team_b],
            win_probability: result.win_probability,
        })
    }

    /// Lock or wait guidance for my open players
    fn recommend_locks(
        &self,
        models: &[PlayerModel],
        scores: &HashMap<PlayerId, f64>,
    ) -> Result<RecommendationSet> {
        let engine = &self.config.engine;
        let recommender = LockRecommender::new(
            &engine.recommendation,
            ProbabilityModel::new(engine.simulation.degenerate_std_dev),
        )?;

        let observations: Vec<_> = models
            .iter()
            .filter(|m| m.roster_label == self.config.league.my_team)
            .map(|m| OpenPlayerObservation {
                player: m.clone(),
                current_score: scores.get(&m.player_id).copied(),
            })
            .collect();

        Ok(recommender.recommend(&observations))
    }

    /// My roster and the best free agents, ranked by next week's adjusted projection
    fn potential_adds(
        &self,
        directory: &PlayerDirectory,
        schedule: &Schedule,
        week: u32,
        seed: u64,
        omissions: &mut Vec<Omission>,
    ) -> Result<Vec<AdjustedProjection>> {
        let league = &self.config.league;
        let fallback = self.config.engine.simulation.fallback_std_dev;
        let next_week = week + 1;

        let candidates = directory
            .on_roster(league.my_roster_id)
            .into_iter()
            .map(|p| (p, league.my_team.as_str()))
            .chain(
                directory
                    .free_agents(league.free_agent_pool)
                    .into_iter()
                    .map(|p| (p, league.free_agent_label.as_str())),
            );

        let mut models = Vec::new();
        for (profile, label) in candidates {
            let games = schedule.games_in_week(profile.team_id, next_week);
            match profile.to_model(games, label, fallback, ADDS_CONTEXT) {
                Ok(model) => models.push(model),
                Err(omission) => omissions.push(omission),
            }
        }

        let mut config = self.config.engine.simulation.clone();
        config.seed = Some(seed);
        let run = LockSimulator::new(config)?.simulate(&models)?;

        Ok(ProjectionAggregator::rank_candidates(
            ProjectionAggregator::reduce(&run),
            &league.my_team,
        ))
    }

    /// Write the rendered report to the configured file, or stdout
    pub async fn publish(&self, report: &WeeklyReport) -> Result<()> {
        let rendered = match self.config.report.format {
            ReportFormat::Text => report.render_text(),
            ReportFormat::Json => report.render_json()?,
        };

        match &self.config.report.output {
            Some(path) => {
                tokio::fs::write(path, rendered.as_bytes()).await?;
                info!("Report written to {:?}", path);
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(rendered.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }
}

/// Omission for a locked-points row set aside in favour of another row
fn conflict(row: &LockedPointsRecord, reason: String) -> Omission {
    Omission::new(
        Some(row.player_id),
        row.player_name.clone(),
        MATCHUP_CONTEXT,
        OmissionReason::ConflictingEntry(reason),
    )
}
