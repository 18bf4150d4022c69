//! Weekly report and its text and JSON renderings

use crate::error::Result;
use chrono::NaiveDateTime;
use lockin_engine::{AdjustedProjection, LockRecommendation, Omission, TeamSummary};
use serde::{Deserialize, Serialize};
use std::fmt;

const RULE: &str = "####################################################################";

/// Both teams' projected totals and my chance of winning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupProjection {
    pub teams: Vec<TeamSummary>,
    pub win_probability: f64,
}

/// Everything sent to the manager for one point in the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub as_of: NaiveDateTime,
    pub week: u32,
    pub seed: u64,
    pub my_team: String,
    pub matchup: MatchupProjection,
    pub recommendations: Vec<LockRecommendation>,
    pub potential_adds: Vec<AdjustedProjection>,
    pub omissions: Vec<Omission>,
}

impl WeeklyReport {
    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WeeklyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Week {} report as of {}", self.week, self.as_of.format("%Y-%m-%d %H:%M"))?;
        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Matchup Projections:")?;
        for team in &self.matchup.teams {
            writeln!(f)?;
            writeln!(
                f,
                "{}: {:.1} points ({:.1} - {:.1})",
                team.team, team.mean_total, team.pct05, team.pct95
            )?;
            writeln!(f, " - {:.1} locked points with {} players left", team.locked_points, team.players_left)?;
        }
        writeln!(f)?;
        writeln!(f, "My Est. Win Probability: {}", percent(self.matchup.win_probability))?;

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Lock-in Recommendations:")?;
        for rec in &self.recommendations {
            writeln!(f)?;
            writeln!(f, "{} - {} - {:.1} points", rec.decision, rec.name, rec.current_score)?;
            writeln!(
                f,
                " - {} chance of scoring better ({} games with avg {:.1} and sd {:.1})",
                percent(rec.probability_better),
                rec.games_left,
                rec.mean,
                rec.std_dev
            )?;
        }

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Potential Adds:")?;
        for add in &self.potential_adds {
            let marker = if add.roster_label == self.my_team { "    " } else { "=== " };
            writeln!(f)?;
            writeln!(f, "{marker}{} - {}", add.roster_label, add.name)?;
            let projected = add
                .adjusted_projection
                .map(|p| format!("{p:.1}"))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "     - avg {:.1}, sd {:.1}, {} games, projected {}",
                add.mean, add.std_dev, add.games_next_period, projected
            )?;
        }

        if !self.omissions.is_empty() {
            writeln!(f)?;
            writeln!(f, "{RULE}")?;
            writeln!(f, "Not available:")?;
            writeln!(f)?;
            for omission in &self.omissions {
                writeln!(f, " - {omission}")?;
            }
        }

        Ok(())
    }
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}
