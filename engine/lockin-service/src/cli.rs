//! # Command Line Interface
//!
//! Flags for a single report run. Every flag overrides the matching
//! configuration value.

use crate::config::{ReportFormat, ServiceConfig};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use std::path::PathBuf;

/// Weekly lock-in report for a fantasy matchup
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "lockin-report")]
#[command(about = "Lock-in recommendations, matchup projections and potential adds for the week")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the exported JSON tables
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Report time, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS` (defaults to now)
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<NaiveDateTime>,

    /// Monte Carlo replicates per player
    #[arg(short = 'n', long)]
    pub replicates: Option<u32>,

    /// Simulation seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Apply command line overrides on top of file and environment configuration
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(dir) = &self.data_dir {
            config.data.dir = dir.clone();
        }
        if let Some(replicates) = self.replicates {
            config.engine.simulation.replicate_count = replicates;
        }
        if let Some(seed) = self.seed {
            config.engine.simulation.seed = Some(seed);
        }
        if let Some(format) = self.format {
            config.report.format = format;
        }
        if let Some(output) = &self.output {
            config.report.output = Some(output.clone());
        }
    }

    /// Report time, falling back to the local clock
    pub fn as_of(&self) -> NaiveDateTime {
        self.as_of.unwrap_or_else(|| chrono::Local::now().naive_local())
    }
}

/// Accept a full timestamp or a bare date (start of day)
pub fn parse_as_of(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("invalid date '{value}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS"))
}
