//! Weekly Lock-in Report Service
//!
//! Loads the week's league tables from a data directory, joins them into
//! player models, runs the lock-in engine and renders the weekly report:
//! matchup projections, lock-in recommendations and potential adds.
//! All I/O happens here, before and after the engine runs.

pub mod cli;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod report;
pub mod roster;
pub mod schedule;
pub mod service;


pub use cli::Cli;
pub use config::{LeagueConfig, ReportFormat, ServiceConfig};
pub use error::{Result, ServiceError};
pub use ingestion::{load_tables, DataSource, InMemorySource, JsonDirectorySource, WeekTables};
pub use logging::{initialize_logging, initialize_logging_with_config};
pub use report::WeeklyReport;
pub use service::LockInService;
