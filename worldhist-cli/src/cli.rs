//! Argument parsing for the single `run` command (§6's CLI collaborator):
//! takes a config path, writes world state, statistics and logs to an
//! output directory, and exits non-zero on validation failure.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "worldhist", about = "Procedural world-history simulator engine", version)]
pub struct Cli {
    /// Path to the run's JSON configuration file (§6.1).
    pub config: PathBuf,

    /// Directory the run's outputs are written to.
    #[arg(long, default_value = "output")]
    pub output: PathBuf,

    /// Tracing verbosity, overridden by `RUST_LOG` when set.
    #[arg(long, value_enum, default_value_t = TraceLevel::Info)]
    pub trace: TraceLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TraceLevel> for tracing::level_filters::LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => Self::OFF,
            TraceLevel::Error => Self::ERROR,
            TraceLevel::Warn => Self::WARN,
            TraceLevel::Info => Self::INFO,
            TraceLevel::Debug => Self::DEBUG,
            TraceLevel::Trace => Self::TRACE,
        }
    }
}
