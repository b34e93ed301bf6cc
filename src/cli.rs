//! Command line interface.

use clap::Parser;
use std::path::PathBuf;

use ccmeter_core::Settings;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Capture Claude Code subscription usage from the /usage screen"
)]
pub struct Cli {
    /// Print the normalized terminal capture instead of a parsed report
    #[arg(long, conflicts_with = "json")]
    pub raw: bool,

    /// Emit the structured report as JSON
    #[arg(long)]
    pub json: bool,

    /// Re-run the capture every SECS seconds until interrupted; press Enter
    /// to run immediately
    #[arg(short, long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Program to drive (default: claude)
    #[arg(long)]
    pub program: Option<String>,

    /// Per-phase read-idle timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub idle_timeout: Option<u64>,

    /// Overall session deadline in seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// How a captured report should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
    Raw,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.raw {
            OutputMode::Raw
        } else if self.json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }

    /// Fold CLI overrides into loaded settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(program) = &self.program {
            settings.program = program.clone();
        }
        if let Some(ms) = self.idle_timeout {
            settings.idle_timeout_ms = ms;
        }
        if let Some(secs) = self.deadline {
            settings.overall_deadline_ms = secs * 1000;
        }
    }
}
