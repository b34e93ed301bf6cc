//! Settings - TOML config file with serde defaults, CLI overrides merged by
//! the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::session::SessionConfig;

/// Application settings, loaded from `~/.config/ccmeter/config.toml` (or an
/// explicit path). Every field has a default, so a missing file means
/// default settings, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Program to drive
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments for the program
    #[serde(default)]
    pub args: Vec<String>,

    /// Terminal rows for the pty
    #[serde(default = "default_rows")]
    pub rows: u16,

    /// Terminal columns for the pty. The target renders differently-wrapped
    /// progress bars at other widths; the parser expects this layout.
    #[serde(default = "default_cols")]
    pub cols: u16,

    /// Idle window for the initial startup read, in milliseconds
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    /// Default read-idle window per phase, in milliseconds. This is the
    /// silence-based completion heuristic; raising it trades latency for
    /// tolerance of slow renders.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Hard deadline for the whole session, in milliseconds
    #[serde(default = "default_overall_deadline_ms")]
    pub overall_deadline_ms: u64,

    /// Delay between typed characters, in milliseconds
    #[serde(default = "default_char_delay_ms")]
    pub char_delay_ms: u64,

    /// Length of the session billing period, in minutes (5 hours)
    #[serde(default = "default_session_period_minutes")]
    pub session_period_minutes: i64,

    /// Length of the weekly billing period, in minutes (7 days)
    #[serde(default = "default_weekly_period_minutes")]
    pub weekly_period_minutes: i64,
}

fn default_program() -> String {
    "claude".to_string()
}

fn default_rows() -> u16 {
    50
}

fn default_cols() -> u16 {
    120
}

fn default_startup_timeout_ms() -> u64 {
    4000
}

fn default_idle_timeout_ms() -> u64 {
    1000
}

fn default_overall_deadline_ms() -> u64 {
    60_000
}

fn default_char_delay_ms() -> u64 {
    30
}

fn default_session_period_minutes() -> i64 {
    300
}

fn default_weekly_period_minutes() -> i64 {
    10_080
}

impl Default for Settings {
    fn default() -> Self {
        // Empty TOML exercises exactly the serde defaults
        toml::from_str("").expect("default Settings must deserialize")
    }
}

impl Settings {
    /// Load settings from the given path, or the default config location.
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Default config file location: `<config_dir>/ccmeter/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ccmeter").join("config.toml"))
    }

    /// Clamp nonsensical values back to defaults
    pub fn validate(&mut self) {
        if self.idle_timeout_ms == 0 {
            warn!("idle_timeout_ms of 0 would never capture anything; using default");
            self.idle_timeout_ms = default_idle_timeout_ms();
        }
        if self.overall_deadline_ms < self.idle_timeout_ms {
            warn!("overall_deadline_ms below idle_timeout_ms; using default deadline");
            self.overall_deadline_ms = default_overall_deadline_ms();
        }
        if self.session_period_minutes <= 0 {
            self.session_period_minutes = default_session_period_minutes();
        }
        if self.weekly_period_minutes <= 0 {
            self.weekly_period_minutes = default_weekly_period_minutes();
        }
    }

    /// Session driver configuration derived from these settings
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            program: self.program.clone(),
            args: self.args.clone(),
            rows: self.rows,
            cols: self.cols,
            startup_timeout: Duration::from_millis(self.startup_timeout_ms),
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            overall_deadline: Duration::from_millis(self.overall_deadline_ms),
            ..SessionConfig::default()
        }
    }

    /// Billing period for an entry, chosen by name: "session" categories use
    /// the 5-hour session period, everything else the weekly period.
    pub fn period_for(&self, entry_name: &str) -> i64 {
        if entry_name.to_lowercase().contains("session") {
            self.session_period_minutes
        } else {
            self.weekly_period_minutes
        }
    }
}
