//! Core library for ccmeter - capture Claude Code subscription usage from the
//! `/usage` screen of the interactive CLI.
//!
//! Claude Code exposes this data only on an ephemeral, ANSI-formatted terminal
//! screen. The pipeline here runs in four stages:
//!
//! 1. [`session`] spawns the CLI inside a pseudo-terminal, scripts the
//!    keystrokes that open the `/usage` screen, and captures raw bytes.
//! 2. [`normalize`] strips escape sequences and control bytes from the capture.
//! 3. [`usage`] reconstructs structured entries from the normalized text.
//! 4. [`reset`] turns each entry's reset phrase into a remaining duration and
//!    an elapsed fraction of the billing period.

pub mod config;
pub mod normalize;
pub mod reset;
pub mod session;
pub mod usage;

pub use config::Settings;
pub use normalize::normalize;
pub use reset::{remaining, RemainingTime};
pub use session::{run_session, usage_script, SessionConfig, SessionError};
pub use usage::{parse_usage_report, UsageEntry, UsageReport};
