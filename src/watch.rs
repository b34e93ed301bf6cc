//! Watch mode - repeat the capture pipeline on a wall-clock interval.
//!
//! Invocations are strictly sequential, never overlapped. The inter-run wait
//! multiplexes three wakeups: the interval tick, Ctrl-C, and an interactive
//! "run now" (any line on stdin). Spawn failures stay fatal here too; a
//! capture that merely parsed to nothing is logged and retried on the next
//! tick.

use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::Instant;
use tracing::{info, warn};

use ccmeter_core::{Settings, SessionError};

use crate::cli::OutputMode;
use crate::output;
use crate::pipeline;

pub async fn run(settings: Settings, mode: OutputMode, interval: Duration) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let snapshot = settings.clone();
        let outcome =
            tokio::task::spawn_blocking(move || pipeline::fetch_once(&snapshot)).await?;

        match outcome {
            Ok(outcome) => output::render(&outcome, mode, &settings)?,
            // A missing executable will not fix itself between ticks
            Err(e) if e.is::<SessionError>() => return Err(e),
            Err(e) => warn!("capture failed: {e:#}"),
        }

        if !wait_for_next(interval, &mut stdin, &mut stdin_open).await {
            return Ok(());
        }
    }
}

/// Bounded wait until the next run. Returns false when the watch loop should
/// stop (Ctrl-C).
async fn wait_for_next(
    interval: Duration,
    stdin: &mut Lines<BufReader<Stdin>>,
    stdin_open: &mut bool,
) -> bool {
    let deadline = Instant::now() + interval;
    info!("next capture in {}s (Enter to run now)", interval.as_secs());

    loop {
        if !*stdin_open {
            // stdin hit EOF earlier; only the tick and Ctrl-C remain
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return true,
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted; stopping watch");
                    return false;
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; stopping watch");
                return false;
            }
            line = stdin.next_line() => match line {
                Ok(Some(_)) => {
                    info!("run requested");
                    return true;
                }
                Ok(None) | Err(_) => {
                    *stdin_open = false;
                }
            }
        }
    }
}
