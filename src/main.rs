use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ccmeter::cli::{Cli, OutputMode};
use ccmeter::{output, pipeline, watch};
use ccmeter_core::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.debug);

    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_to(&mut settings);
    settings.validate();

    let mode = cli.output_mode();

    match cli.watch {
        Some(secs) => {
            let interval = Duration::from_secs(secs.max(1));
            watch::run(settings, mode, interval).await
        }
        None => run_once(settings, mode).await,
    }
}

async fn run_once(settings: Settings, mode: OutputMode) -> Result<()> {
    let snapshot = settings.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline::fetch_once(&snapshot)).await??;

    // Raw mode succeeds whenever the session ran; the structured modes need
    // at least one recognizable entry to be useful
    if mode != OutputMode::Raw && outcome.report.entries.is_empty() {
        output::render(&outcome, mode, &settings)?;
        anyhow::bail!("no usage entries found in captured output");
    }

    output::render(&outcome, mode, &settings)
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ccmeter=debug,ccmeter_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("ccmeter=info,ccmeter_core=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
