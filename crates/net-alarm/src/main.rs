use anyhow::{Context, Result};
use clap::Parser;
use net_alarm::config::{AlarmConfig, Backend};
use net_alarm::telemetry::init_tracing;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file (defaults are used for anything it omits)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug-level logging (overrides NET_ALARM_VERBOSE)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Use in-memory outputs instead of GPIO
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Run a single cycle, release the outputs and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AlarmConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AlarmConfig::default(),
    };
    config
        .apply_env()
        .context("Failed to apply environment overrides")?;
    if args.verbose {
        config.verbose = true;
    }
    if args.dry_run {
        config.gpio.backend = Backend::Memory;
    }

    init_tracing(config.verbose);

    let summary = net_alarm::run(config, args.once)
        .await
        .context("Network alarm stopped")?;

    tracing::debug!(
        cycles = summary.cycles,
        longest_outage = summary.longest_outage,
        "Exiting network alarm ({:?})",
        summary.exit
    );
    Ok(())
}
