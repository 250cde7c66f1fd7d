//! can-we-talk - OBD-II over CAN query tool

use anyhow::Context;
use can_we_talk::config::{AppConfig, CliOverrides};
use can_we_talk::output::{self, OutputFormat};
use can_we_talk::{init_logging, run_survey};
use clap::Parser;
use obd_protocol::AdapterKind;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "can-we-talk")]
#[command(author, version, about = "Query a vehicle's OBD-II interface over CAN")]
struct Cli {
    /// CAN bus type: socketcan (alias socketcan_native) or virtual
    #[arg(short, long)]
    bustype: Option<AdapterKind>,

    /// CAN channel [default: can0]
    #[arg(short, long)]
    channel: Option<String>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Response timeout per PID in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Verbose logging (the version is printed by -V/--version)
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;

    info!("=== can-we-talk v{} ===", env!("CARGO_PKG_VERSION"));

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(CliOverrides {
        adapter: cli.bustype,
        channel: cli.channel,
        timeout_ms: cli.timeout_ms,
    });

    let survey = run_survey(&config)?;
    println!("{}", output::render(&survey, cli.format)?);

    Ok(())
}
