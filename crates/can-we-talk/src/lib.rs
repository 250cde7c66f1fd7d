//! can-we-talk
//!
//! Connects to a vehicle's OBD-II CAN bus and reads the OBD standard it
//! conforms to, the fuel tank level and the run time since engine start.

pub mod config;
pub mod output;

use anyhow::Context;
use obd_protocol::{open_bus, Session, Survey};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;

/// Initialize logging on stderr, leaving stdout to the readings
pub fn init_logging(verbose: bool, json: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set tracing subscriber")
}

/// Open the configured bus and query every supported PID.
///
/// Only configuration and transport failures are returned as errors;
/// per-PID failures are part of the survey.
pub fn run_survey(config: &AppConfig) -> anyhow::Result<Survey> {
    config.session.addressing.validate()?;

    let bus = open_bus(config.bus.adapter, &config.bus.channel).context(
        "unable to connect to CAN bus, check that hardware is connected and that socketcan is active",
    )?;

    let mut session = Session::new(bus, config.session.clone());
    let survey = session.survey().context("CAN bus failure during survey")?;
    session.close();

    info!("Read {} of {} values", survey.success_count(), survey.outcomes().len());
    Ok(survey)
}
