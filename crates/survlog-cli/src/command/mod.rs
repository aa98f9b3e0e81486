use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use survlog_analysis::{config::AnalysisConfig, event::Event};

use self::{durations::DurationsArg, survival::SurvivalArg};
use crate::{logging, util};

mod durations;
mod survival;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log filter directive, e.g. `debug` (defaults to `RUST_LOG`, then `info`)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Derive per-subject durations from an event log
    Durations(#[clap(flatten)] DurationsArg),
    /// Compute the life table and Kaplan-Meier / Nelson-Aalen curve of an event log
    Survival(#[clap(flatten)] SurvivalArg),
}

/// Event log and analysis settings shared by all subcommands
#[derive(Debug, Clone, Args)]
pub(crate) struct InputArg {
    /// Path to the event log (JSON array, or JSON Lines with a `.jsonl` extension)
    pub events: PathBuf,

    /// Analysis configuration JSON file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Endpoint event types (comma-separated), overriding the configuration file
    #[arg(long, value_delimiter = ',')]
    pub endpoint_types: Option<Vec<String>>,

    /// Population size for the at-risk counts, overriding the configuration file
    #[arg(long)]
    pub total_subjects: Option<usize>,
}

impl InputArg {
    pub(crate) fn load_config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_config_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(endpoint_types) = &self.endpoint_types {
            config.endpoint_types = endpoint_types.iter().cloned().collect();
        }
        if let Some(total_subjects) = self.total_subjects {
            config.total_subjects = Some(total_subjects);
        }
        config.validate().context("Invalid analysis configuration")?;
        tracing::debug!(?config, "analysis configuration");
        Ok(config)
    }

    pub(crate) fn load(&self) -> anyhow::Result<(Vec<Event>, AnalysisConfig)> {
        let config = self.load_config()?;
        let events = util::read_event_log(&self.events)?;
        Ok((events, config))
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    logging::setup_logging(args.log_level.as_deref())?;
    match args.mode {
        Mode::Durations(arg) => durations::run(&arg)?,
        Mode::Survival(arg) => survival::run(&arg)?,
    }
    Ok(())
}
