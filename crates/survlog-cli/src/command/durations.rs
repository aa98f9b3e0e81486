use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use survlog_analysis::duration::DurationTable;

use crate::{command::InputArg, schema::duration_record::DurationTableRecord, util::Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct DurationsArg {
    #[clap(flatten)]
    pub input: InputArg,

    /// Output file path (defaults to stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &DurationsArg) -> anyhow::Result<()> {
    let (events, config) = arg.input.load()?;

    let table = DurationTable::from_events(&events, &config)
        .context("Failed to derive durations from event log")?;
    table
        .check_consistency(&events)
        .context("Derived durations are inconsistent with the event log")?;

    eprintln!(
        "Derived durations for {} subjects ({} reached an endpoint)",
        table.len(),
        table.endpoint_count()
    );

    let record =
        DurationTableRecord::from_table(&table, config.endpoint_types, config.seconds_per_day)?;
    Output::save_json(&record, arg.output.clone())?;

    Ok(())
}
