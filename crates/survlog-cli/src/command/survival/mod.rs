//! Survival analysis command
//!
//! Derives per-subject durations from an event log, tabulates them by day,
//! and prints the Kaplan-Meier / Nelson-Aalen curve next to a censoring
//! summary. The curve can also be exported as CSV and the whole result as
//! JSON.

mod export;
mod table;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use survlog_analysis::pipeline::{AnalysisError, SurvivalAnalysis};

use self::table::RowView;
use crate::command::InputArg;

#[derive(Debug, Clone, Args)]
pub(crate) struct SurvivalArg {
    #[clap(flatten)]
    pub input: InputArg,

    /// Print only the first N rows of the life table and curve
    #[arg(long)]
    pub head: Option<usize>,

    /// Print only the last N rows of the life table and curve
    #[arg(long)]
    pub tail: Option<usize>,

    /// Number of decimal places for probabilities and hazards
    #[arg(long, default_value_t = 4)]
    pub precision: usize,

    /// Days to evaluate the survival and cumulative hazard step functions at (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub at_days: Vec<u64>,

    /// Write the curve as CSV to this path
    #[arg(long)]
    pub csv_output: Option<PathBuf>,

    /// Write the life table and curve as JSON to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SurvivalArg) -> anyhow::Result<()> {
    let (events, config) = arg.input.load()?;
    let analysis =
        SurvivalAnalysis::run(&events, &config).context("Failed to run survival analysis")?;

    let endpoint_types = config
        .endpoint_types
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    println!("Survival Analysis Report (endpoints: {endpoint_types})");
    println!("==========================================\n");

    table::print_legend();
    println!();

    match analysis.summary(&config) {
        Ok(summary) => table::print_summary(&summary),
        Err(AnalysisError::EmptyEventLog) => println!("Event log has no subjects"),
        Err(err) => return Err(err.into()),
    }
    println!();

    let view = RowView {
        head: arg.head,
        tail: arg.tail,
    };
    table::print_life_table(&analysis.life_table, view);
    println!();

    table::print_curve(&analysis.curve, view, arg.precision);

    if !arg.at_days.is_empty() {
        println!();
        table::print_step_values(&analysis.curve, &arg.at_days, arg.precision);
    }

    if let Some(path) = &arg.csv_output {
        export::save_curve_csv(path, &analysis.curve)?;
    }
    if let Some(path) = &arg.json_output {
        export::save_report_json(path, &analysis, &config)?;
    }

    Ok(())
}
