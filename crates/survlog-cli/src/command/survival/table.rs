//! Tabular display of the life table, curve, and censoring summary

use survlog_analysis::summary::CensoringSummary;
use survlog_stats::{
    life_table::{DayBin, LifeTable},
    survival::{CurvePoint, SurvivalCurve},
};

/// Which rows of a long table to print
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct RowView {
    pub head: Option<usize>,
    pub tail: Option<usize>,
}

impl RowView {
    /// Number of leading rows, omitted rows, and trailing rows to print out
    /// of `len`.
    ///
    /// Without limits every row is leading. If the head and tail overlap, no
    /// row is omitted.
    fn row_counts(self, len: usize) -> (usize, usize, usize) {
        match (self.head, self.tail) {
            (None, None) => (len, 0, 0),
            (Some(head), None) => {
                let head = head.min(len);
                (head, len - head, 0)
            }
            (None, Some(tail)) => {
                let tail = tail.min(len);
                (0, len - tail, tail)
            }
            (Some(head), Some(tail)) if head.saturating_add(tail) >= len => (len, 0, 0),
            (Some(head), Some(tail)) => (head, len - head - tail, tail),
        }
    }
}

fn print_omitted(omitted: usize) {
    if omitted > 0 {
        println!("  ... ({omitted} rows omitted)");
    }
}

/// Print legend explaining the summary and curve columns
pub(super) fn print_legend() {
    println!("Legend:");
    println!("  Mean(Comp)  : Mean duration of subjects that reached an endpoint");
    println!("  Mean(All)   : Naive mean of all durations (complete + censored, biased estimate)");
    println!("  All/Comp    : Ratio of the two means");
    println!("  Median(All) : Naive median of all durations");
    println!("  Median(KM)  : Kaplan-Meier median survival (handles censoring)");
    println!("  KM vs All   : Difference between KM median and naive mean (% change)");
    println!("  S(t)        : Kaplan-Meier probability of not reaching an endpoint by day t");
    println!("  H(t)        : Nelson-Aalen cumulative hazard up to day t");
    println!("  In bin      : Subjects leaving observation that day without an endpoint");
    println!("  Censored    : Curve drop in at-risk count to the next day bin, less events");
}

#[expect(clippy::cast_precision_loss)]
pub(super) fn print_summary(summary: &CensoringSummary) {
    println!("Overall Statistics:");
    println!(
        "  Log subjects: {} total, {} reached an endpoint ({:.1}%), {} censored ({:.1}%)",
        summary.subjects,
        summary.endpoints,
        100.0 * summary.endpoints as f64 / summary.subjects as f64,
        summary.censored,
        summary.censoring_rate(),
    );
    if summary.unobserved() > 0 {
        println!(
            "  Population: {} ({} subjects not in the log, at risk until the last day bin)",
            summary.population,
            summary.unobserved(),
        );
    }
    println!();

    let mean_complete = summary
        .mean_complete_days
        .map_or("N/A".to_string(), |m| format!("{m:.2}"));
    let ratio = summary
        .all_complete_ratio()
        .map_or("N/A".to_string(), |r| format!("{r:.2}"));
    let median_km = summary
        .median_km_days
        .map_or("N/A".to_string(), |m| format!("{m:.2}"));
    let km_vs_all = summary
        .km_vs_all_pct()
        .map_or("N/A".to_string(), |p| format!("{p:+.1}%"));

    println!(
        "  {:>12} {:>12} {:>10} {:>12} {:>12} {:>12}",
        "Mean(Comp)", "Mean(All)", "All/Comp", "Median(All)", "Median(KM)", "KM vs All",
    );
    println!("  {}", "-".repeat(75));
    println!(
        "  {:>12} {:>12.2} {:>10} {:>12.2} {:>12} {:>12}",
        mean_complete, summary.all_days.mean, ratio, summary.all_days.median, median_km, km_vs_all,
    );
}

pub(super) fn print_life_table(table: &LifeTable, view: RowView) {
    println!(
        "Life Table ({} subjects, {} observed, {} events, {} day bins)",
        table.total_subjects,
        table.total_observations(),
        table.total_events(),
        table.bins.len()
    );
    println!(
        "  {:>8} {:>10} {:>8} {:>8} {:>10}",
        "Day", "At risk", "Obs", "Events", "In bin"
    );
    println!("  {}", "-".repeat(48));

    // `num_obs - events`; differs from the curve's censored count when the
    // population includes subjects absent from the log
    let print_row = |bin: &DayBin| {
        println!(
            "  {:>8} {:>10} {:>8} {:>8} {:>10}",
            bin.day,
            bin.at_risk,
            bin.num_obs,
            bin.events,
            bin.censored_in_bin()
        );
    };
    let (head, omitted, tail) = view.row_counts(table.bins.len());
    table.head(head).iter().for_each(print_row);
    print_omitted(omitted);
    table.tail(tail).iter().for_each(print_row);
}

pub(super) fn print_curve(curve: &SurvivalCurve, view: RowView, precision: usize) {
    println!("Survival Curve ({} event days)", curve.points.len());
    println!(
        "  {:>8} {:>10} {:>8} {:>8} {:>10} {:>12} {:>12} {:>12}",
        "Day", "At risk", "Obs", "Events", "Censored", "S(t)", "Conv%", "H(t)"
    );
    println!("  {}", "-".repeat(88));

    let print_row = |p: &CurvePoint| {
        println!(
            "  {:>8} {:>10} {:>8} {:>8} {:>10} {:>12.precision$} {:>12.precision$} \
             {:>12.precision$}",
            p.duration_days,
            p.at_risk,
            p.num_obs,
            p.events,
            p.censored,
            p.survival_proba,
            p.conversion_pct,
            p.cumulative_hazard,
        );
    };
    let (head, omitted, tail) = view.row_counts(curve.points.len());
    curve.head(head).iter().for_each(print_row);
    print_omitted(omitted);
    curve.tail(tail).iter().for_each(print_row);
}

pub(super) fn print_step_values(curve: &SurvivalCurve, days: &[u64], precision: usize) {
    println!("Curve at selected days");
    println!("  {:>8} {:>12} {:>12}", "Day", "S(t)", "H(t)");
    println!("  {}", "-".repeat(34));
    for &day in days {
        println!(
            "  {:>8} {:>12.precision$} {:>12.precision$}",
            day,
            curve.survival_at(day),
            curve.cumulative_hazard_at(day),
        );
    }
}
