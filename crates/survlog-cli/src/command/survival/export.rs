//! CSV and JSON export of survival results

use std::{fmt::Write as _, fs, path::Path};

use anyhow::Context;
use chrono::Utc;
use survlog_analysis::{config::AnalysisConfig, pipeline::SurvivalAnalysis};
use survlog_stats::survival::SurvivalCurve;

use crate::{schema::report::SurvivalReport, util::Output};

const CSV_HEADER: &str = concat!(
    "duration_days,at_risk,num_obs,events,censored,",
    "survival_proba,conversion_pct,cumulative_hazard"
);

fn curve_csv(curve: &SurvivalCurve) -> anyhow::Result<String> {
    let mut csv_content = format!("{CSV_HEADER}\n");
    for p in &curve.points {
        writeln!(
            &mut csv_content,
            "{},{},{},{},{},{},{},{}",
            p.duration_days,
            p.at_risk,
            p.num_obs,
            p.events,
            p.censored,
            p.survival_proba,
            p.conversion_pct,
            p.cumulative_hazard
        )
        .with_context(|| format!("Failed to write CSV row for day {}", p.duration_days))?;
    }
    Ok(csv_content)
}

/// Save the curve to a CSV file, one row per event day
pub(super) fn save_curve_csv(path: &Path, curve: &SurvivalCurve) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    fs::write(path, curve_csv(curve)?)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    println!("\nSurvival curve saved to: {}", path.display());
    Ok(())
}

pub(super) fn save_report_json(
    path: &Path,
    analysis: &SurvivalAnalysis<String>,
    config: &AnalysisConfig,
) -> anyhow::Result<()> {
    let report = SurvivalReport {
        generated_at: Utc::now(),
        endpoint_types: config.endpoint_types.clone(),
        total_subjects: analysis.life_table.total_subjects,
        censoring_time: analysis.durations.censoring_time(),
        life_table: analysis.life_table.bins.clone(),
        curve: analysis.curve.points.clone(),
    };
    Output::save_json(&report, Some(path.to_path_buf()))?;
    println!("\nSurvival report saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_curve_csv_layout() {
        let curve =
            SurvivalCurve::from_observations(vec![(1, true), (2, true), (3, false), (3, false)])
                .unwrap();
        let csv = curve_csv(&curve).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);

        let fields = lines[1].split(',').collect::<Vec<_>>();
        assert_eq!(fields.len(), 8);
        assert_eq!(&fields[..5], &["1", "4", "1", "1", "0"]);
        let survival_proba: f64 = fields[5].parse().unwrap();
        let conversion_pct: f64 = fields[6].parse().unwrap();
        let cumulative_hazard: f64 = fields[7].parse().unwrap();
        assert_abs_diff_eq!(survival_proba, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(conversion_pct, 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cumulative_hazard, 0.25, epsilon = 1e-12);

        assert!(lines[2].starts_with("2,3,1,1,0,"));
    }

    #[test]
    fn test_empty_curve_has_header_only() {
        let csv = curve_csv(&SurvivalCurve::default()).unwrap();
        assert_eq!(csv, format!("{CSV_HEADER}\n"));
    }
}
