//! End-to-end survival analysis of an event log
//!
//! ```text
//! events -> DurationTable -> LifeTable -> SurvivalCurve
//! ```
//!
//! Each stage produces a new collection from the previous one. A failure at
//! any stage aborts the run; no partial result is returned.

use std::fmt;

use survlog_stats::{
    life_table::{LifeTable, LifeTableError},
    survival::{EstimatorError, SurvivalCurve},
};

use crate::{
    config::{AnalysisConfig, ConfigError},
    duration::{DurationError, DurationTable, SubjectDuration},
    event::Event,
    summary::CensoringSummary,
};

#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum AnalysisError {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("duration derivation failed: {_0}")]
    Duration(DurationError),
    #[display("life table aggregation failed: {_0}")]
    LifeTable(LifeTableError),
    #[display("survival estimation failed: {_0}")]
    Estimator(EstimatorError),
    #[display("event log is empty")]
    #[from(ignore)]
    EmptyEventLog,
}

/// Buckets duration records into whole-day bins.
///
/// The population is `config.total_subjects` when set, otherwise the number
/// of records.
pub fn build_life_table<S>(
    records: &[SubjectDuration<S>],
    config: &AnalysisConfig,
) -> Result<LifeTable, AnalysisError>
where
    S: fmt::Debug,
{
    let total_subjects = config.total_subjects.unwrap_or(records.len());
    let observations = records
        .iter()
        .map(|record| {
            let day = record.day_bin(config.seconds_per_day)?;
            Ok((day, record.endpoint_observed()))
        })
        .collect::<Result<Vec<_>, DurationError>>()?;
    Ok(LifeTable::from_observations(observations, total_subjects)?)
}

/// Result of every pipeline stage for one event log.
#[derive(Debug, Clone)]
pub struct SurvivalAnalysis<S> {
    pub durations: DurationTable<S>,
    pub life_table: LifeTable,
    pub curve: SurvivalCurve,
}

impl<S> SurvivalAnalysis<S>
where
    S: Ord + Clone + fmt::Debug,
{
    /// Runs the full pipeline.
    ///
    /// An empty event log produces an empty life table and curve.
    pub fn run(events: &[Event<S>], config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;

        let durations = DurationTable::from_events(events, config)?;
        let life_table = build_life_table(&durations.records, config)?;
        let curve = SurvivalCurve::from_life_table(&life_table)?;

        tracing::info!(
            subjects = durations.len(),
            endpoints = durations.endpoint_count(),
            day_bins = life_table.bins.len(),
            curve_points = curve.points.len(),
            "survival analysis complete"
        );

        Ok(Self {
            durations,
            life_table,
            curve,
        })
    }
}

impl<S> SurvivalAnalysis<S> {
    /// Summarizes censoring for the analyzed population.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::EmptyEventLog`] when there are no subjects to
    /// summarize.
    pub fn summary(&self, config: &AnalysisConfig) -> Result<CensoringSummary, AnalysisError> {
        CensoringSummary::new(
            &self.durations,
            &self.life_table,
            &self.curve,
            config.seconds_per_day,
        )
            .ok_or(AnalysisError::EmptyEventLog)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, TimeZone as _, Utc};
    use survlog_stats::life_table::DayBin;

    use super::*;

    const DAY: i64 = 86_400;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn scenario_events() -> Vec<Event> {
        vec![
            Event::new("A".to_owned(), "view", t(0)),
            Event::new("B".to_owned(), "view", t(0)),
            Event::new("C".to_owned(), "view", t(0)),
            Event::new("D".to_owned(), "view", t(0)),
            Event::new("A".to_owned(), "transaction", t(DAY)),
            Event::new("B".to_owned(), "transaction", t(2 * DAY)),
            Event::new("D".to_owned(), "addtocart", t(3 * DAY)),
        ]
    }

    #[test]
    fn test_scenario_end_to_end() {
        let analysis =
            SurvivalAnalysis::run(&scenario_events(), &AnalysisConfig::default()).unwrap();

        assert_eq!(
            analysis.life_table.bins,
            vec![
                DayBin {
                    day: 1,
                    num_obs: 1,
                    events: 1,
                    at_risk: 4
                },
                DayBin {
                    day: 2,
                    num_obs: 1,
                    events: 1,
                    at_risk: 3
                },
                DayBin {
                    day: 3,
                    num_obs: 2,
                    events: 0,
                    at_risk: 2
                },
            ]
        );

        let points = &analysis.curve.points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].censored, 0);
        assert_abs_diff_eq!(points[0].cumulative_hazard, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(points[0].survival_proba, 0.75, epsilon = 1e-12);
        assert_eq!(points[1].censored, 0);
        assert_abs_diff_eq!(points[1].cumulative_hazard - 0.25, 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(points[1].survival_proba, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_log_is_vacuous() {
        let analysis = SurvivalAnalysis::<String>::run(&[], &AnalysisConfig::default()).unwrap();
        assert!(analysis.durations.is_empty());
        assert!(analysis.life_table.is_empty());
        assert!(analysis.curve.is_empty());
        assert_eq!(
            analysis.summary(&AnalysisConfig::default()).unwrap_err(),
            AnalysisError::EmptyEventLog
        );
    }

    #[test]
    fn test_single_subject() {
        let events = vec![
            Event::new(7_u64, "view", t(0)),
            Event::new(7_u64, "transaction", t(DAY / 2)),
        ];
        let analysis = SurvivalAnalysis::run(&events, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            analysis.life_table.bins,
            vec![DayBin {
                day: 1,
                num_obs: 1,
                events: 1,
                at_risk: 1
            }]
        );
        assert_eq!(analysis.curve.points[0].survival_proba, 0.0);
        assert_eq!(analysis.curve.points[0].cumulative_hazard, 1.0);
    }

    #[test]
    fn test_supplied_population_too_small() {
        let config = AnalysisConfig {
            total_subjects: Some(3),
            ..AnalysisConfig::default()
        };
        let err = SurvivalAnalysis::run(&scenario_events(), &config).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LifeTable(LifeTableError::ObservationsExceedAtRisk { day: 3, .. })
        ));
    }

    #[test]
    fn test_supplied_population_larger_than_log() {
        let config = AnalysisConfig {
            total_subjects: Some(8),
            ..AnalysisConfig::default()
        };
        let analysis = SurvivalAnalysis::run(&scenario_events(), &config).unwrap();
        assert_eq!(analysis.life_table.bins[0].at_risk, 8);
        // the four untallied subjects are censored at the last bin
        assert_abs_diff_eq!(analysis.curve.points[0].survival_proba, 7.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_endpoint_types_rejected() {
        let config = AnalysisConfig::with_endpoint_types(Vec::<String>::new());
        assert_eq!(
            SurvivalAnalysis::run(&scenario_events(), &config).unwrap_err(),
            AnalysisError::Config(ConfigError::EmptyEndpointTypes)
        );
    }

    #[test]
    fn test_negative_record_rejected_by_aggregator() {
        let records = vec![SubjectDuration {
            subject: "late",
            entry_time: t(100),
            endpoint: None,
            final_observation_time: t(50),
            duration: t(50) - t(100),
        }];
        let err = build_life_table(&records, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Duration(DurationError::NegativeDuration { .. })
        ));
    }

    #[test]
    fn test_multiple_endpoint_types() {
        let config = AnalysisConfig::with_endpoint_types(["transaction", "addtocart"]);
        let analysis = SurvivalAnalysis::run(&scenario_events(), &config).unwrap();
        // D now reaches an endpoint on day 3, C is censored there
        let last = analysis.curve.points.last().unwrap();
        assert_eq!(last.duration_days, 3);
        assert_eq!(last.events, 1);
        assert_eq!(last.censored, 1);
    }
}
