//! Censoring summary for a derived duration table
//!
//! Naive statistics over censored durations are biased: a censored subject
//! only tells us the endpoint had not happened *yet*, so averaging its
//! duration underestimates the true time to the endpoint. This summary puts
//! the naive figures next to the Kaplan-Meier median so the size of that
//! bias is visible.

use std::num::NonZeroU64;

use survlog_stats::{descriptive::DescriptiveStats, life_table::LifeTable, survival::SurvivalCurve};

use crate::duration::DurationTable;

#[derive(Debug, Clone, PartialEq)]
pub struct CensoringSummary {
    /// Number of subjects in the event log
    pub subjects: usize,
    /// Population the life table's at-risk counts start from
    ///
    /// Equal to `subjects` unless a larger population was supplied; the
    /// subjects missing from the log stay at risk until the last day bin.
    pub population: usize,
    /// Number of subjects that reached an endpoint
    pub endpoints: usize,
    /// Number of censored subjects
    pub censored: usize,
    /// Mean duration in days of subjects that reached an endpoint
    pub mean_complete_days: Option<f64>,
    /// Naive statistics over all durations in days
    pub all_days: DescriptiveStats,
    /// Kaplan-Meier median survival in days
    pub median_km_days: Option<f64>,
}

impl CensoringSummary {
    /// Summarizes a duration table with the life table and survival curve
    /// built from it.
    ///
    /// Returns `None` if the duration table is empty.
    #[must_use]
    pub fn new<S>(
        durations: &DurationTable<S>,
        life_table: &LifeTable,
        curve: &SurvivalCurve,
        seconds_per_day: NonZeroU64,
    ) -> Option<Self> {
        let all_days = DescriptiveStats::new(
            durations
                .records
                .iter()
                .map(|r| r.duration_days(seconds_per_day)),
        )?;
        let mean_complete_days = DescriptiveStats::new(
            durations
                .records
                .iter()
                .filter(|r| r.endpoint_observed())
                .map(|r| r.duration_days(seconds_per_day)),
        )
        .map(|stats| stats.mean);

        let subjects = durations.len();
        let endpoints = durations.endpoint_count();
        Some(Self {
            subjects,
            population: life_table.total_subjects,
            endpoints,
            censored: subjects - endpoints,
            mean_complete_days,
            all_days,
            median_km_days: curve.median_survival(),
        })
    }

    /// Percentage of log subjects that never reached an endpoint
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn censoring_rate(&self) -> f64 {
        100.0 * self.censored as f64 / self.subjects as f64
    }

    /// Number of subjects counted in the population but absent from the log.
    #[must_use]
    pub fn unobserved(&self) -> usize {
        self.population.saturating_sub(self.subjects)
    }

    /// Ratio of the naive mean over all subjects to the mean over complete ones.
    #[must_use]
    pub fn all_complete_ratio(&self) -> Option<f64> {
        self.mean_complete_days
            .filter(|mean| *mean > 0.0)
            .map(|mean| self.all_days.mean / mean)
    }

    /// Difference between the KM median and the naive mean as percentage
    #[must_use]
    pub fn km_vs_all_pct(&self) -> Option<f64> {
        let mean = self.all_days.mean;
        if mean.abs() < f64::EPSILON {
            return None;
        }
        self.median_km_days.map(|km| (km - mean) / mean * 100.0)
    }
}
