use serde::{Deserialize, Serialize};

use crate::life_table::{LifeTable, LifeTableError};

/// Failures detected while estimating a [`SurvivalCurve`] from a life table.
///
/// Apart from [`EstimatorError::LifeTable`], all of these mean the life
/// table's at-risk accounting is inconsistent. A table produced by
/// [`LifeTable::from_observations`] never triggers them.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum EstimatorError {
    #[display("no subjects at risk at day {day}")]
    NonPositiveAtRisk { day: u64 },
    #[display("day {day} has {events} events but only {at_risk} subjects at risk")]
    EventsExceedAtRisk {
        day: u64,
        events: usize,
        at_risk: usize,
    },
    #[display(
        "at-risk count after day {day} ({next_at_risk}) exceeds the {at_risk} at risk minus {events} events"
    )]
    InconsistentAtRisk {
        day: u64,
        at_risk: usize,
        events: usize,
        next_at_risk: usize,
    },
    #[display("life table days are not strictly increasing at day {day}")]
    UnorderedBins { day: u64 },
    #[display("{_0}")]
    #[from]
    LifeTable(LifeTableError),
}

/// A reported point of a survival curve.
///
/// One point exists for every life-table bin with at least one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Whole number of days since entry.
    pub duration_days: u64,
    /// Number of subjects at risk when this day is reached.
    pub at_risk: usize,
    /// Number of subjects whose observation ended on this day.
    pub num_obs: usize,
    /// Number of subjects that reached the endpoint on this day.
    pub events: usize,
    /// Subjects that left observation on this day without the endpoint and
    /// are not at risk on the next tabulated day.
    pub censored: usize,
    /// Kaplan-Meier estimate of surviving past this day.
    pub survival_proba: f64,
    /// `100 * (1 - survival_proba)`.
    pub conversion_pct: f64,
    /// Nelson-Aalen cumulative hazard up to and including this day.
    pub cumulative_hazard: f64,
}

/// Kaplan-Meier survival and Nelson-Aalen cumulative hazard curve.
///
/// The Kaplan-Meier estimator is the running product of per-day survival
/// fractions `1 - events / at_risk`. It is evaluated as the exponential of a
/// running sum of logarithms so that long curves of factors close to 1 do not
/// lose precision. The Nelson-Aalen estimator is the running sum of the
/// per-day hazards `events / at_risk`.
///
/// Zero-event days take part in the running sums and in the censoring
/// bookkeeping but are not reported as points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurvivalCurve {
    /// Reported points in ascending day order.
    pub points: Vec<CurvePoint>,
}

impl SurvivalCurve {
    /// Estimates the survival curve from a life table.
    ///
    /// The life table is consumed in day order with a one-bin lookahead: the
    /// number censored at a day is the drop in the at-risk count to the next
    /// tabulated day that is not explained by events. After the last bin
    /// nobody remains at risk.
    ///
    /// # Errors
    ///
    /// Returns an error if a bin has no subjects at risk, more events than
    /// subjects at risk, or an at-risk count that does not decrease by at
    /// least its events before the next bin.
    ///
    /// # Examples
    ///
    /// ```
    /// # use survlog_stats::{life_table::LifeTable, survival::SurvivalCurve};
    /// let table = LifeTable::from_observations([(1, true)], 1).unwrap();
    /// let curve = SurvivalCurve::from_life_table(&table).unwrap();
    ///
    /// assert_eq!(curve.points[0].survival_proba, 0.0);
    /// assert_eq!(curve.points[0].cumulative_hazard, 1.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn from_life_table(table: &LifeTable) -> Result<Self, EstimatorError> {
        let mut points = vec![];
        let mut log_survival = 0.0_f64;
        let mut cumulative_hazard = 0.0_f64;

        let mut bins = table.bins.iter().peekable();
        while let Some(bin) = bins.next() {
            let day = bin.day;
            if bin.at_risk == 0 {
                return Err(EstimatorError::NonPositiveAtRisk { day });
            }
            if bin.events > bin.at_risk {
                return Err(EstimatorError::EventsExceedAtRisk {
                    day,
                    events: bin.events,
                    at_risk: bin.at_risk,
                });
            }

            let next_at_risk = match bins.peek() {
                Some(next) if next.day <= day => {
                    return Err(EstimatorError::UnorderedBins { day: next.day });
                }
                Some(next) => next.at_risk,
                None => 0,
            };
            let censored = (bin.at_risk - bin.events)
                .checked_sub(next_at_risk)
                .ok_or(EstimatorError::InconsistentAtRisk {
                    day,
                    at_risk: bin.at_risk,
                    events: bin.events,
                    next_at_risk,
                })?;

            let hazard = bin.events as f64 / bin.at_risk as f64;
            cumulative_hazard += hazard;
            // ln(1 - hazard); -inf once every subject at risk has the event
            log_survival += (-hazard).ln_1p();

            if bin.events == 0 {
                continue;
            }

            let survival_proba = log_survival.exp();
            points.push(CurvePoint {
                duration_days: day,
                at_risk: bin.at_risk,
                num_obs: bin.num_obs,
                events: bin.events,
                censored,
                survival_proba,
                conversion_pct: 100.0 * (1.0 - survival_proba),
                cumulative_hazard,
            });
        }

        tracing::debug!(
            bins = table.bins.len(),
            points = points.len(),
            "survival curve estimated"
        );

        Ok(Self { points })
    }

    /// Builds a life table from `(day, endpoint_observed)` pairs and estimates
    /// its curve, using the number of pairs as the population.
    ///
    /// # Examples
    ///
    /// ```
    /// # use survlog_stats::survival::SurvivalCurve;
    /// let data = vec![
    ///     (10, true),  // Endpoint reached on day 10
    ///     (20, false), // Censored on day 20
    ///     (30, true),  // Endpoint reached on day 30
    /// ];
    /// let curve = SurvivalCurve::from_observations(data).unwrap();
    /// assert_eq!(curve.points.len(), 2);
    /// ```
    pub fn from_observations(observations: Vec<(u64, bool)>) -> Result<Self, EstimatorError> {
        let total = observations.len();
        let table = LifeTable::from_observations(observations, total)?;
        Self::from_life_table(&table)
    }

    /// Returns `true` if no endpoint event was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The earliest `n` reported days.
    #[must_use]
    pub fn head(&self, n: usize) -> &[CurvePoint] {
        &self.points[..n.min(self.points.len())]
    }

    /// The latest `n` reported days.
    #[must_use]
    pub fn tail(&self, n: usize) -> &[CurvePoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }

    /// Returns the median survival time in days.
    ///
    /// The median is the day on which the survival probability drops to or
    /// below 50%, linearly interpolated between the surrounding event days.
    ///
    /// # Returns
    ///
    /// * `Some(days)` - If the survival probability reaches 50%
    /// * `None` - If it never does, or the curve is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use survlog_stats::survival::SurvivalCurve;
    /// let data = vec![(10, true), (20, true), (30, true)];
    /// let curve = SurvivalCurve::from_observations(data).unwrap();
    /// let median = curve.median_survival().unwrap();
    /// assert!(median > 10.0 && median <= 20.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn median_survival(&self) -> Option<f64> {
        let i = self
            .points
            .iter()
            .position(|point| point.survival_proba <= 0.5)?;
        if i == 0 {
            return Some(self.points[0].duration_days as f64);
        }

        let prev = &self.points[i - 1];
        let curr = &self.points[i];
        let t0 = prev.duration_days as f64;
        let t1 = curr.duration_days as f64;
        let s0 = prev.survival_proba;
        let s1 = curr.survival_proba;
        Some(t0 + (0.5 - s0) / (s1 - s0) * (t1 - t0))
    }

    /// Returns the survival probability at a specific day.
    ///
    /// The curve is a step function: `1.0` before the first event day and the
    /// last reported value after the last one.
    ///
    /// # Examples
    ///
    /// ```
    /// # use survlog_stats::survival::SurvivalCurve;
    /// let curve = SurvivalCurve::from_observations(vec![(10, true), (20, true)]).unwrap();
    ///
    /// assert_eq!(curve.survival_at(5), 1.0); // Before first event
    /// assert!((curve.survival_at(15) - 0.5).abs() < 1e-12); // After first event
    /// ```
    #[must_use]
    pub fn survival_at(&self, day: u64) -> f64 {
        self.point_at(day)
            .map_or(1.0, |point| point.survival_proba)
    }

    /// Returns the cumulative hazard at a specific day (`0.0` before the first
    /// event day).
    #[must_use]
    pub fn cumulative_hazard_at(&self, day: u64) -> f64 {
        self.point_at(day)
            .map_or(0.0, |point| point.cumulative_hazard)
    }

    fn point_at(&self, day: u64) -> Option<&CurvePoint> {
        let idx = self
            .points
            .partition_point(|point| point.duration_days <= day);
        idx.checked_sub(1).map(|i| &self.points[i])
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::life_table::DayBin;

    fn scenario_table() -> LifeTable {
        LifeTable::from_observations([(1, true), (2, true), (3, false), (3, false)], 4).unwrap()
    }

    #[test]
    fn test_scenario_curve() {
        let curve = SurvivalCurve::from_life_table(&scenario_table()).unwrap();
        assert_eq!(curve.points.len(), 2);

        let day1 = &curve.points[0];
        assert_eq!(day1.duration_days, 1);
        assert_eq!(day1.at_risk, 4);
        assert_eq!(day1.censored, 0);
        assert_abs_diff_eq!(day1.cumulative_hazard, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(day1.survival_proba, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(day1.conversion_pct, 25.0, epsilon = 1e-9);

        let day2 = &curve.points[1];
        assert_eq!(day2.duration_days, 2);
        assert_eq!(day2.at_risk, 3);
        assert_eq!(day2.censored, 0);
        assert_abs_diff_eq!(day2.cumulative_hazard, 0.25 + 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(day2.survival_proba, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_table() {
        let curve = SurvivalCurve::from_life_table(&LifeTable::default()).unwrap();
        assert!(curve.is_empty());
        assert_eq!(curve.median_survival(), None);
        assert_eq!(curve.survival_at(10), 1.0);
    }

    #[test]
    fn test_single_subject_drives_survival_to_zero() {
        let table = LifeTable::from_observations([(1, true)], 1).unwrap();
        let curve = SurvivalCurve::from_life_table(&table).unwrap();
        let point = &curve.points[0];
        assert_eq!(point.survival_proba, 0.0);
        assert_eq!(point.cumulative_hazard, 1.0);
        assert_eq!(point.conversion_pct, 100.0);
        assert_eq!(point.censored, 0);
    }

    #[test]
    fn test_population_conservation() {
        let observations = [
            (0, false),
            (1, true),
            (1, false),
            (2, false),
            (3, true),
            (3, true),
            (5, false),
            (6, true),
            (8, false),
            (8, false),
        ];
        let table = LifeTable::from_observations(observations, observations.len()).unwrap();
        let curve = SurvivalCurve::from_life_table(&table).unwrap();

        for point in &curve.points {
            let idx = table
                .bins
                .iter()
                .position(|bin| bin.day == point.duration_days)
                .unwrap();
            let next_at_risk = table.bins.get(idx + 1).map_or(0, |bin| bin.at_risk);
            assert_eq!(point.at_risk, next_at_risk + point.events + point.censored);
        }
    }

    #[test]
    fn test_censored_counts_zero_event_bins_ahead() {
        // day 1: 1 event; day 2: 1 censored (not reported); day 4: 1 event, 1 censored
        let table =
            LifeTable::from_observations([(1, true), (2, false), (4, true), (4, false)], 4)
                .unwrap();
        let curve = SurvivalCurve::from_life_table(&table).unwrap();
        assert_eq!(curve.points.len(), 2);
        // next tabulated bin (day 2) still has 3 at risk
        assert_eq!(curve.points[0].censored, 0);
        assert_eq!(curve.points[1].censored, 1);
        assert_abs_diff_eq!(curve.points[1].survival_proba, 0.75 * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_monotonicity_and_bounds() {
        let observations: Vec<(u64, bool)> =
            (0..200_u64).map(|i| (i * 7 % 60, i % 3 != 0)).collect();
        let curve = SurvivalCurve::from_observations(observations).unwrap();

        assert!(!curve.is_empty());
        for w in curve.points.windows(2) {
            assert!(w[0].duration_days < w[1].duration_days);
            assert!(w[1].survival_proba <= w[0].survival_proba);
            assert!(w[1].cumulative_hazard >= w[0].cumulative_hazard);
        }
        for point in &curve.points {
            assert!(point.survival_proba > 0.0 || point.at_risk == point.events);
            assert!(point.survival_proba <= 1.0);
            assert!(point.cumulative_hazard >= 0.0);
            assert!((0.0..=100.0).contains(&point.conversion_pct));
            assert_eq!(point.conversion_pct, 100.0 * (1.0 - point.survival_proba));
        }
    }

    #[test]
    #[expect(clippy::cast_precision_loss)]
    fn test_no_censoring_matches_empirical_fraction() {
        let observations = vec![(1, true), (2, true), (2, true), (3, true), (5, true)];
        let total = observations.len();
        let curve = SurvivalCurve::from_observations(observations.clone()).unwrap();

        for point in &curve.points {
            let remaining = observations
                .iter()
                .filter(|(day, _)| *day > point.duration_days)
                .count();
            assert_abs_diff_eq!(
                point.survival_proba,
                remaining as f64 / total as f64,
                epsilon = 1e-12
            );
        }
        assert_eq!(curve.points.last().unwrap().survival_proba, 0.0);
    }

    #[test]
    fn test_log_space_product_is_stable() {
        // 10_000 bins each with one event out of a large population
        let total = 1_000_000;
        let observations = (1..=10_000)
            .map(|day| (day, true))
            .chain((0..total - 10_000).map(|_| (20_000, false)));
        let table = LifeTable::from_observations(observations, total).unwrap();
        let curve = SurvivalCurve::from_life_table(&table).unwrap();

        // Without censoring before day 10_000 the estimate is exact
        let last = curve.points.last().unwrap();
        assert_eq!(last.duration_days, 10_000);
        assert_abs_diff_eq!(last.survival_proba, 0.99, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_events_exceeding_at_risk() {
        let table = LifeTable {
            total_subjects: 2,
            bins: vec![DayBin {
                day: 1,
                num_obs: 3,
                events: 3,
                at_risk: 2,
            }],
        };
        assert_eq!(
            SurvivalCurve::from_life_table(&table).unwrap_err(),
            EstimatorError::EventsExceedAtRisk {
                day: 1,
                events: 3,
                at_risk: 2
            }
        );
    }

    #[test]
    fn test_rejects_zero_at_risk() {
        let table = LifeTable {
            total_subjects: 1,
            bins: vec![
                DayBin {
                    day: 1,
                    num_obs: 1,
                    events: 1,
                    at_risk: 1,
                },
                DayBin {
                    day: 2,
                    num_obs: 1,
                    events: 0,
                    at_risk: 0,
                },
            ],
        };
        assert_eq!(
            SurvivalCurve::from_life_table(&table).unwrap_err(),
            EstimatorError::NonPositiveAtRisk { day: 2 }
        );
    }

    #[test]
    fn test_rejects_increasing_at_risk() {
        let table = LifeTable {
            total_subjects: 3,
            bins: vec![
                DayBin {
                    day: 1,
                    num_obs: 1,
                    events: 1,
                    at_risk: 3,
                },
                DayBin {
                    day: 2,
                    num_obs: 2,
                    events: 0,
                    at_risk: 4,
                },
            ],
        };
        assert!(matches!(
            SurvivalCurve::from_life_table(&table).unwrap_err(),
            EstimatorError::InconsistentAtRisk { day: 1, .. }
        ));
    }

    #[test]
    fn test_rejects_unordered_bins() {
        let table = LifeTable {
            total_subjects: 2,
            bins: vec![
                DayBin {
                    day: 2,
                    num_obs: 1,
                    events: 1,
                    at_risk: 2,
                },
                DayBin {
                    day: 1,
                    num_obs: 1,
                    events: 1,
                    at_risk: 1,
                },
            ],
        };
        assert_eq!(
            SurvivalCurve::from_life_table(&table).unwrap_err(),
            EstimatorError::UnorderedBins { day: 1 }
        );
    }

    #[test]
    fn test_censored_differs_from_in_bin_count_with_larger_population() {
        let table = LifeTable::from_observations([(1, true), (1, false), (2, true)], 5).unwrap();
        let curve = SurvivalCurve::from_life_table(&table).unwrap();

        assert_eq!(table.bins[0].censored_in_bin(), 1);
        assert_eq!(curve.points[0].censored, 1);
        // the two subjects never tallied leave with the last bin
        assert_eq!(table.bins[1].censored_in_bin(), 0);
        assert_eq!(curve.points[1].censored, 2);
    }

    #[test]
    fn test_life_table_error_converts() {
        let err = EstimatorError::from(LifeTableError::ObservationsExceedAtRisk {
            day: 4,
            num_obs: 3,
            at_risk: 2,
        });
        assert!(matches!(
            err,
            EstimatorError::LifeTable(LifeTableError::ObservationsExceedAtRisk { day: 4, .. })
        ));
        assert_eq!(
            err.to_string(),
            "day 4 tallies 3 observations but only 2 subjects are at risk"
        );
    }

    #[test]
    fn test_head_and_tail() {
        let curve =
            SurvivalCurve::from_observations(vec![(1, true), (2, true), (3, true), (4, false)])
                .unwrap();
        assert_eq!(curve.head(2).len(), 2);
        assert_eq!(curve.head(2)[0].duration_days, 1);
        assert_eq!(curve.tail(1)[0].duration_days, 3);
        assert_eq!(curve.head(10).len(), 3);
        assert_eq!(curve.tail(10).len(), 3);
        assert!(curve.tail(0).is_empty());
    }

    #[test]
    fn test_median_and_step_lookup() {
        let curve =
            SurvivalCurve::from_observations(vec![(10, true), (20, true), (30, true)]).unwrap();
        assert_abs_diff_eq!(curve.median_survival().unwrap(), 15.0, epsilon = 1e-9);

        let curve = SurvivalCurve::from_life_table(&scenario_table()).unwrap();
        assert_eq!(curve.survival_at(0), 1.0);
        assert_abs_diff_eq!(curve.survival_at(1), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.survival_at(100), 0.5, epsilon = 1e-12);
        assert_eq!(curve.cumulative_hazard_at(0), 0.0);
        assert_abs_diff_eq!(curve.cumulative_hazard_at(1), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_median_never_reached() {
        let curve =
            SurvivalCurve::from_observations(vec![(1, true), (5, false), (5, false)]).unwrap();
        assert_eq!(curve.median_survival(), None);
    }
}
