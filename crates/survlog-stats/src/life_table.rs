//! Day-granularity life tables
//!
//! A life table groups subjects by the whole number of days they were
//! observed and tracks how many subjects remain at risk when each day bin is
//! reached.
//!
//! ```text
//! day  num_obs  events  at_risk
//!   1        1       1        4   <- everyone is at risk at the first bin
//!   2        1       1        3
//!   3        2       0        2   <- both remaining subjects are censored here
//! ```
//!
//! `at_risk` for a bin is the total population minus the observations tallied
//! in all earlier bins (an exclusive prefix sum), so it never increases from
//! one bin to the next.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Accounting failures detected while building a [`LifeTable`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum LifeTableError {
    #[display(
        "no subjects remain at risk at day {day}: {prior_count} of {total_subjects} subjects were already tallied"
    )]
    NonPositiveAtRisk {
        day: u64,
        total_subjects: usize,
        prior_count: usize,
    },
    #[display("day {day} tallies {num_obs} observations but only {at_risk} subjects are at risk")]
    ObservationsExceedAtRisk {
        day: u64,
        num_obs: usize,
        at_risk: usize,
    },
}

/// One row of a life table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBin {
    /// Whole number of days observed (durations are rounded up).
    pub day: u64,
    /// Number of subjects whose observation ended in this bin.
    pub num_obs: usize,
    /// Number of those subjects that reached the endpoint.
    pub events: usize,
    /// Number of subjects still under observation when this bin is reached.
    pub at_risk: usize,
}

impl DayBin {
    /// Subjects in this bin that left observation without the endpoint.
    ///
    /// Unlike [`CurvePoint::censored`](crate::survival::CurvePoint::censored),
    /// this ignores population members that never appear in any bin.
    #[must_use]
    pub fn censored_in_bin(&self) -> usize {
        self.num_obs - self.events
    }
}

/// Per-day tabulation of observations, events, and at-risk counts.
///
/// Bins are stored in strictly increasing `day` order and only exist for days
/// on which at least one subject's observation ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeTable {
    /// Population the at-risk counts are measured against.
    pub total_subjects: usize,
    /// Day bins in ascending order.
    pub bins: Vec<DayBin>,
}

impl LifeTable {
    /// Builds a life table from per-subject observations.
    ///
    /// # Arguments
    ///
    /// * `observations` - `(day, endpoint_observed)` pairs, one per subject, in any order
    /// * `total_subjects` - Population size used for the at-risk counts.
    ///   Normally the number of observations; callers may supply it to avoid
    ///   recounting.
    ///
    /// # Errors
    ///
    /// Returns an error if the observations tallied so far exhaust the
    /// population before a bin is reached, or if a bin holds more
    /// observations than there are subjects at risk. Both indicate that
    /// `total_subjects` is inconsistent with the observations.
    ///
    /// # Examples
    ///
    /// ```
    /// use survlog_stats::life_table::LifeTable;
    ///
    /// let table = LifeTable::from_observations([(1, true)], 1).unwrap();
    /// assert_eq!(table.bins[0].at_risk, 1);
    ///
    /// // More subjects than the declared population
    /// assert!(LifeTable::from_observations([(1, true), (2, false)], 1).is_err());
    /// ```
    pub fn from_observations<I>(
        observations: I,
        total_subjects: usize,
    ) -> Result<Self, LifeTableError>
    where
        I: IntoIterator<Item = (u64, bool)>,
    {
        // day -> (num_obs, events)
        let mut grouped = BTreeMap::<u64, (usize, usize)>::new();
        for (day, observed) in observations {
            let (num_obs, events) = grouped.entry(day).or_default();
            *num_obs += 1;
            if observed {
                *events += 1;
            }
        }

        let mut bins = Vec::with_capacity(grouped.len());
        let mut prior_count = 0;
        for (day, (num_obs, events)) in grouped {
            let at_risk = total_subjects
                .checked_sub(prior_count)
                .filter(|at_risk| *at_risk > 0)
                .ok_or(LifeTableError::NonPositiveAtRisk {
                    day,
                    total_subjects,
                    prior_count,
                })?;
            if num_obs > at_risk {
                return Err(LifeTableError::ObservationsExceedAtRisk {
                    day,
                    num_obs,
                    at_risk,
                });
            }

            bins.push(DayBin {
                day,
                num_obs,
                events,
                at_risk,
            });
            prior_count += num_obs;
        }

        tracing::debug!(
            total_subjects,
            bins = bins.len(),
            tallied = prior_count,
            "life table built"
        );

        Ok(Self {
            total_subjects,
            bins,
        })
    }

    /// Returns `true` if no subject was tallied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Total number of endpoint events across all bins.
    #[must_use]
    pub fn total_events(&self) -> usize {
        self.bins.iter().map(|bin| bin.events).sum()
    }

    /// Total number of observations across all bins.
    #[must_use]
    pub fn total_observations(&self) -> usize {
        self.bins.iter().map(|bin| bin.num_obs).sum()
    }

    /// The earliest `n` bins.
    #[must_use]
    pub fn head(&self, n: usize) -> &[DayBin] {
        &self.bins[..n.min(self.bins.len())]
    }

    /// The latest `n` bins.
    #[must_use]
    pub fn tail(&self, n: usize) -> &[DayBin] {
        &self.bins[self.bins.len().saturating_sub(n)..]
    }
}
