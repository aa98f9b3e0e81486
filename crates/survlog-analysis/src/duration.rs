//! Per-subject duration derivation
//!
//! Reduces an event log to one [`SubjectDuration`] per subject:
//!
//! ```text
//! entry_time              endpoint_time (earliest endpoint event)
//!     |------------------------x                     uncensored
//!     |--------------------------------------------> censored at the
//!                                                    global censoring time
//! ```
//!
//! - `entry_time` is the subject's earliest event of any type
//! - `endpoint` is the subject's earliest event whose type is one of the
//!   configured endpoint types, if any
//! - `final_observation_time` is the endpoint time, or the latest timestamp in
//!   the whole log when the subject never reached an endpoint
//! - `duration` is `final_observation_time - entry_time`

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    num::NonZeroU64,
};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::AnalysisConfig,
    event::{Event, ObservationWindow},
};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DurationError {
    #[display(
        "subject {subject} ends observation at {final_observation_time} before its entry at {entry_time}"
    )]
    NegativeDuration {
        subject: String,
        entry_time: DateTime<Utc>,
        final_observation_time: DateTime<Utc>,
    },
    #[display("{records} duration records for {subjects} distinct subjects")]
    SubjectCountMismatch { records: usize, subjects: usize },
    #[display(
        "subject {subject} has a duration of {duration_seconds}s, longer than the {span_seconds}s event log"
    )]
    DurationExceedsSpan {
        subject: String,
        duration_seconds: i64,
        span_seconds: i64,
    },
    #[display(
        "{endpoints} subjects reached an endpoint but the log has only {endpoint_events} endpoint events"
    )]
    TooManyEndpoints {
        endpoints: usize,
        endpoint_events: usize,
    },
}

/// The earliest endpoint event reached by a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub event_type: String,
    pub time: DateTime<Utc>,
}

/// Observation span of a single subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectDuration<S> {
    pub subject: S,
    pub entry_time: DateTime<Utc>,
    /// `None` when the subject is censored.
    pub endpoint: Option<Endpoint>,
    pub final_observation_time: DateTime<Utc>,
    pub duration: TimeDelta,
}

impl<S> SubjectDuration<S>
where
    S: fmt::Debug,
{
    /// Creates a duration record, observing the subject until its endpoint or
    /// until `censoring_time` when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`DurationError::NegativeDuration`] if the final observation
    /// time is earlier than `entry_time`.
    pub fn new(
        subject: S,
        entry_time: DateTime<Utc>,
        endpoint: Option<Endpoint>,
        censoring_time: DateTime<Utc>,
    ) -> Result<Self, DurationError> {
        let final_observation_time = endpoint.as_ref().map_or(censoring_time, |e| e.time);
        let duration = final_observation_time - entry_time;
        if duration < TimeDelta::zero() {
            return Err(DurationError::NegativeDuration {
                subject: format!("{subject:?}"),
                entry_time,
                final_observation_time,
            });
        }
        Ok(Self {
            subject,
            entry_time,
            endpoint,
            final_observation_time,
            duration,
        })
    }

    /// Whole number of days containing the duration, rounding any fractional
    /// remainder up.
    ///
    /// # Errors
    ///
    /// Returns [`DurationError::NegativeDuration`] if the record was built
    /// with a negative duration.
    pub fn day_bin(&self, seconds_per_day: NonZeroU64) -> Result<u64, DurationError> {
        let seconds = u64::try_from(self.duration.num_seconds())
            .ok()
            .filter(|_| self.duration >= TimeDelta::zero())
            .ok_or_else(|| DurationError::NegativeDuration {
                subject: format!("{:?}", self.subject),
                entry_time: self.entry_time,
                final_observation_time: self.final_observation_time,
            })?;
        let has_remainder =
            seconds % seconds_per_day.get() > 0 || self.duration.subsec_nanos() > 0;
        Ok(seconds / seconds_per_day + u64::from(has_remainder))
    }
}

impl<S> SubjectDuration<S> {
    #[must_use]
    pub fn endpoint_observed(&self) -> bool {
        self.endpoint.is_some()
    }

    #[must_use]
    pub fn endpoint_time(&self) -> Option<DateTime<Utc>> {
        self.endpoint.as_ref().map(|e| e.time)
    }

    /// Duration in fractional days.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn duration_days(&self, seconds_per_day: NonZeroU64) -> f64 {
        let seconds = self.duration.num_seconds() as f64
            + f64::from(self.duration.subsec_nanos()) / 1_000_000_000.0;
        seconds / seconds_per_day.get() as f64
    }
}

/// Duration records for every subject in an event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationTable<S> {
    /// One record per distinct subject, ordered by subject.
    pub records: Vec<SubjectDuration<S>>,
    /// `None` for an empty event log.
    pub window: Option<ObservationWindow>,
    /// Number of events in the log whose type is an endpoint type.
    pub endpoint_event_count: usize,
}

impl<S> Default for DurationTable<S> {
    fn default() -> Self {
        Self {
            records: vec![],
            window: None,
            endpoint_event_count: 0,
        }
    }
}

impl<S> DurationTable<S>
where
    S: Ord + Clone + fmt::Debug,
{
    /// Derives one duration record per subject from an event log.
    ///
    /// When a subject has several endpoint events with the same earliest
    /// timestamp, the one appearing first in `events` is selected.
    ///
    /// An empty log yields an empty table.
    pub fn from_events(
        events: &[Event<S>],
        config: &AnalysisConfig,
    ) -> Result<Self, DurationError> {
        let Some(window) = ObservationWindow::of(events) else {
            tracing::debug!("empty event log, no durations derived");
            return Ok(Self::default());
        };

        let mut entry_times = BTreeMap::<&S, DateTime<Utc>>::new();
        for event in events {
            entry_times
                .entry(&event.subject)
                .and_modify(|entry| *entry = (*entry).min(event.timestamp))
                .or_insert(event.timestamp);
        }

        let mut endpoints = BTreeMap::<&S, &Event<S>>::new();
        let mut endpoint_event_count = 0;
        for event in events.iter().filter(|e| config.is_endpoint(&e.event_type)) {
            endpoint_event_count += 1;
            endpoints
                .entry(&event.subject)
                .and_modify(|earliest| {
                    if event.timestamp < earliest.timestamp {
                        *earliest = event;
                    }
                })
                .or_insert(event);
        }
        if endpoint_event_count == 0 {
            tracing::warn!(
                endpoint_types = ?config.endpoint_types,
                "no event matches the endpoint types, every subject is censored"
            );
        }

        let records = entry_times
            .into_iter()
            .map(|(subject, entry_time)| {
                let endpoint = endpoints.get(subject).map(|event| Endpoint {
                    event_type: event.event_type.clone(),
                    time: event.timestamp,
                });
                SubjectDuration::new(subject.clone(), entry_time, endpoint, window.end)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            events = events.len(),
            subjects = records.len(),
            endpoints = endpoints.len(),
            censoring_time = %window.end,
            "durations derived"
        );

        Ok(Self {
            records,
            window: Some(window),
            endpoint_event_count,
        })
    }

    /// Cross-checks the table against the event log it was derived from.
    ///
    /// - There is exactly one record per distinct subject in `events`
    /// - No duration is longer than the span of the whole log
    /// - No more subjects reached an endpoint than there are endpoint events
    pub fn check_consistency(&self, events: &[Event<S>]) -> Result<(), DurationError> {
        let subjects = events
            .iter()
            .map(|event| &event.subject)
            .collect::<BTreeSet<_>>()
            .len();
        if subjects != self.records.len() {
            return Err(DurationError::SubjectCountMismatch {
                records: self.records.len(),
                subjects,
            });
        }

        let span = ObservationWindow::of(events).map_or(TimeDelta::zero(), |w| w.span());
        if let Some(record) = self.records.iter().find(|r| r.duration > span) {
            return Err(DurationError::DurationExceedsSpan {
                subject: format!("{:?}", record.subject),
                duration_seconds: record.duration.num_seconds(),
                span_seconds: span.num_seconds(),
            });
        }

        let endpoints = self.endpoint_count();
        if endpoints > self.endpoint_event_count {
            return Err(DurationError::TooManyEndpoints {
                endpoints,
                endpoint_events: self.endpoint_event_count,
            });
        }

        Ok(())
    }
}

impl<S> DurationTable<S> {
    /// Latest timestamp in the event log.
    #[must_use]
    pub fn censoring_time(&self) -> Option<DateTime<Utc>> {
        self.window.map(|w| w.end)
    }

    /// Number of subjects that reached an endpoint.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.records.iter().filter(|r| r.endpoint_observed()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
