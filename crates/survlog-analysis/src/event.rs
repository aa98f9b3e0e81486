//! Timestamped subject events
//!
//! An event log is an unordered collection of [`Event`]s. Only the relative
//! order of timestamps matters; the position of an event in the log is used
//! solely to break ties between identical timestamps.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A single immutable fact from an event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<S = String> {
    /// Identifier of the subject the event belongs to
    pub subject: S,
    /// Categorical event label (e.g. `view`, `addtocart`, `transaction`)
    pub event_type: String,
    /// Instant the event happened
    pub timestamp: DateTime<Utc>,
}

impl<S> Event<S> {
    pub fn new(subject: S, event_type: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            subject,
            event_type: event_type.into(),
            timestamp,
        }
    }
}

/// Earliest and latest timestamps across an entire event log.
///
/// The end of the window is the global censoring time: subjects that never
/// reach an endpoint are observed until then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ObservationWindow {
    /// Computes the window of an event log, or `None` if the log is empty.
    #[must_use]
    pub fn of<S>(events: &[Event<S>]) -> Option<Self> {
        let mut timestamps = events.iter().map(|event| event.timestamp);
        let first = timestamps.next()?;
        let (start, end) = timestamps.fold((first, first), |(start, end), ts| {
            (start.min(ts), end.max(ts))
        });
        Some(Self { start, end })
    }

    /// Length of the window.
    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }
}
