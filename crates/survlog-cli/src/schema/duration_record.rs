use std::{collections::BTreeSet, num::NonZeroU64};

use chrono::{DateTime, Utc};
use serde::Serialize;
use survlog_analysis::duration::{DurationTable, SubjectDuration};

/// Duration table as written by the `durations` command.
#[derive(Debug, Clone, Serialize)]
pub struct DurationTableRecord {
    /// Latest timestamp in the event log, used for censored subjects
    pub censoring_time: Option<DateTime<Utc>>,
    /// Event types counted as endpoints
    pub endpoint_types: BTreeSet<String>,
    /// One record per subject
    pub durations: Vec<DurationRecord>,
}

/// Per-subject duration record.
#[derive(Debug, Clone, Serialize)]
pub struct DurationRecord {
    pub subject: String,
    pub entry_time: DateTime<Utc>,
    /// Endpoint event type reached, if any
    pub endpoint: Option<String>,
    pub endpoint_time: Option<DateTime<Utc>>,
    pub final_observation_time: DateTime<Utc>,
    pub endpoint_observed: bool,
    /// Duration in fractional days
    pub duration_days: f64,
    /// Duration rounded up to whole days
    pub day_bin: u64,
}

impl DurationRecord {
    pub fn from_duration(
        duration: &SubjectDuration<String>,
        seconds_per_day: NonZeroU64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            subject: duration.subject.clone(),
            entry_time: duration.entry_time,
            endpoint: duration.endpoint.as_ref().map(|e| e.event_type.clone()),
            endpoint_time: duration.endpoint_time(),
            final_observation_time: duration.final_observation_time,
            endpoint_observed: duration.endpoint_observed(),
            duration_days: duration.duration_days(seconds_per_day),
            day_bin: duration.day_bin(seconds_per_day)?,
        })
    }
}

impl DurationTableRecord {
    pub fn from_table(
        table: &DurationTable<String>,
        endpoint_types: BTreeSet<String>,
        seconds_per_day: NonZeroU64,
    ) -> anyhow::Result<Self> {
        let durations = table
            .records
            .iter()
            .map(|d| DurationRecord::from_duration(d, seconds_per_day))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            censoring_time: table.censoring_time(),
            endpoint_types,
            durations,
        })
    }
}
