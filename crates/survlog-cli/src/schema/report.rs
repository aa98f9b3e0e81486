use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use survlog_stats::{life_table::DayBin, survival::CurvePoint};

/// Survival analysis result as written by `survival --json-output`.
#[derive(Debug, Clone, Serialize)]
pub struct SurvivalReport {
    /// Timestamp when the report was generated
    pub generated_at: DateTime<Utc>,
    /// Event types counted as endpoints
    pub endpoint_types: BTreeSet<String>,
    /// Population the at-risk counts are measured against
    pub total_subjects: usize,
    /// Latest timestamp in the event log
    pub censoring_time: Option<DateTime<Utc>>,
    /// Every day bin, including days without events
    pub life_table: Vec<DayBin>,
    /// Days with at least one endpoint event
    pub curve: Vec<CurvePoint>,
}
