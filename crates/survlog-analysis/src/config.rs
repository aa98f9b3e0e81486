//! Analysis configuration
//!
//! ```json
//! {
//!   "endpoint_types": ["transaction"],
//!   "seconds_per_day": 86400,
//!   "total_subjects": null
//! }
//! ```
//!
//! Every field is optional in the serialized form and falls back to
//! [`AnalysisConfig::default`].

use std::{collections::BTreeSet, num::NonZeroU64};

use serde::{Deserialize, Serialize};

/// Event type treated as the endpoint when none is configured.
pub const DEFAULT_ENDPOINT_TYPE: &str = "transaction";

/// Length of a day bin.
pub const SECONDS_PER_DAY: NonZeroU64 = NonZeroU64::new(24 * 3600).unwrap();

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("at least one endpoint event type must be configured")]
    EmptyEndpointTypes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Event types that mark a subject as having reached the endpoint
    pub endpoint_types: BTreeSet<String>,
    /// Divisor used to round durations up to whole days
    pub seconds_per_day: NonZeroU64,
    /// Population the at-risk counts are measured against.
    ///
    /// `None` uses the number of subjects found in the event log.
    pub total_subjects: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint_types: BTreeSet::from([DEFAULT_ENDPOINT_TYPE.to_owned()]),
            seconds_per_day: SECONDS_PER_DAY,
            total_subjects: None,
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn with_endpoint_types<I, T>(endpoint_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            endpoint_types: endpoint_types.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_endpoint(&self, event_type: &str) -> bool {
        self.endpoint_types.contains(event_type)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint_types.is_empty() {
            return Err(ConfigError::EmptyEndpointTypes);
        }
        Ok(())
    }
}
