//! Survival analysis of timestamped event logs
//!
//! This crate turns raw per-subject event histories into time-to-event
//! survival curves. The pipeline is a deterministic batch computation:
//!
//! 1. **Derive Durations** ([`duration::DurationTable`]): Reduce each subject's
//!    events to an entry time, an optional endpoint, and a duration
//! 2. **Aggregate Life Table** ([`pipeline::build_life_table`]): Round durations
//!    up to whole days and tabulate observations, events, and subjects at risk
//! 3. **Estimate Curve** ([`survlog_stats::survival::SurvivalCurve`]): Compute
//!    Kaplan-Meier survival and Nelson-Aalen cumulative hazard per day
//!
//! [`pipeline::SurvivalAnalysis::run`] performs all three stages, and
//! [`summary::CensoringSummary`] contrasts naive duration statistics with the
//! Kaplan-Meier median.
//!
//! # Censoring
//!
//! Subjects that never reach an endpoint event are observed until the latest
//! timestamp in the whole log (the censoring time):
//!
//! ```text
//! Endpoint:  |----x      (converted after 3 days)
//! Censored:  |-------->  (no conversion by the end of the log)
//! ```
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone as _, Utc};
//! use survlog_analysis::{config::AnalysisConfig, event::Event, pipeline::SurvivalAnalysis};
//!
//! let day = |d: i64| Utc.timestamp_opt(d * 86_400, 0).unwrap();
//! let events = vec![
//!     Event::new("alice", "view", day(0)),
//!     Event::new("alice", "transaction", day(1)),
//!     Event::new("bob", "view", day(0)),
//!     Event::new("bob", "view", day(2)),
//! ];
//!
//! let analysis = SurvivalAnalysis::run(&events, &AnalysisConfig::default()).unwrap();
//! assert_eq!(analysis.durations.len(), 2);
//! assert_eq!(analysis.curve.points.len(), 1);
//! assert!((analysis.curve.points[0].survival_proba - 0.5).abs() < 1e-12);
//! ```

pub mod config;
pub mod duration;
pub mod event;
pub mod pipeline;
pub mod summary;
