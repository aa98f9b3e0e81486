//! Life tables and non-parametric survival estimators for survlog.
//!
//! This crate holds the numerical core of the survival pipeline and performs
//! no I/O:
//!
//! - **Life tables**: Group `(day, endpoint_observed)` observations into whole-day
//!   bins with per-bin observation, event, and at-risk counts
//! - **Survival curves**: Kaplan-Meier survival probability and Nelson-Aalen
//!   cumulative hazard computed by a single ordered pass over a life table
//! - **Descriptive statistics**: Mean, median, and spread of duration samples
//!
//! # Modules
//!
//! - [`life_table`]: Day-bin aggregation with at-risk accounting
//! - [`survival`]: Kaplan-Meier / Nelson-Aalen estimation over a life table
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//!
//! # Examples
//!
//! ## Building a life table
//!
//! ```
//! use survlog_stats::life_table::LifeTable;
//!
//! // Observations: (duration_days, endpoint_observed)
//! let observations = [(1, true), (2, true), (3, false), (3, false)];
//! let table = LifeTable::from_observations(observations, 4).unwrap();
//!
//! assert_eq!(table.bins.len(), 3);
//! assert_eq!(table.bins[0].at_risk, 4);
//! assert_eq!(table.bins[2].at_risk, 2);
//! ```
//!
//! ## Estimating a survival curve
//!
//! ```
//! use survlog_stats::{life_table::LifeTable, survival::SurvivalCurve};
//!
//! let observations = [(1, true), (2, true), (3, false), (3, false)];
//! let table = LifeTable::from_observations(observations, 4).unwrap();
//! let curve = SurvivalCurve::from_life_table(&table).unwrap();
//!
//! // Day 3 has no events, so only days 1 and 2 are reported
//! assert_eq!(curve.points.len(), 2);
//! assert!((curve.points[1].survival_proba - 0.5).abs() < 1e-12);
//! ```

pub mod descriptive;
pub mod life_table;
pub mod survival;
