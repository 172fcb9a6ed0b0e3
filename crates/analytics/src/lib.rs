//! # Analytics Engine
//!
//! Computes the four DevOps performance metrics (deployment frequency, change
//! failure rate, lead time for changes, mean time to restore) and rates each
//! one Elite, High, Medium, Low or None.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no knowledge of where events come from. It
//!   depends only on `core-types`.
//! - **Stateless calculation:** `MetricsEngine` takes event lists and returns
//!   numbers. Absent input is `None` and comes back as `NO_DATA` (`-1`)
//!   rather than an error.
//!
//! ## Public API
//!
//! - `MetricsEngine`: the reducers and rating functions.
//! - `MetricInput`: the event list handed to `MetricsEngine::report`.
//! - `MetricReport`: one computed metric, ready to print or serialize, with
//!   the `ReportEvents` it was computed from.
//! - `AnalyticsError`: the errors this crate returns.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::{MetricInput, MetricsEngine, NO_DATA};
pub use error::AnalyticsError;
pub use report::{MetricReport, ReportEvents};
