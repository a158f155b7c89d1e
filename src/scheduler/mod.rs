//! Greedy forecasting and load figures.
//!
//! `FirstFitScheduler` projects queued work onto printer lanes with a
//! first-fit, single-pass heuristic. It is a display forecast: it never
//! balances load and never influences what printers actually do.
//!
//! `ForecastSummary` reports per-lane busy time and utilization over a
//! time window.

mod first_fit;
mod summary;

pub use first_fit::{FirstFitScheduler, Forecast, DEFAULT_DURATION_MS};
pub use summary::ForecastSummary;
