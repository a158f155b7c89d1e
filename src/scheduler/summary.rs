//! Forecast load figures.
//!
//! Summarizes how much of a time window each printer is projected to be
//! busy, for lane headers and the calendar footer.
//!
//! | Figure | Definition |
//! |--------|-----------|
//! | Finish | Latest projected end across all lanes |
//! | Busy | Sum of event durations per lane |
//! | Utilization | Busy time inside `[window_start, window_end)` / window length |
//!
//! Per-lane figures are indexed like `Forecast::lanes`, so peers that share
//! an address still get one entry each.

use super::Forecast;

/// Load figures for one forecast.
///
/// All times are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSummary {
    /// Latest projected end (epoch ms), `None` without events.
    pub finish_ms: Option<i64>,
    /// Number of events.
    pub event_count: usize,
    /// Number of events whose work-unit is printing now.
    pub active_count: usize,
    /// Number of pending work-units with no compatible printer.
    pub unscheduled_count: usize,
    /// Total projected busy time per lane, in lane order.
    pub busy_by_lane: Vec<i64>,
    /// Share of the window each lane is busy (0.0..1.0), in lane order.
    pub utilization_by_lane: Vec<f64>,
    /// Mean utilization across lanes (0.0 without lanes).
    pub avg_utilization: f64,
}

impl ForecastSummary {
    /// Computes load figures over `[window_start_ms, window_end_ms)`.
    ///
    /// A non-positive window yields zero utilization everywhere.
    pub fn calculate(forecast: &Forecast, window_start_ms: i64, window_end_ms: i64) -> Self {
        let window_ms = window_end_ms.saturating_sub(window_start_ms);

        let mut busy_by_lane = Vec::with_capacity(forecast.lanes.len());
        let mut utilization_by_lane = Vec::with_capacity(forecast.lanes.len());

        for lane in &forecast.lanes {
            busy_by_lane.push(lane.busy_ms());

            let utilization = if window_ms > 0 {
                let inside: i64 = lane
                    .events
                    .iter()
                    .map(|e| {
                        let start = e.start_ms.max(window_start_ms);
                        let end = e.end_ms.min(window_end_ms);
                        (end - start).max(0)
                    })
                    .sum();
                inside as f64 / window_ms as f64
            } else {
                0.0
            };
            utilization_by_lane.push(utilization);
        }

        let avg_utilization = if utilization_by_lane.is_empty() {
            0.0
        } else {
            utilization_by_lane.iter().sum::<f64>() / utilization_by_lane.len() as f64
        };

        Self {
            finish_ms: forecast.finish_ms(),
            event_count: forecast.event_count(),
            active_count: forecast.events().filter(|e| e.is_active).count(),
            unscheduled_count: forecast.unscheduled.len(),
            busy_by_lane,
            utilization_by_lane,
            avg_utilization,
        }
    }
}
