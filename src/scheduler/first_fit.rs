//! First-fit, single-pass greedy forecaster.
//!
//! # Algorithm
//!
//! 1. Build one lane per peer, in snapshot order. Every lane starts free at `now`.
//! 2. Walk jobs in queue order and, within each job, its work-units in order.
//! 3. Skip work-units with nothing remaining.
//! 4. Estimate the duration from metadata, else use the default (1 h).
//! 5. Place the work-unit on the **first** lane whose profile it accepts,
//!    starting where that lane's previous event ends.
//! 6. Work-units no lane accepts are reported as unscheduled.
//!
//! There is no load balancing: a later compatible lane is never considered
//! once an earlier one matches, however busy the earlier one is.
//!
//! # Complexity
//! O(u * l) where u = work-units, l = lanes.

use std::collections::HashSet;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::models::{Event, Lane, QueueSnapshot};
use crate::timeline::MS_PER_HOUR;

/// Duration assumed for work-units without a usable estimate (ms).
pub const DEFAULT_DURATION_MS: i64 = MS_PER_HOUR;

/// Output of one forecasting pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// One lane per peer, in snapshot order.
    pub lanes: Vec<Lane>,
    /// Ids of pending work-units that no lane accepts.
    pub unscheduled: Vec<String>,
    /// Instant the forecast was computed for (epoch ms).
    pub generated_at_ms: i64,
}

/// First-fit greedy forecaster.
///
/// # Example
///
/// ```
/// use print_timeline::models::{Job, Peer, QueueSnapshot, WorkUnit};
/// use print_timeline::scheduler::FirstFitScheduler;
///
/// let snapshot = QueueSnapshot::new()
///     .with_peer(Peer::new("10.0.0.1").with_profile("A"))
///     .with_peer(Peer::new("10.0.0.2").with_profile("B"))
///     .with_job(Job::new("Bracket").with_set(WorkUnit::new("s1").with_profile("B")));
///
/// let forecast = FirstFitScheduler::new().forecast(&snapshot, 0);
/// assert_eq!(forecast.lanes[1].events.len(), 1);
/// assert_eq!(forecast.lanes[1].events[0].end_ms, 3_600_000);
/// ```
#[derive(Debug, Clone)]
pub struct FirstFitScheduler {
    default_duration_ms: i64,
}

impl FirstFitScheduler {
    /// Creates a forecaster with the one-hour default estimate.
    pub fn new() -> Self {
        Self {
            default_duration_ms: DEFAULT_DURATION_MS,
        }
    }

    /// Sets the fallback estimate (ms). Non-positive values are raised to 1 ms.
    pub fn with_default_duration_ms(mut self, duration_ms: i64) -> Self {
        self.default_duration_ms = duration_ms.max(1);
        self
    }

    /// Fallback estimate (ms).
    pub fn default_duration_ms(&self) -> i64 {
        self.default_duration_ms
    }

    /// Projects the snapshot's pending work onto its peers, starting at `now_ms`.
    pub fn forecast(&self, snapshot: &QueueSnapshot, now_ms: i64) -> Forecast {
        let mut lanes: Vec<Lane> = snapshot.peers.iter().map(Lane::from_peer).collect();
        let mut unscheduled = Vec::new();
        let active: HashSet<&str> = snapshot.active_sets.iter().map(String::as_str).collect();

        for job in &snapshot.jobs {
            for set in job.pending_sets() {
                let duration_ms = set.estimated_duration_ms(self.default_duration_ms);

                let Some(lane) = lanes.iter_mut().find(|l| set.accepts_profile(&l.profile)) else {
                    debug!(
                        "no compatible printer for set '{}' of job '{}' (profiles {:?})",
                        set.id, job.name, set.profiles
                    );
                    unscheduled.push(set.id.clone());
                    continue;
                };

                let start_ms = lane.busy_until_ms().unwrap_or(now_ms);
                let end_ms = start_ms.saturating_add(duration_ms);
                trace!(
                    "set '{}' -> {} [{start_ms}, {end_ms})",
                    set.id,
                    lane.address
                );

                let event = Event::new(
                    job,
                    set,
                    lane.printer.clone(),
                    lane.address.clone(),
                    start_ms,
                    end_ms,
                )
                .with_active(active.contains(set.id.as_str()));
                lane.push_event(event);
            }
        }

        Forecast {
            lanes,
            unscheduled,
            generated_at_ms: now_ms,
        }
    }
}

impl Default for FirstFitScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecast {
    /// All events, lane by lane.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.lanes.iter().flat_map(|l| l.events.iter())
    }

    /// Total number of events.
    pub fn event_count(&self) -> usize {
        self.lanes.iter().map(Lane::event_count).sum()
    }

    /// Finds a lane by printer address.
    pub fn lane(&self, address: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.address == address)
    }

    /// Finds the event for a work-unit.
    pub fn event_for_set(&self, set_id: &str) -> Option<&Event> {
        self.events().find(|e| e.set.id == set_id)
    }

    /// Latest projected end across all lanes.
    pub fn finish_ms(&self) -> Option<i64> {
        self.lanes.iter().filter_map(Lane::busy_until_ms).max()
    }
}
