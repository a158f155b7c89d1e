//! Forecast event model.
//!
//! An event is one simulated occupied interval on a lane: a single
//! (job, work-unit) pair projected onto one printer. Events are produced by
//! the scheduler and never modified afterwards.

use serde::{Deserialize, Serialize};

use super::{Job, WorkUnit};

/// A projected (job, work-unit, printer) interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Originating job id.
    pub job_id: String,
    /// Originating job display name.
    pub job_name: String,
    /// Printer that has claimed the job, if any.
    pub claimed_by: Option<String>,
    /// Originating work-unit, as it was in the snapshot.
    pub set: WorkUnit,
    /// Display name of the lane's printer.
    pub printer: String,
    /// Address of the lane's printer.
    pub address: String,
    /// Projected start (epoch ms).
    pub start_ms: i64,
    /// Projected end (epoch ms). Always after `start_ms`.
    pub end_ms: i64,
    /// Whether the work-unit is physically printing right now.
    pub is_active: bool,
}

impl Event {
    /// Creates an event for `set` of `job` on the printer at `address`.
    pub fn new(
        job: &Job,
        set: &WorkUnit,
        printer: impl Into<String>,
        address: impl Into<String>,
        start_ms: i64,
        end_ms: i64,
    ) -> Self {
        debug_assert!(end_ms > start_ms, "event must have positive duration");
        Self {
            job_id: job.id.clone(),
            job_name: job.name.clone(),
            claimed_by: job.acquired_by.clone(),
            set: set.clone(),
            printer: printer.into(),
            address: address.into(),
            start_ms,
            end_ms,
            is_active: false,
        }
    }

    /// Marks the event as currently printing.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Projected duration (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Title shown on the event block (the job name).
    pub fn title(&self) -> &str {
        &self.job_name
    }

    /// Work-unit display name.
    pub fn set_name(&self) -> &str {
        self.set.display_name()
    }

    /// Work-unit completion percentage.
    pub fn progress_percent(&self) -> f64 {
        self.set.progress_percent()
    }

    /// Whether `time_ms` falls inside `[start_ms, end_ms)`.
    pub fn contains(&self, time_ms: i64) -> bool {
        self.start_ms <= time_ms && time_ms < self.end_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_704_103_200_000; // 2024-01-01T10:00:00Z

    #[test]
    fn test_event_fields() {
        let job = Job::new("Test Job").with_id("J1").with_acquired_by("Printer1");
        let set = WorkUnit::new("S1").with_short_name("test.gcode").with_counts(3, 2);
        let event = Event::new(&job, &set, "Printer1", "10.0.0.1", T0, T0 + 3_600_000);

        assert_eq!(event.title(), "Test Job");
        assert_eq!(event.set_name(), "test.gcode");
        assert_eq!(event.job_id, "J1");
        assert_eq!(event.claimed_by.as_deref(), Some("Printer1"));
        assert!(!event.is_active);
        assert_eq!(event.duration_ms(), 3_600_000);
        assert!((event.progress_percent() - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_event_active_flag() {
        let event = Event::new(&Job::new("J"), &WorkUnit::new("S"), "P", "a", 0, 10).with_active(true);
        assert!(event.is_active);
    }

    #[test]
    fn test_event_contains() {
        let event = Event::new(&Job::new("J"), &WorkUnit::new("S"), "P", "a", 100, 200);
        assert!(!event.contains(99));
        assert!(event.contains(100));
        assert!(event.contains(199));
        assert!(!event.contains(200));
    }
}
