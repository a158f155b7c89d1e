//! Wall clock access and the periodic "now" driver.
//!
//! The calendar never sleeps or spawns: the host UI polls
//! [`ClockDriver::poll`] from its frame loop (directly or through
//! [`Calendar::tick`](crate::Calendar::tick)) and the driver reports when a
//! full interval has elapsed. Stopping the driver discards the pending
//! deadline, so a hidden calendar does no periodic work at all.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::debug;

/// Source of the current instant.
pub trait Clock {
    /// Current time as epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A hand-driven clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a clock frozen at `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    /// Moves the clock to `now_ms`.
    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Fixed-cadence ticker polled by the host's frame loop.
///
/// Start and stop are idempotent.
#[derive(Debug, Clone)]
pub struct ClockDriver {
    interval_ms: i64,
    next_due_ms: Option<i64>,
}

impl ClockDriver {
    /// Creates a stopped driver with the given interval.
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
        }
    }

    /// Tick interval (ms).
    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    /// Whether the driver is running.
    pub fn is_running(&self) -> bool {
        self.next_due_ms.is_some()
    }

    /// Starts ticking, first tick one interval after `now_ms`.
    ///
    /// Returns `false` if already running; the pending deadline is kept.
    pub fn start(&mut self, now_ms: i64) -> bool {
        if self.is_running() {
            return false;
        }
        self.next_due_ms = Some(now_ms + self.interval_ms);
        debug!("clock driver started, every {} ms", self.interval_ms);
        true
    }

    /// Stops ticking. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        if self.next_due_ms.take().is_none() {
            return false;
        }
        debug!("clock driver stopped");
        true
    }

    /// Reports whether a tick is due at `now_ms` and schedules the next one.
    ///
    /// Missed intervals collapse into a single tick; the next deadline stays
    /// on the configured cadence.
    pub fn poll(&mut self, now_ms: i64) -> bool {
        let Some(due) = self.next_due_ms else {
            return false;
        };
        if now_ms < due {
            return false;
        }
        let missed = (now_ms - due) / self.interval_ms;
        self.next_due_ms = Some(due + (missed + 1) * self.interval_ms);
        true
    }

    /// Time left until the next tick, `None` while stopped.
    pub fn time_until_next_tick(&self, now_ms: i64) -> Option<Duration> {
        self.next_due_ms
            .map(|due| Duration::from_millis((due - now_ms).max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(1000);
        let view = clock.clone();
        clock.advance(500);
        assert_eq!(view.now_ms(), 1500);
        view.set(42);
        assert_eq!(clock.now_ms(), 42);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn test_driver_ticks_on_cadence() {
        let mut driver = ClockDriver::new(60_000);
        assert!(!driver.poll(0));
        assert!(driver.start(0));
        assert!(!driver.poll(59_999));
        assert!(driver.poll(60_000));
        assert!(!driver.poll(60_001));
        assert!(driver.poll(120_000));
    }

    #[test]
    fn test_driver_collapses_missed_ticks() {
        let mut driver = ClockDriver::new(60_000);
        driver.start(0);
        assert!(driver.poll(250_000));
        assert!(!driver.poll(250_000));
        assert_eq!(
            driver.time_until_next_tick(250_000),
            Some(Duration::from_millis(50_000))
        );
    }

    #[test]
    fn test_driver_start_stop_idempotent() {
        let mut driver = ClockDriver::new(1000);
        assert!(!driver.stop());
        assert!(driver.start(0));
        assert!(!driver.start(500));
        assert_eq!(driver.time_until_next_tick(0), Some(Duration::from_millis(1000)));
        assert!(driver.stop());
        assert!(!driver.stop());
        assert!(!driver.is_running());
        assert!(!driver.poll(10_000));
        assert_eq!(driver.time_until_next_tick(0), None);
    }

    #[test]
    fn test_driver_zero_interval_clamped() {
        let driver = ClockDriver::new(0);
        assert_eq!(driver.interval_ms(), 1);
    }
}
