//! Calendar controller.
//!
//! Owns the timeline configuration, the latest forecast, and the clock
//! driver. All state changes happen through `&mut self` calls from the host
//! UI; nothing runs in the background.
//!
//! # Lifecycle
//!
//! - `toggle()` to visible: refresh the forecast and start the clock driver.
//! - `toggle()` to hidden: stop the driver. The forecast is kept.
//! - `tick()` from the frame loop: moves the "now" marker once per interval.
//! - `refresh()`: rebuilds every lane and event and re-anchors the timeline at now.

use std::fmt;
use std::time::Duration;

use chrono::Local;
use log::{debug, warn};

use crate::clock::{Clock, ClockDriver, SystemClock};
use crate::config::CalendarConfig;
use crate::error::ForecastError;
use crate::models::{Event, Lane, QueueSnapshot, SnapshotSource};
use crate::scheduler::{FirstFitScheduler, Forecast, ForecastSummary};
use crate::timeline::{EventStyle, TimeMarkers, Timeline};
use crate::validation::validate_snapshot;

/// Formats numbers for display.
pub type Humanizer = Box<dyn Fn(f64) -> String>;

/// Print queue calendar: forecast lanes plus a zoomable timeline.
///
/// # Example
///
/// ```
/// use print_timeline::clock::ManualClock;
/// use print_timeline::models::{Job, Peer, QueueSnapshot, WorkUnit};
/// use print_timeline::Calendar;
///
/// let snapshot = QueueSnapshot::new()
///     .with_peer(Peer::new("10.0.0.1").with_name("Printer1"))
///     .with_job(Job::new("Bracket").with_set(WorkUnit::new("s1")));
///
/// let mut calendar = Calendar::new()
///     .with_clock(ManualClock::new(0))
///     .with_source(snapshot);
///
/// calendar.toggle();
/// assert!(calendar.is_visible());
/// assert_eq!(calendar.lanes()[0].events.len(), 1);
///
/// calendar.zoom_in();
/// assert_eq!(calendar.pixels_per_hour(), 80);
/// ```
pub struct Calendar {
    config: CalendarConfig,
    scheduler: FirstFitScheduler,
    clock: Box<dyn Clock>,
    source: Option<Box<dyn SnapshotSource>>,
    humanize: Humanizer,
    timeline: Timeline,
    forecast: Forecast,
    driver: ClockDriver,
    visible: bool,
}

impl Calendar {
    /// Creates a hidden calendar with default settings and the system clock.
    pub fn new() -> Self {
        Self::build(CalendarConfig::default())
    }

    /// Creates a hidden calendar from validated settings.
    pub fn with_config(config: CalendarConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CalendarConfig) -> Self {
        let clock = SystemClock;
        let timeline = Timeline::new(
            clock.now_ms(),
            config.timeline_hours,
            config.clamp_pixels_per_hour(config.pixels_per_hour),
        );
        Self {
            scheduler: FirstFitScheduler::new()
                .with_default_duration_ms(config.default_estimate_ms()),
            driver: ClockDriver::new(config.tick_interval_ms()),
            clock: Box::new(clock),
            source: None,
            humanize: Box::new(|n: f64| n.to_string()),
            timeline,
            forecast: Forecast::default(),
            visible: false,
            config,
        }
    }

    /// Replaces the clock and re-anchors the timeline at its current time.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        let now = clock.now_ms();
        self.clock = Box::new(clock);
        self.timeline.set_start_ms(now);
        self.timeline.set_current_ms(now);
        self
    }

    /// Sets the queue the calendar forecasts.
    pub fn with_source(mut self, source: impl SnapshotSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Sets the number formatter.
    pub fn with_humanizer(mut self, humanize: impl Fn(f64) -> String + 'static) -> Self {
        self.humanize = Box::new(humanize);
        self
    }

    /// Active settings.
    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    // ---- visibility ----

    /// Whether the calendar is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flips visibility. Returns the new visibility.
    pub fn toggle(&mut self) -> bool {
        self.set_visible(!self.visible);
        self.visible
    }

    /// Shows or hides the calendar.
    ///
    /// Showing refreshes the forecast and starts the clock driver; hiding
    /// stops the driver. Setting the current state again does nothing.
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.refresh();
            self.driver.start(self.clock.now_ms());
        } else {
            self.driver.stop();
        }
    }

    // ---- forecasting ----

    /// Rebuilds the forecast from the queue source.
    ///
    /// Without a source this does nothing.
    pub fn refresh(&mut self) {
        let Some(source) = self.source.as_ref() else {
            debug!("calendar refresh skipped: no queue source");
            return;
        };
        let snapshot = source.snapshot();
        self.refresh_from(&snapshot);
    }

    /// Rebuilds the forecast from `snapshot` and re-anchors the timeline at now.
    pub fn refresh_from(&mut self, snapshot: &QueueSnapshot) {
        if let Err(issues) = validate_snapshot(snapshot) {
            for issue in &issues {
                warn!("queue snapshot: {}", issue.message);
            }
        }

        let now = self.clock.now_ms();
        self.timeline.set_start_ms(now);
        self.timeline.set_current_ms(now);
        self.forecast = self.scheduler.forecast(snapshot, now);

        debug!(
            "calendar refreshed: {} lanes, {} events, {} unscheduled",
            self.forecast.lanes.len(),
            self.forecast.event_count(),
            self.forecast.unscheduled.len()
        );
    }

    /// Lanes from the latest refresh.
    pub fn lanes(&self) -> &[Lane] {
        &self.forecast.lanes
    }

    /// The latest forecast.
    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    /// Load figures over the visible window.
    pub fn summary(&self) -> ForecastSummary {
        ForecastSummary::calculate(
            &self.forecast,
            self.timeline.start_ms(),
            self.timeline.end_ms(),
        )
    }

    // ---- zoom & scroll ----

    /// Zoom level (pixels per hour).
    pub fn pixels_per_hour(&self) -> u32 {
        self.timeline.pixels_per_hour()
    }

    /// Sets the zoom level, clamped to the configured bounds.
    pub fn set_pixels_per_hour(&mut self, pixels: u32) {
        let clamped = self.config.clamp_pixels_per_hour(pixels);
        self.timeline.set_pixels_per_hour(clamped);
    }

    /// Widens the timeline by one zoom step.
    pub fn zoom_in(&mut self) {
        let pixels = self.pixels_per_hour().saturating_add(self.config.zoom_step);
        self.set_pixels_per_hour(pixels);
    }

    /// Narrows the timeline by one zoom step.
    pub fn zoom_out(&mut self) {
        let pixels = self.pixels_per_hour().saturating_sub(self.config.zoom_step);
        self.set_pixels_per_hour(pixels);
    }

    /// Visible span (hours).
    pub fn timeline_hours(&self) -> u32 {
        self.timeline.hours()
    }

    /// Sets the visible span.
    pub fn set_timeline_hours(&mut self, hours: u32) {
        self.timeline.set_hours(hours);
    }

    /// Re-anchors the timeline at now without recomputing the forecast.
    pub fn scroll_to_now(&mut self) {
        self.timeline.set_start_ms(self.clock.now_ms());
    }

    // ---- clock ----

    /// Polls the clock driver; moves the "now" marker when a tick is due.
    ///
    /// Returns whether the marker moved. Does nothing while hidden.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        if !self.driver.poll(now) {
            return false;
        }
        self.timeline.set_current_ms(now);
        debug!("calendar clock tick at {now}");
        true
    }

    /// Time until the next marker update, `None` while hidden.
    pub fn time_until_next_tick(&self) -> Option<Duration> {
        self.driver.time_until_next_tick(self.clock.now_ms())
    }

    /// Whether the clock driver is running.
    pub fn is_ticking(&self) -> bool {
        self.driver.is_running()
    }

    // ---- geometry ----

    /// Timeline window and scale.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Total timeline width (pixels).
    pub fn timeline_width(&self) -> f64 {
        self.timeline.width()
    }

    /// Hour markers in the local timezone.
    pub fn time_markers(&self) -> TimeMarkers<Local> {
        self.timeline.time_markers()
    }

    /// Offset of the "now" indicator (pixels).
    pub fn current_time_position(&self) -> f64 {
        self.timeline.current_time_position()
    }

    /// Placement of an event block.
    pub fn event_style(&self, event: &Event) -> EventStyle {
        self.timeline.event_style(event)
    }

    // ---- display ----

    /// Formats a number with the configured humanizer.
    pub fn humanize(&self, value: f64) -> String {
        (self.humanize)(value)
    }

    /// Event progress as a whole percentage, e.g. `"40%"`.
    pub fn progress_label(&self, event: &Event) -> String {
        format!("{}%", self.humanize(event.progress_percent().round()))
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Calendar {
    fn drop(&mut self) {
        self.driver.stop();
    }
}

impl fmt::Debug for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calendar")
            .field("config", &self.config)
            .field("timeline", &self.timeline)
            .field("lanes", &self.forecast.lanes.len())
            .field("visible", &self.visible)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}
