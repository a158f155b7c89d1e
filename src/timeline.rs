//! Timeline geometry.
//!
//! Converts instants into horizontal pixel offsets for a timeline anchored
//! at `start_ms` and scaled by `pixels_per_hour`. Everything here is a pure
//! function of the [`Timeline`] state; nothing is cached.
//!
//! # Coordinates
//!
//! `x = (t - start) / 1h * pixels_per_hour`. Offsets left of the origin are
//! clamped to 0 for event blocks and the "now" indicator.

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Timelike};

use crate::models::Event;

/// Milliseconds per hour.
pub const MS_PER_HOUR: i64 = 3_600_000;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: i64 = 60_000;

/// Minimum rendered width of an event block (pixels).
pub const MIN_EVENT_WIDTH_PX: f64 = 20.0;

/// Marker label format (24-hour `HH:MM`).
const MARKER_LABEL_FORMAT: &str = "%H:%M";

/// Visible window and scale of the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    start_ms: i64,
    current_ms: i64,
    hours: u32,
    pixels_per_hour: u32,
}

/// Horizontal placement of an event block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventStyle {
    /// Offset from the timeline origin (pixels, never negative).
    pub left_px: f64,
    /// Block width (pixels, at least [`MIN_EVENT_WIDTH_PX`]).
    pub width_px: f64,
}

/// One hour gridline on the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMarker {
    /// Offset from the timeline origin (pixels).
    pub offset_px: f64,
    /// Local `HH:MM` label.
    pub label: String,
    /// Whether the marker sits on an hour boundary.
    pub is_hour: bool,
    /// Instant the marker represents (epoch ms).
    pub time_ms: i64,
}

/// Iterator over the hour markers of a [`Timeline`].
///
/// Yields `hours + 1` markers starting at the hour containing the
/// timeline start. Clone it to iterate again.
#[derive(Debug, Clone)]
pub struct TimeMarkers<Tz: TimeZone> {
    tz: Tz,
    anchor_ms: i64,
    pixels_per_hour: f64,
    index: u32,
    count: u32,
}

impl Timeline {
    /// Creates a timeline anchored (and with "now") at `start_ms`.
    pub fn new(start_ms: i64, hours: u32, pixels_per_hour: u32) -> Self {
        Self {
            start_ms,
            current_ms: start_ms,
            hours,
            pixels_per_hour,
        }
    }

    /// Timeline origin (epoch ms).
    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    /// Instant of the "now" indicator (epoch ms).
    pub fn current_ms(&self) -> i64 {
        self.current_ms
    }

    /// Visible span (hours).
    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// Zoom level.
    pub fn pixels_per_hour(&self) -> u32 {
        self.pixels_per_hour
    }

    pub(crate) fn set_start_ms(&mut self, start_ms: i64) {
        self.start_ms = start_ms;
    }

    pub(crate) fn set_current_ms(&mut self, current_ms: i64) {
        self.current_ms = current_ms;
    }

    pub(crate) fn set_hours(&mut self, hours: u32) {
        self.hours = hours;
    }

    pub(crate) fn set_pixels_per_hour(&mut self, pixels_per_hour: u32) {
        self.pixels_per_hour = pixels_per_hour;
    }

    /// Total width of the visible span (pixels).
    pub fn width(&self) -> f64 {
        f64::from(self.hours) * f64::from(self.pixels_per_hour)
    }

    /// End of the visible span (epoch ms).
    pub fn end_ms(&self) -> i64 {
        self.start_ms + i64::from(self.hours) * MS_PER_HOUR
    }

    /// Unclamped offset of `time_ms` from the origin (pixels).
    pub fn offset_px(&self, time_ms: i64) -> f64 {
        self.span_px(time_ms - self.start_ms)
    }

    /// Width of a duration (pixels).
    pub fn span_px(&self, duration_ms: i64) -> f64 {
        duration_ms as f64 / MS_PER_HOUR as f64 * f64::from(self.pixels_per_hour)
    }

    /// Offset of the "now" indicator, never left of the origin.
    pub fn current_time_position(&self) -> f64 {
        self.offset_px(self.current_ms).max(0.0)
    }

    /// Placement of an event block.
    pub fn event_style(&self, event: &Event) -> EventStyle {
        EventStyle {
            left_px: self.offset_px(event.start_ms).max(0.0),
            width_px: self.span_px(event.end_ms - event.start_ms).max(MIN_EVENT_WIDTH_PX),
        }
    }

    /// Hour markers labelled in the local timezone.
    pub fn time_markers(&self) -> TimeMarkers<Local> {
        self.time_markers_in(&Local)
    }

    /// Hour markers labelled in `tz`.
    pub fn time_markers_in<Tz: TimeZone>(&self, tz: &Tz) -> TimeMarkers<Tz> {
        TimeMarkers {
            tz: tz.clone(),
            anchor_ms: floor_to_hour(tz, self.start_ms),
            pixels_per_hour: f64::from(self.pixels_per_hour),
            index: 0,
            count: self.hours.saturating_add(1),
        }
    }
}

impl<Tz: TimeZone> Iterator for TimeMarkers<Tz>
where
    Tz::Offset: fmt::Display,
{
    type Item = TimeMarker;

    fn next(&mut self) -> Option<TimeMarker> {
        if self.index >= self.count {
            return None;
        }
        let index = self.index;
        self.index += 1;

        let time_ms = self.anchor_ms + i64::from(index) * MS_PER_HOUR;
        let label = DateTime::from_timestamp_millis(time_ms)
            .map(|utc| {
                utc.with_timezone(&self.tz)
                    .format(MARKER_LABEL_FORMAT)
                    .to_string()
            })
            .unwrap_or_default();

        Some(TimeMarker {
            offset_px: f64::from(index) * self.pixels_per_hour,
            label,
            is_hour: true,
            time_ms,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.index) as usize;
        (left, Some(left))
    }
}

impl<Tz: TimeZone> ExactSizeIterator for TimeMarkers<Tz> where Tz::Offset: fmt::Display {}

impl fmt::Display for EventStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left: {}px; width: {}px;", self.left_px, self.width_px)
    }
}

/// Renders a duration as `"{H}h {M}m"`, or `"{M}m"` under one hour.
///
/// Both parts truncate toward zero.
///
/// ```
/// use print_timeline::timeline::format_duration;
///
/// assert_eq!(format_duration(5_400_000), "1h 30m");
/// assert_eq!(format_duration(1_800_000), "30m");
/// ```
pub fn format_duration(ms: i64) -> String {
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Start of the `tz`-local hour containing `time_ms`.
fn floor_to_hour<Tz: TimeZone>(tz: &Tz, time_ms: i64) -> i64 {
    match DateTime::from_timestamp_millis(time_ms) {
        Some(utc) => {
            let local = utc.with_timezone(tz);
            let into_hour = i64::from(local.minute()) * MS_PER_MINUTE
                + i64::from(local.second()) * 1000
                + i64::from(local.timestamp_subsec_millis().min(999));
            time_ms - into_hour
        }
        None => time_ms - time_ms.rem_euclid(MS_PER_HOUR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    use crate::models::{Job, WorkUnit};

    // 2024-01-01T10:17:30Z
    const T0: i64 = 1_704_104_250_000;
    // 2024-01-01T10:00:00Z
    const T0_HOUR: i64 = 1_704_103_200_000;

    fn event(start_ms: i64, end_ms: i64) -> Event {
        Event::new(&Job::new("J"), &WorkUnit::new("S"), "P", "a", start_ms, end_ms)
    }

    #[test]
    fn test_width() {
        let timeline = Timeline::new(T0, 24, 60);
        assert_eq!(timeline.width(), 1440.0);
        assert_eq!(Timeline::new(T0, 0, 60).width(), 0.0);
        assert_eq!(timeline.end_ms(), T0 + 24 * MS_PER_HOUR);
    }

    #[test]
    fn test_event_style_positions() {
        let timeline = Timeline::new(T0, 24, 60);
        let style = timeline.event_style(&event(T0 + MS_PER_HOUR, T0 + 2 * MS_PER_HOUR));
        assert_eq!(style.left_px, 60.0);
        assert_eq!(style.width_px, 60.0);
        assert_eq!(style.to_string(), "left: 60px; width: 60px;");
    }

    #[test]
    fn test_event_style_clamps() {
        let timeline = Timeline::new(T0, 24, 60);

        let short = timeline.event_style(&event(T0, T0 + 1000));
        assert_eq!(short.width_px, MIN_EVENT_WIDTH_PX);

        let past = timeline.event_style(&event(T0 - 2 * MS_PER_HOUR, T0 - MS_PER_HOUR));
        assert_eq!(past.left_px, 0.0);
        assert_eq!(past.width_px, 60.0);
    }

    #[test]
    fn test_current_time_position() {
        let mut timeline = Timeline::new(T0, 24, 60);
        assert_eq!(timeline.current_time_position(), 0.0);

        timeline.set_current_ms(T0 + 90 * MS_PER_MINUTE);
        assert!((timeline.current_time_position() - 90.0).abs() < 1e-9);

        timeline.set_current_ms(T0 - MS_PER_HOUR);
        assert_eq!(timeline.current_time_position(), 0.0);
    }

    #[test]
    fn test_markers_count_and_offsets() {
        let timeline = Timeline::new(T0, 24, 60);
        let markers: Vec<TimeMarker> = timeline.time_markers_in(&Utc).collect();
        assert_eq!(markers.len(), 25);
        for (k, marker) in markers.iter().enumerate() {
            assert_eq!(marker.offset_px, k as f64 * 60.0);
            assert!(marker.is_hour);
        }
        assert_eq!(markers[0].time_ms, T0_HOUR);
        assert_eq!(markers[0].label, "10:00");
        assert_eq!(markers[1].label, "11:00");
        assert_eq!(markers[24].label, "10:00");
    }

    #[test]
    fn test_markers_restartable() {
        let timeline = Timeline::new(T0, 3, 100);
        let markers = timeline.time_markers_in(&Utc);
        assert_eq!(markers.len(), 4);
        let first: Vec<_> = markers.clone().collect();
        let second: Vec<_> = markers.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_markers_zero_hours() {
        let timeline = Timeline::new(T0, 0, 60);
        let markers: Vec<_> = timeline.time_markers_in(&Utc).collect();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].offset_px, 0.0);
    }

    #[test]
    fn test_markers_half_hour_zone() {
        // UTC+05:30: 10:17:30Z is 15:47:30 local, so the anchor is 15:00 local (09:30Z).
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let timeline = Timeline::new(T0, 2, 60);
        let markers: Vec<_> = timeline.time_markers_in(&ist).collect();
        assert_eq!(markers[0].label, "15:00");
        assert_eq!(markers[0].time_ms, T0_HOUR - 30 * MS_PER_MINUTE);
        assert_eq!(markers[2].label, "17:00");
    }

    #[test]
    fn test_local_markers_count() {
        let timeline = Timeline::new(T0, 24, 60);
        assert_eq!(timeline.time_markers().count(), 25);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3_600_000), "1h 0m");
        assert_eq!(format_duration(5_400_000), "1h 30m");
        assert_eq!(format_duration(1_800_000), "30m");
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59_999), "0m");
        assert_eq!(format_duration(26 * MS_PER_HOUR + 5 * MS_PER_MINUTE + 59_000), "26h 5m");
    }
}
