//! Calendar configuration.
//!
//! Zoom bounds, visible span, clock cadence, and the fallback print time
//! estimate. Every field has a default so partial JSON documents load.

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Default visible span (hours).
pub const DEFAULT_TIMELINE_HOURS: u32 = 24;

/// Default zoom level (pixels per hour).
pub const DEFAULT_PIXELS_PER_HOUR: u32 = 60;

/// Narrowest zoom level (pixels per hour).
pub const MIN_PIXELS_PER_HOUR: u32 = 20;

/// Widest zoom level (pixels per hour).
pub const MAX_PIXELS_PER_HOUR: u32 = 200;

/// Zoom increment per step (pixels per hour).
pub const DEFAULT_ZOOM_STEP: u32 = 20;

/// Clock driver cadence (seconds).
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

/// Print time assumed when a work-unit carries no estimate (seconds).
pub const DEFAULT_ESTIMATE_SECS: u64 = 3600;

/// Settings for a [`Calendar`](crate::Calendar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Visible span (hours).
    pub timeline_hours: u32,
    /// Initial zoom level (pixels per hour).
    pub pixels_per_hour: u32,
    /// Lower zoom bound.
    pub min_pixels_per_hour: u32,
    /// Upper zoom bound.
    pub max_pixels_per_hour: u32,
    /// Zoom increment.
    pub zoom_step: u32,
    /// Interval between "now" marker updates (seconds).
    pub tick_interval_secs: u64,
    /// Fallback print time estimate (seconds).
    pub default_estimate_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timeline_hours: DEFAULT_TIMELINE_HOURS,
            pixels_per_hour: DEFAULT_PIXELS_PER_HOUR,
            min_pixels_per_hour: MIN_PIXELS_PER_HOUR,
            max_pixels_per_hour: MAX_PIXELS_PER_HOUR,
            zoom_step: DEFAULT_ZOOM_STEP,
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            default_estimate_secs: DEFAULT_ESTIMATE_SECS,
        }
    }
}

impl CalendarConfig {
    /// Loads and validates a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ForecastError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ForecastError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sets the visible span.
    pub fn with_timeline_hours(mut self, hours: u32) -> Self {
        self.timeline_hours = hours;
        self
    }

    /// Sets the initial zoom level.
    pub fn with_pixels_per_hour(mut self, pixels: u32) -> Self {
        self.pixels_per_hour = pixels;
        self
    }

    /// Sets the fallback estimate.
    pub fn with_default_estimate_secs(mut self, secs: u64) -> Self {
        self.default_estimate_secs = secs;
        self
    }

    /// Sets the clock cadence.
    pub fn with_tick_interval_secs(mut self, secs: u64) -> Self {
        self.tick_interval_secs = secs;
        self
    }

    /// Checks that bounds are ordered and intervals positive.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.min_pixels_per_hour == 0 {
            return Err(ForecastError::invalid_config(
                "min_pixels_per_hour",
                "must be positive",
            ));
        }
        if self.min_pixels_per_hour > self.max_pixels_per_hour {
            return Err(ForecastError::invalid_config(
                "min_pixels_per_hour",
                format!(
                    "{} exceeds max_pixels_per_hour {}",
                    self.min_pixels_per_hour, self.max_pixels_per_hour
                ),
            ));
        }
        if !(self.min_pixels_per_hour..=self.max_pixels_per_hour).contains(&self.pixels_per_hour) {
            return Err(ForecastError::invalid_config(
                "pixels_per_hour",
                format!(
                    "{} outside [{}, {}]",
                    self.pixels_per_hour, self.min_pixels_per_hour, self.max_pixels_per_hour
                ),
            ));
        }
        if self.zoom_step == 0 {
            return Err(ForecastError::invalid_config("zoom_step", "must be positive"));
        }
        if self.tick_interval_secs == 0 {
            return Err(ForecastError::invalid_config(
                "tick_interval_secs",
                "must be positive",
            ));
        }
        if self.default_estimate_secs == 0 {
            return Err(ForecastError::invalid_config(
                "default_estimate_secs",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Fallback estimate in milliseconds.
    pub fn default_estimate_ms(&self) -> i64 {
        (self.default_estimate_secs as i64).saturating_mul(1000)
    }

    /// Clock cadence in milliseconds.
    pub fn tick_interval_ms(&self) -> i64 {
        (self.tick_interval_secs as i64).saturating_mul(1000)
    }

    /// Clamps a zoom level into the configured bounds.
    pub fn clamp_pixels_per_hour(&self, pixels: u32) -> u32 {
        pixels.max(self.min_pixels_per_hour).min(self.max_pixels_per_hour)
    }
}
