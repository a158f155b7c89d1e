//! Printer lane model.
//!
//! A lane is one printer's track on the timeline. It is rebuilt from the
//! peer snapshot on every refresh and owns the events forecast for that
//! printer, in time order.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Event, Peer};

/// One printer's timeline track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Printer display name.
    pub printer: String,
    /// Printer address.
    pub address: String,
    /// Profile name, empty when unknown.
    pub profile: String,
    /// Reported printer status.
    pub status: String,
    /// Forecast events, time-ascending and back to back.
    pub events: Vec<Event>,
}

/// Visual status class of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneStatus {
    /// Printer is printing.
    Printing,
    /// Printer is idle.
    Idle,
    /// Printer reported an error.
    Error,
    /// Anything else, including unknown statuses.
    Offline,
}

impl Lane {
    /// Creates an empty lane.
    pub fn new(
        printer: impl Into<String>,
        address: impl Into<String>,
        profile: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            printer: printer.into(),
            address: address.into(),
            profile: profile.into(),
            status: status.into(),
            events: Vec::new(),
        }
    }

    /// Creates an empty lane for a peer.
    pub fn from_peer(peer: &Peer) -> Self {
        Self::new(
            peer.display_name(),
            peer.address.as_str(),
            peer.profile_name(),
            peer.status(),
        )
    }

    /// Printer name, with the profile in parentheses when known.
    pub fn display_name(&self) -> String {
        if self.profile.is_empty() {
            self.printer.clone()
        } else {
            format!("{} ({})", self.printer, self.profile)
        }
    }

    /// Status class for styling.
    pub fn status_class(&self) -> LaneStatus {
        LaneStatus::from_status(&self.status)
    }

    /// End of the last forecast event, if any.
    pub fn busy_until_ms(&self) -> Option<i64> {
        self.events.last().map(|e| e.end_ms)
    }

    /// Sum of event durations (ms).
    pub fn busy_ms(&self) -> i64 {
        self.events.iter().map(Event::duration_ms).sum()
    }

    /// The event for the work-unit that is physically printing, if any.
    pub fn active_event(&self) -> Option<&Event> {
        self.events.iter().find(|e| e.is_active)
    }

    /// Number of forecast events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        debug_assert!(
            self.busy_until_ms().map_or(true, |end| end <= event.start_ms),
            "lane events must not overlap"
        );
        self.events.push(event);
    }
}

impl LaneStatus {
    /// Classifies a reported status string.
    pub fn from_status(status: &str) -> Self {
        match status {
            "printing" => Self::Printing,
            "idle" => Self::Idle,
            "error" => Self::Error,
            _ => Self::Offline,
        }
    }

    /// CSS-style class name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Printing => "printing",
            Self::Idle => "idle",
            Self::Error => "error",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for LaneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
