//! Forecast domain models.
//!
//! Input types describe the print queue as the forecaster receives it;
//! output types describe the simulated timeline.
//!
//! # Domain Mappings
//!
//! | print-timeline | Queue | Timeline view |
//! |----------------|-------|---------------|
//! | QueueSnapshot | Queue state | (input) |
//! | Peer | Printer on the network | Lane header |
//! | Job | Queued job | Event title |
//! | WorkUnit | Set (file × copies) | Event block |
//! | Lane | (derived) | Printer track |
//! | Event | (derived) | Occupied interval |

mod event;
mod lane;
mod snapshot;

pub use event::Event;
pub use lane::{Lane, LaneStatus};
pub use snapshot::{
    Job, Peer, PeerProfile, QueueSnapshot, SetMetadata, SnapshotSource, WorkUnit,
    DEFAULT_PEER_STATUS, MAX_ESTIMATE_MS,
};
