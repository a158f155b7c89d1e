//! Queue snapshot model.
//!
//! A snapshot is a read-only view of the print queue at one instant: the
//! peer printers on the network, the pending jobs with their work-units
//! ("sets"), and the ids of sets that are physically printing right now.
//! The forecaster never mutates it.
//!
//! # Wire Shape
//!
//! ```json
//! {
//!   "peers": { "<address>": { "name": "...", "status": "idle", "profile": { "name": "..." } } },
//!   "jobs": [ { "name": "...", "acquiredBy": "...", "sets": [
//!       { "id": "...", "shortName": "...", "path": "...", "profiles": ["..."],
//!         "remaining": 2, "completed": 1, "metadata": "{\"estimatedPrintTime\": 3600}" } ] } ],
//!   "active_sets": ["..."]
//! }
//! ```
//!
//! Peers arrive as a map keyed by address; their document order is kept
//! because lane order (and therefore first-fit assignment) follows it.

use std::fmt;

use log::debug;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ForecastError;

/// Status string assumed for peers that report none.
pub const DEFAULT_PEER_STATUS: &str = "idle";

/// Longest print time a single work-unit may occupy (ms): 10 years.
pub const MAX_ESTIMATE_MS: i64 = 10 * 365 * 24 * 3_600_000;

/// Metadata key holding the slicer's print time estimate (seconds).
const ESTIMATE_KEY: &str = "estimatedPrintTime";

/// A read-only snapshot of the print queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Peer printers, in document order.
    #[serde(
        default,
        deserialize_with = "peers_in_order",
        serialize_with = "peers_as_map"
    )]
    pub peers: Vec<Peer>,
    /// Pending jobs, in queue order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub jobs: Vec<Job>,
    /// Ids of work-units currently printing.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub active_sets: Vec<String>,
}

/// A printer on the queue's network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Network address (unique key). Carried as the map key on the wire.
    #[serde(skip)]
    pub address: String,
    /// Human-readable printer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Reported status (`printing`, `idle`, `error`, anything else = offline).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Printer profile (capability class).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<PeerProfile>,
}

/// Printer profile descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerProfile {
    /// Profile name matched against a work-unit's `profiles`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A queued job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job identifier (may be empty for unsaved jobs).
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Work-units, in print order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sets: Vec<WorkUnit>,
    /// Printer that has claimed this job, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquired_by: Option<String>,
}

/// A schedulable portion of a job ("set").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnit {
    /// Work-unit identifier.
    #[serde(default)]
    pub id: String,
    /// Short display name, usually the file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// File path of the print file.
    #[serde(default)]
    pub path: String,
    /// Compatible profile names. Empty = compatible with every printer.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub profiles: Vec<String>,
    /// Copies not yet printed.
    #[serde(default = "default_remaining")]
    pub remaining: i64,
    /// Copies already printed.
    #[serde(default)]
    pub completed: i64,
    /// Slicer metadata, serialized or structured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SetMetadata>,
}

/// Work-unit metadata as delivered by the queue.
///
/// The queue sometimes hands over the JSON text and sometimes the decoded
/// object; both are accepted and decoded lazily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SetMetadata {
    /// JSON text, decoded on demand.
    Encoded(String),
    /// Already-structured value.
    Structured(Value),
}

/// Source of queue snapshots for a controller.
pub trait SnapshotSource {
    /// Returns the current state of the queue.
    fn snapshot(&self) -> QueueSnapshot;
}

impl SnapshotSource for QueueSnapshot {
    fn snapshot(&self) -> QueueSnapshot {
        self.clone()
    }
}

impl<F> SnapshotSource for F
where
    F: Fn() -> QueueSnapshot,
{
    fn snapshot(&self) -> QueueSnapshot {
        self()
    }
}

fn default_remaining() -> i64 {
    1
}

impl QueueSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, ForecastError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Adds a peer.
    pub fn with_peer(mut self, peer: Peer) -> Self {
        self.peers.push(peer);
        self
    }

    /// Adds a job.
    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    /// Marks a work-unit as currently printing.
    pub fn with_active_set(mut self, set_id: impl Into<String>) -> Self {
        self.active_sets.push(set_id.into());
        self
    }

    /// Whether the given work-unit is currently printing.
    pub fn is_active(&self, set_id: &str) -> bool {
        self.active_sets.iter().any(|id| id == set_id)
    }

    /// Looks up a peer by address.
    pub fn peer(&self, address: &str) -> Option<&Peer> {
        self.peers.iter().find(|p| p.address == address)
    }

    /// Total number of work-units across all jobs.
    pub fn work_unit_count(&self) -> usize {
        self.jobs.iter().map(|j| j.sets.len()).sum()
    }
}

impl Peer {
    /// Creates a peer with the given address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Sets the printer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the reported status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the profile name.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(PeerProfile {
            name: Some(profile.into()),
        });
        self
    }

    /// Printer name, or the address when the peer has no name.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.address,
        }
    }

    /// Reported status, [`DEFAULT_PEER_STATUS`] when absent.
    pub fn status(&self) -> &str {
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => status,
            _ => DEFAULT_PEER_STATUS,
        }
    }

    /// Profile name, empty when unknown.
    pub fn profile_name(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("")
    }
}

impl Job {
    /// Creates a job with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the job id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Appends a work-unit.
    pub fn with_set(mut self, set: WorkUnit) -> Self {
        self.sets.push(set);
        self
    }

    /// Records the printer that claimed this job.
    pub fn with_acquired_by(mut self, peer: impl Into<String>) -> Self {
        self.acquired_by = Some(peer.into());
        self
    }

    /// Work-units that still have copies to print.
    pub fn pending_sets(&self) -> impl Iterator<Item = &WorkUnit> {
        self.sets.iter().filter(|s| s.is_pending())
    }
}

impl WorkUnit {
    /// Creates a work-unit with one remaining copy and no metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            short_name: None,
            path: String::new(),
            profiles: Vec::new(),
            remaining: default_remaining(),
            completed: 0,
            metadata: None,
        }
    }

    /// Sets the short display name.
    pub fn with_short_name(mut self, name: impl Into<String>) -> Self {
        self.short_name = Some(name.into());
        self
    }

    /// Sets the file path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Restricts the work-unit to a printer profile. May be called repeatedly.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profiles.push(profile.into());
        self
    }

    /// Sets the remaining and completed copy counts.
    pub fn with_counts(mut self, remaining: i64, completed: i64) -> Self {
        self.remaining = remaining;
        self.completed = completed;
        self
    }

    /// Sets the metadata.
    pub fn with_metadata(mut self, metadata: SetMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets structured metadata carrying only a print time estimate.
    pub fn with_estimate_secs(self, secs: f64) -> Self {
        self.with_metadata(SetMetadata::Structured(
            serde_json::json!({ ESTIMATE_KEY: secs }),
        ))
    }

    /// Whether copies remain to be printed.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.remaining > 0
    }

    /// Whether a printer with the given profile may print this work-unit.
    pub fn accepts_profile(&self, profile: &str) -> bool {
        self.profiles.is_empty() || self.profiles.iter().any(|p| p == profile)
    }

    /// Estimated duration (ms), or `default_ms` when metadata is missing,
    /// unparsable, or carries no usable estimate.
    ///
    /// Estimates are capped at [`MAX_ESTIMATE_MS`].
    pub fn estimated_duration_ms(&self, default_ms: i64) -> i64 {
        self.metadata
            .as_ref()
            .and_then(SetMetadata::estimated_print_time_secs)
            .map(|secs| (secs * 1000.0).min(MAX_ESTIMATE_MS as f64).round() as i64)
            .filter(|&ms| ms > 0)
            .unwrap_or(default_ms)
    }

    /// Short name, or the last segment of the file path.
    pub fn display_name(&self) -> &str {
        match self.short_name.as_deref() {
            Some(name) => name,
            None => self.path.rsplit(['/', '\\']).next().unwrap_or(""),
        }
    }

    /// Completion percentage, 0 when no copies are counted.
    pub fn progress_percent(&self) -> f64 {
        let total = self.completed + self.remaining;
        if total > 0 {
            self.completed as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }
}

impl SetMetadata {
    /// Print time estimate in seconds, if present and positive.
    ///
    /// Undecodable text counts as "no metadata".
    pub fn estimated_print_time_secs(&self) -> Option<f64> {
        match self {
            Self::Encoded(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(value) => estimate_from(&value),
                Err(err) => {
                    debug!("ignoring undecodable set metadata: {err}");
                    None
                }
            },
            Self::Structured(value) => estimate_from(value),
        }
    }
}

fn estimate_from(value: &Value) -> Option<f64> {
    value
        .get(ESTIMATE_KEY)
        .and_then(Value::as_f64)
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}

fn peers_in_order<'de, D>(deserializer: D) -> Result<Vec<Peer>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PeersVisitor;

    impl<'de> Visitor<'de> for PeersVisitor {
        type Value = Vec<Peer>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of peer address to peer")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut peers = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((address, mut peer)) = map.next_entry::<String, Peer>()? {
                peer.address = address;
                peers.push(peer);
            }
            Ok(peers)
        }
    }

    deserializer.deserialize_any(PeersVisitor)
}

/// Decodes a list field, treating `null` like a missing field.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn peers_as_map<S>(peers: &[Peer], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(peers.len()))?;
    for peer in peers {
        map.serialize_entry(&peer.address, peer)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT_JSON: &str = r#"{
        "peers": {
            "192.168.1.102:5000": {"name": "Printer2", "status": "printing", "profile": {"name": "Prusa MK4"}},
            "192.168.1.101:5000": {"name": "Printer1", "status": "idle", "profile": {"name": "Prusa MK3S"}}
        },
        "jobs": [
            {"name": "Test Job 1", "acquiredBy": "Printer2", "sets": [
                {"id": "set-123", "shortName": "test_part.gcode", "profiles": ["Prusa MK4"],
                 "remaining": 2, "completed": 1, "metadata": "{\"estimatedPrintTime\": 3600}"}
            ]},
            {"name": "Test Job 2", "sets": [
                {"id": "set-456", "path": "parts/another_part.gcode", "profiles": ["Prusa MK3S"],
                 "remaining": 5, "metadata": {"estimatedPrintTime": 7200}}
            ]}
        ],
        "active_sets": ["set-123"]
    }"#;

    #[test]
    fn test_decode_keeps_peer_order() {
        let snapshot = QueueSnapshot::from_json(SNAPSHOT_JSON).unwrap();
        let addresses: Vec<&str> = snapshot.peers.iter().map(|p| p.address.as_str()).collect();
        assert_eq!(addresses, vec!["192.168.1.102:5000", "192.168.1.101:5000"]);
        assert_eq!(snapshot.peers[0].display_name(), "Printer2");
        assert_eq!(snapshot.peers[0].profile_name(), "Prusa MK4");
        assert_eq!(snapshot.jobs.len(), 2);
        assert_eq!(snapshot.jobs[0].acquired_by.as_deref(), Some("Printer2"));
        assert!(snapshot.is_active("set-123"));
        assert!(!snapshot.is_active("set-456"));
        assert_eq!(snapshot.work_unit_count(), 2);
    }

    #[test]
    fn test_decode_defaults() {
        let snapshot =
            QueueSnapshot::from_json(r#"{"peers": {"10.0.0.1": {}}, "jobs": [{"sets": [{"id": "s"}]}]}"#)
                .unwrap();
        let peer = &snapshot.peers[0];
        assert_eq!(peer.display_name(), "10.0.0.1");
        assert_eq!(peer.status(), DEFAULT_PEER_STATUS);
        assert_eq!(peer.profile_name(), "");

        let set = &snapshot.jobs[0].sets[0];
        assert_eq!(set.remaining, 1);
        assert_eq!(set.completed, 0);
        assert!(set.metadata.is_none());
        assert!(snapshot.active_sets.is_empty());
    }

    #[test]
    fn test_decode_null_and_missing_peers() {
        let snapshot = QueueSnapshot::from_json(r#"{"peers": null}"#).unwrap();
        assert!(snapshot.peers.is_empty());
        let snapshot = QueueSnapshot::from_json("{}").unwrap();
        assert!(snapshot.peers.is_empty());
        assert!(snapshot.jobs.is_empty());

        let snapshot = QueueSnapshot::from_json(r#"{"jobs": null, "active_sets": null}"#).unwrap();
        assert!(snapshot.jobs.is_empty());
        assert!(snapshot.active_sets.is_empty());

        let snapshot = QueueSnapshot::from_json(r#"{"jobs": [{"name": "J", "sets": null}]}"#).unwrap();
        assert!(snapshot.jobs[0].sets.is_empty());

        let snapshot = QueueSnapshot::from_json(
            r#"{"jobs": [{"name": "J", "sets": [{"id": "s", "profiles": null}]}]}"#,
        )
        .unwrap();
        let set = &snapshot.jobs[0].sets[0];
        assert!(set.profiles.is_empty());
        assert!(set.accepts_profile("anything"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = QueueSnapshot::from_json(r#"{"jobs": 5}"#).unwrap_err();
        assert!(matches!(err, ForecastError::Decode(_)));
    }

    #[test]
    fn test_peers_serialize_as_map() {
        let snapshot = QueueSnapshot::new()
            .with_peer(Peer::new("b").with_name("B"))
            .with_peer(Peer::new("a").with_name("A"));
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["peers"]["b"]["name"], "B");
        assert!(value["peers"]["a"].get("address").is_none());

        let text = serde_json::to_string(&snapshot).unwrap();
        let back = QueueSnapshot::from_json(&text).unwrap();
        assert_eq!(back.peers, snapshot.peers);
    }

    #[test]
    fn test_estimated_duration() {
        let snapshot = QueueSnapshot::from_json(SNAPSHOT_JSON).unwrap();
        assert_eq!(snapshot.jobs[0].sets[0].estimated_duration_ms(1), 3_600_000);
        assert_eq!(snapshot.jobs[1].sets[0].estimated_duration_ms(1), 7_200_000);

        let plain = WorkUnit::new("s");
        assert_eq!(plain.estimated_duration_ms(3_600_000), 3_600_000);
    }

    #[test]
    fn test_estimated_duration_fallbacks() {
        let default_ms = 3_600_000;
        let cases = [
            SetMetadata::Encoded("{not json".into()),
            SetMetadata::Encoded("{}".into()),
            SetMetadata::Encoded(r#"{"estimatedPrintTime": 0}"#.into()),
            SetMetadata::Encoded(r#"{"estimatedPrintTime": -30}"#.into()),
            SetMetadata::Encoded(r#"{"estimatedPrintTime": "soon"}"#.into()),
            SetMetadata::Structured(serde_json::json!([1, 2, 3])),
            SetMetadata::Structured(Value::Null),
        ];
        for metadata in cases {
            let set = WorkUnit::new("s").with_metadata(metadata.clone());
            assert_eq!(set.estimated_duration_ms(default_ms), default_ms, "{metadata:?}");
        }
    }

    #[test]
    fn test_fractional_estimate() {
        let set = WorkUnit::new("s").with_estimate_secs(1.5);
        assert_eq!(set.estimated_duration_ms(0), 1500);
    }

    #[test]
    fn test_estimate_capped() {
        let set = WorkUnit::new("s").with_estimate_secs(1e17);
        assert_eq!(set.estimated_duration_ms(1000), MAX_ESTIMATE_MS);

        let at_cap = WorkUnit::new("s").with_estimate_secs((MAX_ESTIMATE_MS / 1000) as f64);
        assert_eq!(at_cap.estimated_duration_ms(1000), MAX_ESTIMATE_MS);
    }

    #[test]
    fn test_display_name_fallback() {
        let named = WorkUnit::new("s").with_short_name("test.gcode");
        assert_eq!(named.display_name(), "test.gcode");

        let unix = WorkUnit::new("s").with_path("models/parts/bracket.gcode");
        assert_eq!(unix.display_name(), "bracket.gcode");

        let windows = WorkUnit::new("s").with_path(r"C:\prints\gear.gcode");
        assert_eq!(windows.display_name(), "gear.gcode");

        assert_eq!(WorkUnit::new("s").display_name(), "");
    }

    #[test]
    fn test_progress_percent() {
        let set = WorkUnit::new("s").with_counts(3, 2);
        assert!((set.progress_percent() - 40.0).abs() < 1e-10);

        let empty = WorkUnit::new("s").with_counts(0, 0);
        assert_eq!(empty.progress_percent(), 0.0);
    }

    #[test]
    fn test_profile_compatibility() {
        let any = WorkUnit::new("s");
        assert!(any.accepts_profile("Prusa MK4"));
        assert!(any.accepts_profile(""));

        let restricted = WorkUnit::new("s").with_profile("A").with_profile("B");
        assert!(restricted.accepts_profile("B"));
        assert!(!restricted.accepts_profile("C"));
        assert!(!restricted.accepts_profile(""));
    }

    #[test]
    fn test_pending_sets() {
        let job = Job::new("J")
            .with_set(WorkUnit::new("a").with_counts(0, 4))
            .with_set(WorkUnit::new("b").with_counts(2, 0))
            .with_set(WorkUnit::new("c").with_counts(-1, 0));
        let pending: Vec<&str> = job.pending_sets().map(|s| s.id.as_str()).collect();
        assert_eq!(pending, vec!["b"]);
    }

    #[test]
    fn test_closure_source() {
        let source = || QueueSnapshot::new().with_active_set("x");
        assert!(source.snapshot().is_active("x"));
    }
}
