//! Snapshot diagnostics.
//!
//! Checks a queue snapshot for conditions that make the forecast
//! misleading without making it impossible. Detects:
//! - Duplicate peer addresses
//! - Duplicate work-unit ids
//! - Active set ids that match no work-unit
//! - Pending work-units whose profiles match no peer
//!
//! None of these stop forecasting; the calendar logs them and carries on.

use std::collections::HashSet;

use crate::models::QueueSnapshot;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationIssue>>;

/// A snapshot diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Issue category.
    pub kind: ValidationIssueKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of snapshot diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssueKind {
    /// Two peers share an address; only the first gets work.
    DuplicatePeer,
    /// Two work-units share an id; active flags apply to both.
    DuplicateWorkUnit,
    /// An active set id matches no work-unit in the queue.
    UnknownActiveSet,
    /// A pending work-unit's profiles match no peer.
    NoCompatiblePeer,
}

impl ValidationIssue {
    fn new(kind: ValidationIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Checks a snapshot, collecting every issue found.
///
/// # Returns
/// `Ok(())` if the snapshot is clean, `Err(issues)` otherwise.
pub fn validate_snapshot(snapshot: &QueueSnapshot) -> ValidationResult {
    let mut issues = Vec::new();

    let mut addresses = HashSet::new();
    let mut profiles = HashSet::new();
    for peer in &snapshot.peers {
        if !addresses.insert(peer.address.as_str()) {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::DuplicatePeer,
                format!("Duplicate peer address: {}", peer.address),
            ));
        }
        profiles.insert(peer.profile_name());
    }

    let mut set_ids = HashSet::new();
    for job in &snapshot.jobs {
        for set in &job.sets {
            if !set_ids.insert(set.id.as_str()) {
                issues.push(ValidationIssue::new(
                    ValidationIssueKind::DuplicateWorkUnit,
                    format!("Duplicate work-unit id: {}", set.id),
                ));
            }

            if set.is_pending()
                && !snapshot.peers.is_empty()
                && !profiles.iter().any(|p| set.accepts_profile(p))
            {
                issues.push(ValidationIssue::new(
                    ValidationIssueKind::NoCompatiblePeer,
                    format!(
                        "Work-unit '{}' of job '{}' needs one of {:?}; no peer has it",
                        set.id, job.name, set.profiles
                    ),
                ));
            }
        }
    }

    for active in &snapshot.active_sets {
        if !set_ids.contains(active.as_str()) {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::UnknownActiveSet,
                format!("Active set '{active}' is not in the queue"),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
