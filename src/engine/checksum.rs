//! Snapshot checksums.

use crate::domain::Event;
use sha2::{Digest, Sha256};

/// Sorted ids of the given events.
pub fn sorted_event_ids(events: &[Event]) -> Vec<String> {
    let mut ids: Vec<String> = events.iter().map(|e| e.event_id.clone()).collect();
    ids.sort();
    ids
}

/// Hex SHA-256 of the concatenated sorted event ids followed by the rules version.
///
/// Callers pass ids already sorted; the digest depends on nothing else.
pub fn snapshot_checksum<S: AsRef<str>>(sorted_ids: &[S], rules_version: &str) -> String {
    let mut hasher = Sha256::new();
    for id in sorted_ids {
        hasher.update(id.as_ref().as_bytes());
    }
    hasher.update(rules_version.as_bytes());
    hex::encode(hasher.finalize())
}
