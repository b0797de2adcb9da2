//! Checksum verification of persisted snapshots against a fresh recompute.

use crate::compile::{CompileError, Compiler};
use crate::domain::{Event, SnapshotRecord, Team};
use crate::engine::snapshot_checksum;
use crate::error::EconError;
use crate::rules::Rules;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Why a persisted snapshot failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationFailure {
    /// No recomputed snapshot for this round and team.
    Missing { round_number: u32, team: Team },
    ChecksumMismatch {
        round_number: u32,
        team: Team,
        expected: String,
        actual: String,
    },
}

/// Outcome of comparing persisted snapshots with recomputed ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Number of persisted snapshots examined.
    pub checked: usize,
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn a report with failures into [`EconError::VerificationFailed`].
    pub fn into_result(self) -> Result<Self, EconError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(EconError::VerificationFailed(self.failure_count()))
        }
    }
}

/// Compare each persisted snapshot with the fresh one for the same
/// `(round_number, team)`.
pub fn verify_snapshots(
    persisted: &[SnapshotRecord],
    fresh: &[SnapshotRecord],
) -> VerificationReport {
    let index: HashMap<(u32, &Team), &SnapshotRecord> =
        fresh.iter().map(|s| (s.key(), s)).collect();

    let mut report = VerificationReport {
        checked: persisted.len(),
        failures: Vec::new(),
    };

    for old in persisted {
        let failure = match index.get(&old.key()) {
            None => VerificationFailure::Missing {
                round_number: old.round_number,
                team: old.team.clone(),
            },
            Some(new) if new.checksum != old.checksum => VerificationFailure::ChecksumMismatch {
                round_number: old.round_number,
                team: old.team.clone(),
                expected: old.checksum.clone(),
                actual: new.checksum.clone(),
            },
            Some(_) => continue,
        };
        warn!(match_id = %old.match_id, failure = ?failure, "Snapshot verification failure");
        report.failures.push(failure);
    }

    info!(
        checked = report.checked,
        failures = report.failure_count(),
        "Snapshot verification finished"
    );
    report
}

/// Recompute a match from its raw events and verify the persisted snapshots.
///
/// # Errors
/// Returns an error only if the events cannot be compiled.
pub fn verify_match(
    persisted: &[SnapshotRecord],
    events: &[Event],
    rules: &Rules,
) -> Result<VerificationReport, CompileError> {
    let fresh = Compiler::compile_match(events, rules)?;
    Ok(verify_snapshots(persisted, &fresh.snapshots))
}

/// Whether a snapshot's checksum matches its own recorded inputs.
///
/// Catches edits to a persisted row without needing the raw events.
pub fn checksum_is_self_consistent(snapshot: &SnapshotRecord) -> bool {
    let mut ids = snapshot.inputs_event_ids.clone();
    ids.sort();
    snapshot_checksum(&ids, &snapshot.rules_version) == snapshot.checksum
}
