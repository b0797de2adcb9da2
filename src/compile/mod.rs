//! Compile pipeline for turning a match's raw events into derived tables.
//!
//! This module provides:
//! - Round grouping and the sequential round fold for one match
//! - Output assembly: balances, snapshots, lineage state
//! - Concurrent compilation of independent matches

use crate::domain::{BalanceRecord, MatchId, SnapshotRecord, StateRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod batch;
pub mod match_compiler;

pub use batch::{partition_by_match, BatchCompiler};
pub use match_compiler::{round_slices, Compiler};

/// The three record collections produced for a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutputs {
    pub balances: Vec<BalanceRecord>,
    pub snapshots: Vec<SnapshotRecord>,
    pub state: Vec<StateRecord>,
}

impl MatchOutputs {
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty() && self.snapshots.is_empty() && self.state.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("event for match {found} handed to compilation of match {expected}")]
    MixedMatches { expected: MatchId, found: MatchId },
    #[error("round {next} follows round {previous}; rounds must be grouped in ascending order")]
    RoundsOutOfOrder { previous: u32, next: u32 },
    #[error("compilation task failed: {0}")]
    TaskFailed(String),
}
