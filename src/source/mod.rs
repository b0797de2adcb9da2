//! Interfaces to the external I/O layer.
//!
//! The economy core never touches files, networks or the environment. Event
//! tables, persisted snapshots and output tables live behind these traits;
//! their storage format is the implementor's business.

use crate::compile::MatchOutputs;
use crate::domain::{Event, MatchId, SnapshotRecord};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod mock;

pub use mock::MockSource;

/// Source of raw match events.
#[async_trait]
pub trait EventSource: Send + Sync + fmt::Debug {
    /// Fetch every event of a match.
    ///
    /// # Returns
    /// Events ordered by (round_number, tick, event_id). Callers re-sort them,
    /// so implementations may return them as stored.
    async fn fetch_match_events(&self, match_id: &MatchId) -> Result<Vec<Event>, SourceError>;
}

/// Previously persisted snapshots, used as the baseline for verification.
#[async_trait]
pub trait SnapshotStore: Send + Sync + fmt::Debug {
    async fn load_snapshots(&self, match_id: &MatchId) -> Result<Vec<SnapshotRecord>, SourceError>;
}

/// Destination for computed records.
#[async_trait]
pub trait RecordSink: Send + Sync + fmt::Debug {
    /// Persist a match's outputs, replacing anything stored for it before.
    async fn write_outputs(
        &self,
        match_id: &MatchId,
        outputs: &MatchOutputs,
    ) -> Result<(), SourceError>;
}

/// Error type for I/O layer operations.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::NotFound("match m1".to_string());
        assert_eq!(err.to_string(), "Not found: match m1");

        let err = SourceError::Io("disk full".to_string());
        assert_eq!(err.to_string(), "I/O error: disk full");

        let err: SourceError = serde_json::from_str::<Event>("{").unwrap_err().into();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
