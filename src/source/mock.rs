//! In-memory I/O layer for testing without storage.

use super::{EventSource, RecordSink, SnapshotStore, SourceError};
use crate::compile::MatchOutputs;
use crate::domain::{Event, MatchId, SnapshotRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock source and sink backed by memory.
///
/// Outputs written through [`RecordSink`] become the persisted snapshots
/// served by [`SnapshotStore`], so a recompute followed by a verify behaves
/// like it would against real storage.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    events: Vec<Event>,
    outputs: Arc<Mutex<HashMap<MatchId, MatchOutputs>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the mock source.
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    /// Add multiple events to the mock source.
    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events.extend(events);
        self
    }

    /// Seed persisted snapshots for a match.
    pub fn with_snapshots(self, match_id: MatchId, snapshots: Vec<SnapshotRecord>) -> Self {
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.entry(match_id).or_default().snapshots = snapshots;
        }
        self
    }

    /// Outputs last written for a match.
    pub fn written(&self, match_id: &MatchId) -> Option<MatchOutputs> {
        self.outputs
            .lock()
            .ok()
            .and_then(|outputs| outputs.get(match_id).cloned())
    }

    /// Replace persisted snapshots, e.g. to simulate tampering.
    pub fn overwrite_snapshots(&self, match_id: &MatchId, snapshots: Vec<SnapshotRecord>) {
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.entry(match_id.clone()).or_default().snapshots = snapshots;
        }
    }
}

#[async_trait]
impl EventSource for MockSource {
    async fn fetch_match_events(&self, match_id: &MatchId) -> Result<Vec<Event>, SourceError> {
        Ok(self
            .events
            .iter()
            .filter(|e| &e.match_id == match_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SnapshotStore for MockSource {
    async fn load_snapshots(&self, match_id: &MatchId) -> Result<Vec<SnapshotRecord>, SourceError> {
        let outputs = self
            .outputs
            .lock()
            .map_err(|e| SourceError::Other(e.to_string()))?;
        Ok(outputs
            .get(match_id)
            .map(|o| o.snapshots.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RecordSink for MockSource {
    async fn write_outputs(
        &self,
        match_id: &MatchId,
        outputs: &MatchOutputs,
    ) -> Result<(), SourceError> {
        let mut stored = self
            .outputs
            .lock()
            .map_err(|e| SourceError::Other(e.to_string()))?;
        stored.insert(match_id.clone(), outputs.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, SteamId, Team};

    fn make_event(match_id: &str, id: &str) -> Event {
        Event::new(
            MatchId::new(match_id),
            1,
            0,
            id,
            EventKind::Buy,
            SteamId::new("p1"),
            Team::t(),
        )
    }

    #[tokio::test]
    async fn test_mock_fetch_filters_by_match() {
        let mock = MockSource::new()
            .with_event(make_event("m1", "a"))
            .with_events(vec![make_event("m2", "b"), make_event("m1", "c")]);

        let events = mock.fetch_match_events(&MatchId::new("m1")).await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_written_outputs_become_persisted_snapshots() {
        let mock = MockSource::new();
        let match_id = MatchId::new("m1");
        assert!(mock.load_snapshots(&match_id).await.unwrap().is_empty());

        let outputs = crate::compile::Compiler::compile_match(
            &[make_event("m1", "a").with_price(100)],
            &crate::rules::Rules::standard(),
        )
        .unwrap();
        mock.write_outputs(&match_id, &outputs).await.unwrap();

        assert_eq!(mock.load_snapshots(&match_id).await.unwrap(), outputs.snapshots);
        assert_eq!(mock.written(&match_id), Some(outputs));
    }
}
