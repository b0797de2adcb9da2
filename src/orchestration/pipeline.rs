use crate::compile::{BatchCompiler, CompileError, Compiler, MatchOutputs};
use crate::config::Config;
use crate::domain::{sort_events_deterministic, Event, MatchId, SnapshotRecord};
use crate::rules::Rules;
use crate::source::{EventSource, RecordSink, SnapshotStore, SourceError};
use crate::verify::{verify_snapshots, VerificationReport};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Record counts from a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecomputeSummary {
    pub events: usize,
    pub balances: usize,
    pub snapshots: usize,
    pub state: usize,
}

impl RecomputeSummary {
    fn new(events: usize, outputs: &MatchOutputs) -> Self {
        Self {
            events,
            balances: outputs.balances.len(),
            snapshots: outputs.snapshots.len(),
            state: outputs.state.len(),
        }
    }
}

/// Wires the economy core to an event source, a snapshot store and a sink.
#[derive(Debug, Clone)]
pub struct Pipeline {
    events: Arc<dyn EventSource>,
    snapshots: Arc<dyn SnapshotStore>,
    sink: Arc<dyn RecordSink>,
    rules: Arc<Rules>,
    max_concurrent_matches: usize,
}

impl Pipeline {
    pub fn new(
        events: Arc<dyn EventSource>,
        snapshots: Arc<dyn SnapshotStore>,
        sink: Arc<dyn RecordSink>,
        config: &Config,
    ) -> Self {
        Self {
            events,
            snapshots,
            sink,
            rules: Arc::new(config.rules()),
            max_concurrent_matches: config.max_concurrent_matches,
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Load a match's events in deterministic order.
    async fn load_events(&self, match_id: &MatchId) -> Result<Vec<Event>, PipelineError> {
        let mut events = self.events.fetch_match_events(match_id).await?;
        sort_events_deterministic(&mut events);
        Ok(events)
    }

    /// Recompute a match from raw events and hand the outputs to the sink.
    pub async fn recompute(&self, match_id: &MatchId) -> Result<RecomputeSummary, PipelineError> {
        let events = self.load_events(match_id).await?;
        if events.is_empty() {
            return Err(PipelineError::NoEvents(match_id.clone()));
        }

        let outputs = Compiler::compile_match(&events, &self.rules)?;
        self.sink.write_outputs(match_id, &outputs).await?;

        let summary = RecomputeSummary::new(events.len(), &outputs);
        tracing::info!(
            match_id = %match_id,
            events = summary.events,
            balances = summary.balances,
            snapshots = summary.snapshots,
            state = summary.state,
            "Economic data recomputed"
        );
        Ok(summary)
    }

    /// Recompute several independent matches, compiling them concurrently.
    pub async fn recompute_many(
        &self,
        match_ids: &[MatchId],
    ) -> Result<Vec<RecomputeSummary>, PipelineError> {
        let loads = match_ids.iter().map(|id| self.load_events(id));
        let mut all_events = Vec::new();
        for (id, events) in match_ids.iter().zip(try_join_all(loads).await?) {
            if events.is_empty() {
                return Err(PipelineError::NoEvents(id.clone()));
            }
            all_events.push(events);
        }

        let event_counts: Vec<usize> = all_events.iter().map(Vec::len).collect();
        let batch = BatchCompiler::new((*self.rules).clone(), self.max_concurrent_matches);
        let outputs = batch.compile_all(all_events).await?;

        let mut summaries = Vec::with_capacity(outputs.len());
        for ((id, output), events) in match_ids.iter().zip(&outputs).zip(event_counts) {
            self.sink.write_outputs(id, output).await?;
            summaries.push(RecomputeSummary::new(events, output));
        }
        Ok(summaries)
    }

    /// Recompute a match and compare against its persisted snapshots.
    ///
    /// Mismatches are reported, not raised; use
    /// [`VerificationReport::is_ok`] to decide the outcome.
    pub async fn verify(&self, match_id: &MatchId) -> Result<VerificationReport, PipelineError> {
        let persisted = self.snapshots.load_snapshots(match_id).await?;
        if persisted.is_empty() {
            return Err(PipelineError::NoSnapshots(match_id.clone()));
        }

        let events = self.load_events(match_id).await?;
        let fresh = Compiler::compile_match(&events, &self.rules)?;
        Ok(verify_snapshots(&persisted, &fresh.snapshots))
    }

    /// Split a mixed event stream by match and recompute each match.
    pub async fn recompute_stream(
        &self,
        mut events: Vec<Event>,
    ) -> Result<Vec<(MatchId, RecomputeSummary)>, PipelineError> {
        sort_events_deterministic(&mut events);
        let mut counts: BTreeMap<MatchId, usize> = BTreeMap::new();
        for event in &events {
            *counts.entry(event.match_id.clone()).or_default() += 1;
        }

        let batch = BatchCompiler::new((*self.rules).clone(), self.max_concurrent_matches);
        let compiled = batch.compile_stream(events).await?;

        let mut summaries = Vec::with_capacity(compiled.len());
        for (id, output) in compiled {
            self.sink.write_outputs(&id, &output).await?;
            let count = counts.get(&id).copied().unwrap_or(0);
            summaries.push((id, RecomputeSummary::new(count, &output)));
        }
        Ok(summaries)
    }

    /// Persisted snapshots for a match, optionally narrowed to one round.
    pub async fn export(
        &self,
        match_id: &MatchId,
        round: Option<u32>,
    ) -> Result<Vec<SnapshotRecord>, PipelineError> {
        let mut snapshots = self.snapshots.load_snapshots(match_id).await?;
        if let Some(round) = round {
            snapshots.retain(|s| s.round_number == round);
        }
        if snapshots.is_empty() {
            return Err(PipelineError::NoSnapshots(match_id.clone()));
        }

        tracing::debug!(
            match_id = %match_id,
            round = ?round,
            snapshots = snapshots.len(),
            "Snapshots exported"
        );
        Ok(snapshots)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No events found for match {0}")]
    NoEvents(MatchId),
    #[error("No persisted snapshots found for match {0}")]
    NoSnapshots(MatchId),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, SteamId, Team};
    use crate::source::MockSource;
    use serde_json::json;

    fn ev(
        match_id: &str,
        round: u32,
        tick: i64,
        id: &str,
        kind: EventKind,
        actor: &str,
        team: &str,
    ) -> Event {
        Event::new(
            MatchId::new(match_id),
            round,
            tick,
            id,
            kind,
            SteamId::new(actor),
            Team::new(team),
        )
    }

    fn match_events(match_id: &str) -> Vec<Event> {
        vec![
            // Deliberately out of order; the pipeline sorts.
            ev(match_id, 1, 900, "e3", EventKind::RoundEnd, "t1", "T")
                .with_payload(json!({"winner": "T", "win_type": "elimination"})),
            ev(match_id, 1, 10, "e1", EventKind::Buy, "t1", "T").with_price(650),
            ev(match_id, 1, 500, "e2", EventKind::Kill, "t1", "T").with_weapon("glock"),
            ev(match_id, 2, 10, "e4", EventKind::Buy, "ct1", "CT").with_price(1000),
        ]
    }

    fn pipeline(mock: &MockSource, config: &Config) -> Pipeline {
        let mock = Arc::new(mock.clone());
        Pipeline::new(mock.clone(), mock.clone(), mock, config)
    }

    #[tokio::test]
    async fn test_recompute_writes_outputs() {
        let mock = MockSource::new().with_events(match_events("m1"));
        let pipeline = pipeline(&mock, &Config::default());
        let match_id = MatchId::new("m1");

        let summary = pipeline.recompute(&match_id).await.unwrap();
        assert_eq!(summary.events, 4);
        assert_eq!(summary.snapshots, 1 + 2);

        let written = mock.written(&match_id).unwrap();
        assert_eq!(written.balances.len(), summary.balances);
        let round1 = &written.snapshots[0];
        assert_eq!(round1.inputs_event_ids, vec!["e1", "e2", "e3"]);
        assert_eq!(round1.spend_sum, 650);
        assert_eq!(round1.kill_reward_sum, 300);
        assert_eq!(round1.win_reward, 3250);
    }

    #[tokio::test]
    async fn test_recompute_without_events_fails() {
        let mock = MockSource::new();
        let pipeline = pipeline(&mock, &Config::default());
        let result = pipeline.recompute(&MatchId::new("nope")).await;
        assert!(matches!(result, Err(PipelineError::NoEvents(_))));
    }

    #[tokio::test]
    async fn test_verify_after_recompute_is_clean() {
        let mock = MockSource::new().with_events(match_events("m1"));
        let pipeline = pipeline(&mock, &Config::default());
        let match_id = MatchId::new("m1");

        pipeline.recompute(&match_id).await.unwrap();
        let report = pipeline.verify(&match_id).await.unwrap();
        assert!(report.is_ok());
        assert_eq!(report.checked, 3);
    }

    #[tokio::test]
    async fn test_verify_without_snapshots_fails() {
        let mock = MockSource::new().with_events(match_events("m1"));
        let pipeline = pipeline(&mock, &Config::default());
        let result = pipeline.verify(&MatchId::new("m1")).await;
        assert!(matches!(result, Err(PipelineError::NoSnapshots(_))));
    }

    #[tokio::test]
    async fn test_verify_detects_rules_drift() {
        let mock = MockSource::new().with_events(match_events("m1"));
        let match_id = MatchId::new("m1");
        pipeline(&mock, &Config::default())
            .recompute(&match_id)
            .await
            .unwrap();

        let drifted = Config {
            rules_version: "2025_10".to_string(),
            ..Config::default()
        };
        let report = pipeline(&mock, &drifted).verify(&match_id).await.unwrap();
        assert_eq!(report.failure_count(), 3);
    }

    #[tokio::test]
    async fn test_recompute_many_and_stream_agree() {
        let mut events = match_events("m1");
        events.extend(match_events("m2"));
        let mock = MockSource::new().with_events(events.clone());
        let pipeline = pipeline(&mock, &Config::default());

        let ids = vec![MatchId::new("m1"), MatchId::new("m2")];
        let many = pipeline.recompute_many(&ids).await.unwrap();
        let stream = pipeline.recompute_stream(events).await.unwrap();

        assert_eq!(many.len(), 2);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream[0].0, ids[0]);
        assert_eq!(many[0], stream[0].1);
        assert_eq!(many[1], stream[1].1);
    }

    #[tokio::test]
    async fn test_export_filters_by_round() {
        let mock = MockSource::new().with_events(match_events("m1"));
        let pipeline = pipeline(&mock, &Config::default());
        let match_id = MatchId::new("m1");
        pipeline.recompute(&match_id).await.unwrap();

        let all = pipeline.export(&match_id, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let round2 = pipeline.export(&match_id, Some(2)).await.unwrap();
        assert_eq!(round2.len(), 2);
        assert!(round2.iter().all(|s| s.round_number == 2));
    }

    #[tokio::test]
    async fn test_export_of_missing_round_fails() {
        let seeded = Compiler::compile_match(&match_events("m1"), &Rules::standard())
            .unwrap()
            .snapshots;
        let mock = MockSource::new().with_snapshots(MatchId::new("m1"), seeded);
        let pipeline = pipeline(&mock, &Config::default());

        let round1 = pipeline.export(&MatchId::new("m1"), Some(1)).await.unwrap();
        assert_eq!(round1.len(), 1);

        let result = pipeline.export(&MatchId::new("m1"), Some(7)).await;
        assert!(matches!(result, Err(PipelineError::NoSnapshots(_))));
        let result = pipeline.export(&MatchId::new("m2"), None).await;
        assert!(matches!(result, Err(PipelineError::NoSnapshots(_))));
    }
}
