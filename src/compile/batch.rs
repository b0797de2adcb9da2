//! Concurrent compilation of independent matches.
//!
//! Rounds within a match form a strict chain, so the unit of parallelism is
//! the match. Each match gets its own state; nothing is shared but the
//! read-only rules.

use super::{CompileError, Compiler, MatchOutputs};
use crate::domain::{Event, MatchId};
use crate::rules::Rules;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Split a mixed event stream by match, keeping relative order within each match.
pub fn partition_by_match(events: Vec<Event>) -> BTreeMap<MatchId, Vec<Event>> {
    let mut matches: BTreeMap<MatchId, Vec<Event>> = BTreeMap::new();
    for event in events {
        matches.entry(event.match_id.clone()).or_default().push(event);
    }
    matches
}

#[derive(Debug, Clone)]
pub struct BatchCompiler {
    rules: Arc<Rules>,
    max_concurrency: usize,
}

impl BatchCompiler {
    /// `max_concurrency` is clamped to at least one.
    pub fn new(rules: Rules, max_concurrency: usize) -> Self {
        Self {
            rules: Arc::new(rules),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Compile every match on the blocking pool, at most `max_concurrency`
    /// at a time. Results are returned in input order.
    ///
    /// # Errors
    /// Fails on the first match that fails to compile or whose worker task
    /// could not complete.
    pub async fn compile_all(
        &self,
        matches: Vec<Vec<Event>>,
    ) -> Result<Vec<MatchOutputs>, CompileError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let tasks = matches.into_iter().map(|events| {
            let rules = Arc::clone(&self.rules);
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| CompileError::TaskFailed(e.to_string()))?;
                tokio::task::spawn_blocking(move || Compiler::compile_match(&events, &rules))
                    .await
                    .map_err(|e| CompileError::TaskFailed(e.to_string()))?
            }
        });

        try_join_all(tasks).await
    }

    /// Partition a mixed stream by match and compile each one.
    pub async fn compile_stream(
        &self,
        events: Vec<Event>,
    ) -> Result<BTreeMap<MatchId, MatchOutputs>, CompileError> {
        let (ids, matches): (Vec<MatchId>, Vec<Vec<Event>>) =
            partition_by_match(events).into_iter().unzip();
        let outputs = self.compile_all(matches).await?;
        Ok(ids.into_iter().zip(outputs).collect())
    }
}
