//! Sequential round fold for a single match.

use super::{CompileError, MatchOutputs};
use crate::domain::Event;
use crate::engine::{reduce_round, EconState};
use crate::rules::Rules;
use tracing::{debug, info};

/// Split a match's events into per-round slices.
///
/// Events must share one match_id and be grouped by round in ascending
/// round order; order inside a round is kept as given.
pub fn round_slices(events: &[Event]) -> Result<Vec<&[Event]>, CompileError> {
    let Some(first) = events.first() else {
        return Ok(Vec::new());
    };

    if let Some(stray) = events.iter().find(|e| e.match_id != first.match_id) {
        return Err(CompileError::MixedMatches {
            expected: first.match_id.clone(),
            found: stray.match_id.clone(),
        });
    }

    let mut rounds = Vec::new();
    let mut start = 0;
    for i in 1..=events.len() {
        let current = events[start].round_number;
        if i < events.len() && events[i].round_number == current {
            continue;
        }
        rounds.push(&events[start..i]);
        if i < events.len() && events[i].round_number < current {
            return Err(CompileError::RoundsOutOfOrder {
                previous: current,
                next: events[i].round_number,
            });
        }
        start = i;
    }
    Ok(rounds)
}

/// Compiler for whole-match economy reduction.
pub struct Compiler;

impl Compiler {
    /// Fold the round reducer over every round of one match.
    ///
    /// State starts empty and is threaded from round to round. An empty event
    /// set yields empty outputs.
    ///
    /// # Errors
    /// Returns an error if the events span several matches or rounds are not
    /// grouped in ascending order.
    pub fn compile_match(events: &[Event], rules: &Rules) -> Result<MatchOutputs, CompileError> {
        let rounds = round_slices(events)?;
        let mut outputs = MatchOutputs::default();
        let Some(match_id) = events.first().map(|e| e.match_id.clone()) else {
            return Ok(outputs);
        };

        let mut state = EconState::new();
        for round in rounds {
            let round_number = round[0].round_number;
            debug!(
                match_id = %match_id,
                round = round_number,
                events = round.len(),
                "Processing round"
            );

            let outcome = reduce_round(state, round, rules);
            outputs.balances.extend(outcome.balances);
            outputs.snapshots.extend(outcome.snapshots);
            outputs
                .state
                .extend(outcome.state.state_records(&match_id, round_number));
            state = outcome.state;
        }

        info!(
            match_id = %match_id,
            rules_version = %rules.version(),
            balances = outputs.balances.len(),
            snapshots = outputs.snapshots.len(),
            state = outputs.state.len(),
            "Match compiled"
        );

        Ok(outputs)
    }
}
