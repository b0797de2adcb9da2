//! Pure computation engine for the round-by-round economy.

use crate::domain::{MatchId, SteamId, StateRecord, Team};
use crate::rules::{Money, Rules};
use std::collections::BTreeMap;

pub mod checksum;
pub mod round_reducer;

pub use checksum::{snapshot_checksum, sorted_event_ids};
pub use round_reducer::{reduce_round, RoundMetrics, RoundOutcome, RoundReducer};

/// Economy state of a single player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub steamid: SteamId,
    /// Team at first appearance.
    pub team: Team,
    /// Within `[0, money_cap]` after the end-of-round clamp; unconstrained mid-round.
    pub bank: Money,
    /// Sum of buy prices since the last reset.
    pub equipment_value: Money,
    pub zero_income_next_round: bool,
}

impl PlayerState {
    pub fn new(steamid: SteamId, team: Team, rules: &Rules) -> Self {
        Self {
            steamid,
            team,
            bank: rules.start_money,
            equipment_value: 0,
            zero_income_next_round: false,
        }
    }
}

/// Economy state of a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamState {
    pub team: Team,
    pub loss_streak: u32,
}

impl TeamState {
    pub fn new(team: Team) -> Self {
        Self {
            team,
            loss_streak: 0,
        }
    }
}

/// Everything carried from one round to the next.
///
/// Maps are ordered so every iteration, and therefore every emitted record
/// sequence, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EconState {
    pub teams: BTreeMap<Team, TeamState>,
    pub players: BTreeMap<SteamId, PlayerState>,
}

impl EconState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty() && self.players.is_empty()
    }

    pub fn loss_streak(&self, team: &Team) -> u32 {
        self.teams.get(team).map(|t| t.loss_streak).unwrap_or(0)
    }

    /// Lineage rows: one per team, then one per player.
    pub fn state_records(&self, match_id: &MatchId, round_number: u32) -> Vec<StateRecord> {
        let teams = self.teams.values().map(|t| {
            StateRecord::for_team(match_id.clone(), round_number, t.team.clone(), t.loss_streak)
        });
        let players = self.players.values().map(|p| {
            StateRecord::for_player(
                match_id.clone(),
                round_number,
                p.steamid.clone(),
                p.zero_income_next_round,
            )
        });
        teams.chain(players).collect()
    }
}
