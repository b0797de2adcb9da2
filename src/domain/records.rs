//! Output records handed to the persistence layer.

use crate::domain::{MatchId, SteamId, Team};
use crate::rules::Money;
use serde::{Deserialize, Serialize};

/// Point in the round at which a balance was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalancePoint {
    Start,
    End,
}

impl std::fmt::Display for BalancePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalancePoint::Start => write!(f, "start"),
            BalancePoint::End => write!(f, "end"),
        }
    }
}

/// A player's balance at the start or end of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub match_id: MatchId,
    pub round_number: u32,
    pub player_steamid: SteamId,
    pub team: Team,
    pub at: BalancePoint,
    pub bank: Money,
    pub equipment_value: Money,
    /// The team's loss streak at capture time.
    pub loss_streak: u32,
    /// Amount removed by the end-of-round clamp. Always zero for `start`.
    pub cap_hit: Money,
    pub rules_version: String,
}

/// Checksummed team economy summary for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub match_id: MatchId,
    pub round_number: u32,
    pub team: Team,
    pub bank_total_start: Money,
    pub equip_total_start: Money,
    pub spend_sum: Money,
    pub kill_reward_sum: Money,
    pub win_reward: Money,
    pub loss_bonus: Money,
    pub plant_bonus_team: Money,
    pub planter_bonus: Money,
    pub defuse_bonus: Money,
    pub bank_total_end: Money,
    pub equip_total_end: Money,
    /// Sorted ids of every event in the round.
    pub inputs_event_ids: Vec<String>,
    /// Hex SHA-256 over the sorted ids and the rules version.
    pub checksum: String,
    pub rules_version: String,
}

impl SnapshotRecord {
    /// Key used to match persisted and recomputed snapshots.
    pub fn key(&self) -> (u32, &Team) {
        (self.round_number, &self.team)
    }
}

/// Carried state after a round, for lineage only.
///
/// Team rows set `team` and `loss_streak_after`; player rows set
/// `player_steamid` and `zero_income_next_round`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub match_id: MatchId,
    pub round_number: u32,
    pub team: Option<Team>,
    pub player_steamid: Option<SteamId>,
    pub loss_streak_after: Option<u32>,
    pub zero_income_next_round: Option<bool>,
}

impl StateRecord {
    pub fn for_team(match_id: MatchId, round_number: u32, team: Team, loss_streak: u32) -> Self {
        StateRecord {
            match_id,
            round_number,
            team: Some(team),
            player_steamid: None,
            loss_streak_after: Some(loss_streak),
            zero_income_next_round: None,
        }
    }

    pub fn for_player(
        match_id: MatchId,
        round_number: u32,
        player: SteamId,
        zero_income_next_round: bool,
    ) -> Self {
        StateRecord {
            match_id,
            round_number,
            team: None,
            player_steamid: Some(player),
            loss_streak_after: None,
            zero_income_next_round: Some(zero_income_next_round),
        }
    }
}
