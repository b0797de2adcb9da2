use crate::domain::{
    BalancePoint, BalanceRecord, Event, EventKind, MatchId, SnapshotRecord, SteamId, Team,
};
use crate::rules::{Money, Rules};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{snapshot_checksum, sorted_event_ids, EconState, PlayerState, TeamState};

/// Per-team accumulators for a single round. Rebuilt every round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoundMetrics {
    pub spend_sum: Money,
    pub kill_reward_sum: Money,
    pub win_reward: Money,
    pub loss_bonus: Money,
    pub plant_bonus_team: Money,
    pub planter_bonus: Money,
    pub defuse_bonus: Money,
    pub planter: Option<SteamId>,
    pub defuser: Option<SteamId>,
    pub planted: bool,
    pub defused: bool,
    pub won: bool,
    pub win_type: Option<String>,
}

/// Everything a round produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// State to hand to the next round.
    pub state: EconState,
    /// Start records for every player, followed by end records.
    pub balances: Vec<BalanceRecord>,
    /// One per known team, ordered by team label.
    pub snapshots: Vec<SnapshotRecord>,
    pub event_ids: Vec<String>,
}

/// Advance the match economy by one round.
///
/// `events` must all belong to the same `(match_id, round_number)` and be
/// sorted by `(tick, event_id)`. The incoming state is consumed and a new one
/// returned; callers wanting to replay a round keep their own clone.
///
/// An empty round returns the state untouched and emits nothing.
pub fn reduce_round(state: EconState, events: &[Event], rules: &Rules) -> RoundOutcome {
    let Some(first) = events.first() else {
        return RoundOutcome {
            state,
            balances: Vec::new(),
            snapshots: Vec::new(),
            event_ids: Vec::new(),
        };
    };

    let mut reducer = RoundReducer::new(
        first.match_id.clone(),
        first.round_number,
        state,
        events,
        rules,
    );
    reducer.capture_balances(BalancePoint::Start);
    for event in events {
        reducer.process_event(event);
    }
    reducer.apply_zero_income_penalties();
    reducer.apply_round_end_rewards();
    reducer.clamp_banks();
    reducer.capture_balances(BalancePoint::End);
    reducer.into_outcome()
}

/// Working state for one round.
///
/// [`reduce_round`] drives the phases in order; they are exposed separately
/// so the fold can be inspected step by step.
pub struct RoundReducer<'r> {
    rules: &'r Rules,
    match_id: MatchId,
    round_number: u32,
    pub state: EconState,
    pub metrics: BTreeMap<Team, RoundMetrics>,
    event_ids: Vec<String>,
    cap_hits: BTreeMap<SteamId, Money>,
    balances: Vec<BalanceRecord>,
}

impl<'r> RoundReducer<'r> {
    /// Register every actor and team seen in `events`, then open metrics for
    /// every known team.
    pub fn new(
        match_id: MatchId,
        round_number: u32,
        mut state: EconState,
        events: &[Event],
        rules: &'r Rules,
    ) -> Self {
        for event in events {
            if !event.actor_steamid.is_empty() && !state.players.contains_key(&event.actor_steamid)
            {
                state.players.insert(
                    event.actor_steamid.clone(),
                    PlayerState::new(event.actor_steamid.clone(), event.team.clone(), rules),
                );
            }
            if !event.team.is_empty() && !state.teams.contains_key(&event.team) {
                state
                    .teams
                    .insert(event.team.clone(), TeamState::new(event.team.clone()));
            }
        }

        let metrics = state
            .teams
            .keys()
            .map(|team| (team.clone(), RoundMetrics::default()))
            .collect();

        Self {
            rules,
            match_id,
            round_number,
            state,
            metrics,
            event_ids: sorted_event_ids(events),
            cap_hits: BTreeMap::new(),
            balances: Vec::new(),
        }
    }

    /// Apply a single event's in-round effects.
    pub fn process_event(&mut self, event: &Event) {
        if !self.state.players.contains_key(&event.actor_steamid) {
            warn!(
                match_id = %self.match_id,
                round = self.round_number,
                event_id = %event.event_id,
                kind = %event.kind,
                "Skipping event without a known actor"
            );
            return;
        }

        match &event.kind {
            EventKind::Buy => self.handle_buy(event),
            EventKind::Kill => self.handle_kill(event),
            EventKind::Plant => self.handle_plant(event),
            EventKind::Defuse => self.handle_defuse(event),
            EventKind::RoundEnd => self.handle_round_end(event),
            EventKind::DeathAfterTime => self.handle_death_after_time(event),
            EventKind::Unrecognized(kind) => {
                debug!(event_id = %event.event_id, kind = %kind, "Ignoring unmodelled event kind");
            }
        }
    }

    fn player_mut(&mut self, steamid: &SteamId) -> Option<&mut PlayerState> {
        self.state.players.get_mut(steamid)
    }

    /// Debit the bank (never below zero) and add the price to equipment.
    ///
    /// Sums saturate, so a corrupt price cannot overflow.
    fn handle_buy(&mut self, event: &Event) {
        let price = event.price.unwrap_or(0);
        if price <= 0 {
            return;
        }
        if let Some(player) = self.player_mut(&event.actor_steamid) {
            player.bank = player.bank.saturating_sub(price).max(0);
            player.equipment_value = player.equipment_value.saturating_add(price);
        }
        if let Some(metrics) = self.metrics.get_mut(&event.team) {
            metrics.spend_sum = metrics.spend_sum.saturating_add(price);
        }
    }

    /// Credit the weapon's kill reward unless the killer is on zero income.
    fn handle_kill(&mut self, event: &Event) {
        let reward = self
            .rules
            .kill_reward_for(event.weapon.as_deref().unwrap_or(""));
        let Some(player) = self.state.players.get_mut(&event.actor_steamid) else {
            return;
        };
        if player.zero_income_next_round {
            return;
        }
        player.bank = player.bank.saturating_add(reward);
        if let Some(metrics) = self.metrics.get_mut(&event.team) {
            metrics.kill_reward_sum = metrics.kill_reward_sum.saturating_add(reward);
        }
    }

    fn handle_plant(&mut self, event: &Event) {
        if let Some(metrics) = self.metrics.get_mut(&event.team) {
            metrics.planted = true;
            metrics.planter = Some(event.actor_steamid.clone());
        }
    }

    fn handle_defuse(&mut self, event: &Event) {
        if let Some(metrics) = self.metrics.get_mut(&event.team) {
            metrics.defused = true;
            metrics.defuser = Some(event.actor_steamid.clone());
        }
    }

    /// Record the winner and move every team's loss streak.
    ///
    /// A malformed payload counts as empty: nobody wins, so every team's
    /// streak grows.
    fn handle_round_end(&mut self, event: &Event) {
        let payload = match event.round_end_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    match_id = %self.match_id,
                    round = self.round_number,
                    event_id = %event.event_id,
                    error = %e,
                    "Unparsable round_end payload, treating as empty"
                );
                Default::default()
            }
        };
        let winner = payload.winner();

        if let Some(winner) = winner {
            if let Some(metrics) = self.metrics.get_mut(winner) {
                metrics.won = true;
                metrics.win_type = Some(payload.win_type().to_string());
                metrics.win_reward = self.rules.win_reward(payload.win_type());
            }
        }

        for (name, team) in self.state.teams.iter_mut() {
            if Some(name) == winner {
                team.loss_streak = 0;
            } else {
                team.loss_streak = team.loss_streak.saturating_add(1);
            }
        }
    }

    /// Flag the player unless their team has the bomb down.
    fn handle_death_after_time(&mut self, event: &Event) {
        let planted = self
            .metrics
            .get(&event.team)
            .map(|m| m.planted)
            .unwrap_or(false);
        if planted {
            return;
        }
        if let Some(player) = self.player_mut(&event.actor_steamid) {
            player.zero_income_next_round = true;
        }
    }

    /// Zero equipment for flagged players and consume the flag.
    ///
    /// The flag is consumed within the round that set it, so it only ever
    /// suppresses kill rewards earned after the flagging event.
    pub fn apply_zero_income_penalties(&mut self) {
        for player in self.state.players.values_mut() {
            if player.zero_income_next_round {
                player.equipment_value = 0;
                player.zero_income_next_round = false;
            }
        }
    }

    /// Win reward or loss bonus per team, then objective bonuses.
    pub fn apply_round_end_rewards(&mut self) {
        let rules = self.rules;
        let players = &mut self.state.players;

        for (team, metrics) in self.metrics.iter_mut() {
            let team_income = if metrics.won {
                metrics.win_reward
            } else {
                metrics.loss_bonus = rules.loss_bonus(self.state.teams[team].loss_streak);
                metrics.loss_bonus
            };
            credit_team(players, team, team_income);

            if metrics.planted {
                metrics.planter_bonus =
                    credit_objective(players, metrics.planter.as_ref(), rules.objective_bonus);
            }
            if metrics.defused {
                metrics.defuse_bonus =
                    credit_objective(players, metrics.defuser.as_ref(), rules.objective_bonus);
            }

            if team.is_terrorist() && metrics.planted && !metrics.won {
                metrics.plant_bonus_team = rules.plant_team_bonus_on_loss;
                credit_team(players, team, rules.plant_team_bonus_on_loss);
            }
        }
    }

    /// Clamp every bank to `[0, money_cap]`, remembering what was cut off.
    pub fn clamp_banks(&mut self) {
        for (steamid, player) in self.state.players.iter_mut() {
            let before = player.bank;
            player.bank = self.rules.clamp_money(before);
            self.cap_hits
                .insert(steamid.clone(), (before - player.bank).max(0));
        }
    }

    /// Emit a balance record for every known player.
    pub fn capture_balances(&mut self, at: BalancePoint) {
        for (steamid, player) in &self.state.players {
            let cap_hit = match at {
                BalancePoint::Start => 0,
                BalancePoint::End => self.cap_hits.get(steamid).copied().unwrap_or(0),
            };
            self.balances.push(BalanceRecord {
                match_id: self.match_id.clone(),
                round_number: self.round_number,
                player_steamid: steamid.clone(),
                team: player.team.clone(),
                at,
                bank: player.bank,
                equipment_value: player.equipment_value,
                loss_streak: self.state.loss_streak(&player.team),
                cap_hit,
                rules_version: self.rules.version().to_string(),
            });
        }
    }

    fn team_totals(&self, team: &Team, at: BalancePoint) -> (Money, Money) {
        self.balances
            .iter()
            .filter(|b| b.at == at && &b.team == team)
            .fold((0, 0), |(bank, equip), b| {
                (bank.saturating_add(b.bank), equip.saturating_add(b.equipment_value))
            })
    }

    /// Build one snapshot per team and hand back the new state.
    pub fn into_outcome(self) -> RoundOutcome {
        let checksum = snapshot_checksum(&self.event_ids, self.rules.version());

        let snapshots = self
            .metrics
            .iter()
            .map(|(team, metrics)| {
                let (bank_total_start, equip_total_start) =
                    self.team_totals(team, BalancePoint::Start);
                let (bank_total_end, equip_total_end) = self.team_totals(team, BalancePoint::End);
                SnapshotRecord {
                    match_id: self.match_id.clone(),
                    round_number: self.round_number,
                    team: team.clone(),
                    bank_total_start,
                    equip_total_start,
                    spend_sum: metrics.spend_sum,
                    kill_reward_sum: metrics.kill_reward_sum,
                    win_reward: metrics.win_reward,
                    loss_bonus: metrics.loss_bonus,
                    plant_bonus_team: metrics.plant_bonus_team,
                    planter_bonus: metrics.planter_bonus,
                    defuse_bonus: metrics.defuse_bonus,
                    bank_total_end,
                    equip_total_end,
                    inputs_event_ids: self.event_ids.clone(),
                    checksum: checksum.clone(),
                    rules_version: self.rules.version().to_string(),
                }
            })
            .collect();

        debug!(
            match_id = %self.match_id,
            round = self.round_number,
            players = self.state.players.len(),
            teams = self.state.teams.len(),
            "Round reduced"
        );

        RoundOutcome {
            state: self.state,
            balances: self.balances,
            snapshots,
            event_ids: self.event_ids,
        }
    }
}

/// Pay the objective bonus to `actor` unless on zero income. Returns the amount paid.
fn credit_objective(
    players: &mut BTreeMap<SteamId, PlayerState>,
    actor: Option<&SteamId>,
    bonus: Money,
) -> Money {
    let Some(steamid) = actor else {
        return 0;
    };
    let Some(player) = players.get_mut(steamid) else {
        return 0;
    };
    if player.zero_income_next_round {
        return 0;
    }
    player.bank = player.bank.saturating_add(bonus);
    bonus
}

/// Add `amount` to every player of `team` who is not on zero income.
fn credit_team(players: &mut BTreeMap<SteamId, PlayerState>, team: &Team, amount: Money) {
    for player in players.values_mut() {
        if &player.team == team && !player.zero_income_next_round {
            player.bank = player.bank.saturating_add(amount);
        }
    }
}
