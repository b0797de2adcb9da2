//! Raw economy events as handed over by the ingestion layer.

use crate::domain::{MatchId, SteamId, Team};
use crate::rules::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of an economy event, serialized as the lowercase `type` string.
///
/// Strings the reducer does not model are kept verbatim in
/// [`EventKind::Unrecognized`] so they survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Buy,
    Kill,
    Plant,
    Defuse,
    RoundEnd,
    DeathAfterTime,
    Unrecognized(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Buy => "buy",
            EventKind::Kill => "kill",
            EventKind::Plant => "plant",
            EventKind::Defuse => "defuse",
            EventKind::RoundEnd => "round_end",
            EventKind::DeathAfterTime => "death_after_time",
            EventKind::Unrecognized(other) => other,
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "buy" => EventKind::Buy,
            "kill" => EventKind::Kill,
            "plant" => EventKind::Plant,
            "defuse" => EventKind::Defuse,
            "round_end" => EventKind::RoundEnd,
            "death_after_time" => EventKind::DeathAfterTime,
            _ => EventKind::Unrecognized(value),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Unrecognized(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single economy-relevant occurrence inside a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub match_id: MatchId,
    pub round_number: u32,
    /// In-round time ordinal.
    pub tick: i64,
    /// Unique, stable and sortable identifier.
    pub event_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub actor_steamid: SteamId,
    #[serde(default)]
    pub victim_steamid: Option<SteamId>,
    #[serde(default)]
    pub team: Team,
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    /// Explicit money delta when the source recorded one. Informational only.
    #[serde(default)]
    pub amount: Option<Money>,
    /// Structured payload; `round_end` carries `winner` and `win_type` here.
    /// Persisted tables store it as a JSON string, which is accepted too.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_ingested: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(
        match_id: MatchId,
        round_number: u32,
        tick: i64,
        event_id: impl Into<String>,
        kind: EventKind,
        actor_steamid: SteamId,
        team: Team,
    ) -> Self {
        Event {
            match_id,
            round_number,
            tick,
            event_id: event_id.into(),
            kind,
            actor_steamid,
            victim_steamid: None,
            team,
            weapon: None,
            price: None,
            amount: None,
            payload: None,
            ingest_source: None,
            ts_ingested: None,
        }
    }

    pub fn with_weapon(mut self, weapon: impl Into<String>) -> Self {
        self.weapon = Some(weapon.into());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_victim(mut self, victim: SteamId) -> Self {
        self.victim_steamid = Some(victim);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Decode the `round_end` payload.
    ///
    /// A missing payload decodes to an empty one. A JSON string payload is
    /// parsed first. Errors are returned so the caller can decide to absorb
    /// them.
    pub fn round_end_payload(&self) -> Result<RoundEndPayload, serde_json::Error> {
        match &self.payload {
            None | Some(serde_json::Value::Null) => Ok(RoundEndPayload::default()),
            Some(serde_json::Value::String(raw)) => serde_json::from_str(raw),
            Some(value) => serde_json::from_value(value.clone()),
        }
    }
}

/// Outcome details attached to a `round_end` event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundEndPayload {
    #[serde(default)]
    pub winner: Option<Team>,
    #[serde(default)]
    pub win_type: Option<String>,
}

impl RoundEndPayload {
    /// Winning team, ignoring empty labels.
    pub fn winner(&self) -> Option<&Team> {
        self.winner.as_ref().filter(|team| !team.is_empty())
    }

    pub fn win_type(&self) -> &str {
        self.win_type.as_deref().unwrap_or("")
    }
}
