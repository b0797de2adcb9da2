//! Domain primitives: MatchId, SteamId, Team.

use serde::{Deserialize, Serialize};

/// Match identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        MatchId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player Steam ID. An empty ID means "no actor".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SteamId(pub String);

impl SteamId {
    pub fn new(id: impl Into<String>) -> Self {
        SteamId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SteamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team label. Any label is accepted; the rules only single out "T".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Team(pub String);

impl Team {
    /// Label of the bomb-planting side.
    pub const TERRORIST: &'static str = "T";
    pub const COUNTER_TERRORIST: &'static str = "CT";

    pub fn new(label: impl Into<String>) -> Self {
        Team(label.into())
    }

    pub fn t() -> Self {
        Team::new(Self::TERRORIST)
    }

    pub fn ct() -> Self {
        Team::new(Self::COUNTER_TERRORIST)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_terrorist(&self) -> bool {
        self.0 == Self::TERRORIST
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
