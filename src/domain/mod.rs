//! Domain types and determinism layer for the round economy.
//!
//! This module provides:
//! - Domain primitives: MatchId, SteamId, Team
//! - Event with a closed EventKind and the round_end payload
//! - Stable event ordering key helper for deterministic processing
//! - Output records: balances, snapshots, carried state

pub mod event;
pub mod ordering;
pub mod primitives;
pub mod records;

pub use event::{Event, EventKind, RoundEndPayload};
pub use ordering::{sort_events_deterministic, EventOrderingKey};
pub use primitives::{MatchId, SteamId, Team};
pub use records::{BalancePoint, BalanceRecord, SnapshotRecord, StateRecord};
