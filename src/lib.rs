//! Deterministic round-by-round economy reduction for CS2 match events.

pub mod compile;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod rules;
pub mod source;
pub mod verify;

pub use compile::{BatchCompiler, CompileError, Compiler, MatchOutputs};
pub use config::{Config, ConfigError};
pub use domain::{
    BalancePoint, BalanceRecord, Event, EventKind, MatchId, SnapshotRecord, StateRecord, SteamId,
    Team,
};
pub use engine::{reduce_round, EconState, RoundOutcome};
pub use error::EconError;
pub use orchestration::{Pipeline, PipelineError, RecomputeSummary};
pub use rules::{Money, Rules, STANDARD_RULES, STANDARD_RULES_VERSION};
pub use source::{EventSource, MockSource, RecordSink, SnapshotStore, SourceError};
pub use verify::{verify_match, verify_snapshots, VerificationFailure, VerificationReport};
