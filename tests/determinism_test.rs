//! Determinism, checksum and verification properties across whole matches.

use cs2econ::compile::{BatchCompiler, Compiler, MatchOutputs};
use cs2econ::config::Config;
use cs2econ::domain::{sort_events_deterministic, Event, EventKind, MatchId, SteamId, Team};
use cs2econ::orchestration::Pipeline;
use cs2econ::rules::Rules;
use cs2econ::source::MockSource;
use cs2econ::verify::{checksum_is_self_consistent, verify_match, VerificationFailure};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

// =============================================================================
// Fixtures
// =============================================================================

fn event(match_id: &str, round: u32, tick: i64, kind: EventKind, actor: &str, team: &str) -> Event {
    Event::new(
        MatchId::new(match_id),
        round,
        tick,
        format!("{}-r{}-t{}", match_id, round, tick),
        kind,
        SteamId::new(actor),
        Team::new(team),
    )
}

/// A few rounds touching every event kind.
fn sample_match(match_id: &str) -> Vec<Event> {
    let mut events = Vec::new();
    for round in 1..=4u32 {
        let winner = if round % 2 == 0 { "T" } else { "CT" };
        let win_type = if round % 2 == 0 { "bomb_explosion" } else { "defuse" };
        events.push(event(match_id, round, 10, EventKind::Buy, "t1", "T").with_price(2700));
        events.push(event(match_id, round, 11, EventKind::Buy, "t2", "T").with_price(650));
        events.push(event(match_id, round, 12, EventKind::Buy, "ct1", "CT").with_price(3100));
        events.push(event(match_id, round, 13, EventKind::Buy, "ct2", "CT").with_price(500));
        events.push(
            event(match_id, round, 40, EventKind::Kill, "t1", "T")
                .with_weapon("ak47")
                .with_victim(SteamId::new("ct2")),
        );
        events.push(event(match_id, round, 50, EventKind::Kill, "ct1", "CT").with_weapon("mp9"));
        events.push(event(match_id, round, 60, EventKind::Plant, "t2", "T"));
        if winner == "CT" {
            events.push(event(match_id, round, 70, EventKind::Defuse, "ct1", "CT"));
        }
        events.push(
            event(match_id, round, 90, EventKind::RoundEnd, "ct1", "CT")
                .with_payload(json!({"winner": winner, "win_type": win_type})),
        );
    }
    events
}

fn compile(events: &[Event], rules: &Rules) -> MatchOutputs {
    Compiler::compile_match(events, rules).unwrap()
}

fn checksums(outputs: &MatchOutputs) -> HashMap<(u32, Team), String> {
    outputs
        .snapshots
        .iter()
        .map(|s| ((s.round_number, s.team.clone()), s.checksum.clone()))
        .collect()
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn two_reductions_are_byte_identical() {
    let rules = Rules::standard();
    let events = sample_match("m1");

    let first = serde_json::to_vec(&compile(&events, &rules)).unwrap();
    let second = serde_json::to_vec(&compile(&events, &rules)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn shuffling_within_a_round_keeps_checksums() {
    let rules = Rules::standard();
    let events = sample_match("m1");

    let mut shuffled = Vec::new();
    for round in 1..=4u32 {
        let mut group: Vec<Event> = events
            .iter()
            .filter(|e| e.round_number == round)
            .cloned()
            .collect();
        group.reverse();
        group.rotate_left(2);
        shuffled.extend(group);
    }
    assert_ne!(shuffled, events);

    let original = checksums(&compile(&events, &rules));
    let reordered = checksums(&compile(&shuffled, &rules));
    assert_eq!(original, reordered);
}

#[test]
fn sorting_restores_the_canonical_order() {
    let mut events = sample_match("m1");
    let canonical = events.clone();
    events.reverse();
    sort_events_deterministic(&mut events);
    assert_eq!(events, canonical);
}

#[test]
fn snapshot_checksums_cover_their_own_inputs() {
    let outputs = compile(&sample_match("m1"), &Rules::standard());
    assert_eq!(outputs.snapshots.len(), 4 * 2);
    for snapshot in &outputs.snapshots {
        assert_eq!(snapshot.checksum.len(), 64);
        assert!(checksum_is_self_consistent(snapshot));
    }
}

// =============================================================================
// Rules versioning
// =============================================================================

#[test]
fn version_bump_changes_every_checksum_but_no_amounts() {
    let standard = Rules::standard();
    let mut bumped = Rules::standard();
    bumped.version = "2025_09_hotfix".into();

    let events = sample_match("m1");
    let before = compile(&events, &standard);
    let after = compile(&events, &bumped);

    assert_eq!(before.snapshots.len(), after.snapshots.len());
    for (old, new) in before.snapshots.iter().zip(&after.snapshots) {
        assert_ne!(old.checksum, new.checksum);
        assert_eq!(new.rules_version, "2025_09_hotfix");
        assert_eq!(old.bank_total_end, new.bank_total_end);
        assert_eq!(old.spend_sum, new.spend_sum);
        assert_eq!(old.win_reward, new.win_reward);
        assert_eq!(old.loss_bonus, new.loss_bonus);
    }

    let report = verify_match(&before.snapshots, &events, &bumped).unwrap();
    assert_eq!(report.failure_count(), before.snapshots.len());
}

#[test]
fn added_event_fails_only_its_round() {
    let rules = Rules::standard();
    let events = sample_match("m1");
    let persisted = compile(&events, &rules).snapshots;

    let mut mutated = events.clone();
    mutated.push(event("m1", 4, 95, EventKind::Buy, "t1", "T").with_price(200));
    let report = verify_match(&persisted, &mutated, &rules).unwrap();

    assert_eq!(report.failure_count(), 2);
    assert!(report.failures.iter().all(|f| matches!(
        f,
        VerificationFailure::ChecksumMismatch { round_number: 4, .. }
    )));
}

// =============================================================================
// Batch and pipeline
// =============================================================================

#[tokio::test]
async fn batch_compile_matches_sequential() {
    let rules = Rules::standard();
    let matches: Vec<Vec<Event>> = ["m1", "m2", "m3"].iter().map(|id| sample_match(id)).collect();
    let sequential: Vec<MatchOutputs> = matches.iter().map(|m| compile(m, &rules)).collect();

    let batch = BatchCompiler::new(rules, 2);
    let concurrent = batch.compile_all(matches).await.unwrap();
    assert_eq!(sequential, concurrent);
}

#[tokio::test]
async fn verify_twice_reports_the_same_failures() {
    let mock = MockSource::new().with_events(sample_match("m1"));
    let source = Arc::new(mock.clone());
    let pipeline = Pipeline::new(source.clone(), source.clone(), source, &Config::default());
    let match_id = MatchId::new("m1");

    pipeline.recompute(&match_id).await.unwrap();
    let clean = pipeline.verify(&match_id).await.unwrap();
    assert!(clean.is_ok());

    let mut tampered = mock.written(&match_id).unwrap().snapshots;
    tampered[3].checksum = "f".repeat(64);
    mock.overwrite_snapshots(&match_id, tampered);

    let first = pipeline.verify(&match_id).await.unwrap();
    let second = pipeline.verify(&match_id).await.unwrap();
    assert_eq!(first.failure_count(), 1);
    assert_eq!(first, second);
    assert!(second.into_result().is_err());
}
