//! Stable event ordering for deterministic processing.

use crate::domain::Event;

/// Stable ordering key for events.
///
/// Ordering: match_id -> round_number -> tick -> event_id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventOrderingKey<'a> {
    pub match_id: &'a str,
    pub round_number: u32,
    pub tick: i64,
    pub event_id: &'a str,
}

impl<'a> EventOrderingKey<'a> {
    pub fn from_event(event: &'a Event) -> Self {
        EventOrderingKey {
            match_id: event.match_id.as_str(),
            round_number: event.round_number,
            tick: event.tick,
            event_id: &event.event_id,
        }
    }

    /// Returns true if event_a should come before event_b.
    pub fn should_come_before(event_a: &Event, event_b: &Event) -> bool {
        EventOrderingKey::from_event(event_a) < EventOrderingKey::from_event(event_b)
    }
}

/// Sort events deterministically.
pub fn sort_events_deterministic(events: &mut [Event]) {
    events.sort_by(|a, b| EventOrderingKey::from_event(a).cmp(&EventOrderingKey::from_event(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, MatchId, SteamId, Team};

    fn make_event(match_id: &str, round: u32, tick: i64, event_id: &str) -> Event {
        Event::new(
            MatchId::new(match_id),
            round,
            tick,
            event_id,
            EventKind::Buy,
            SteamId::new("p1"),
            Team::t(),
        )
    }

    #[test]
    fn test_ordering_by_round_then_tick() {
        let a = make_event("m1", 1, 500, "e9");
        let b = make_event("m1", 2, 10, "e1");
        let c = make_event("m1", 2, 20, "e0");

        assert!(EventOrderingKey::should_come_before(&a, &b));
        assert!(EventOrderingKey::should_come_before(&b, &c));
        assert!(!EventOrderingKey::should_come_before(&c, &a));
    }

    #[test]
    fn test_same_tick_breaks_tie_on_event_id() {
        let a = make_event("m1", 1, 100, "e1");
        let b = make_event("m1", 1, 100, "e2");
        assert!(EventOrderingKey::should_come_before(&a, &b));
        assert!(!EventOrderingKey::should_come_before(&b, &a));
    }

    #[test]
    fn test_sort_events_deterministic() {
        let mut events = vec![
            make_event("m2", 1, 0, "x"),
            make_event("m1", 2, 5, "b"),
            make_event("m1", 1, 7, "c"),
            make_event("m1", 2, 5, "a"),
        ];

        sort_events_deterministic(&mut events);

        let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "x"]);
    }
}
