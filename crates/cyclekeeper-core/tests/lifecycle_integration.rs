//! Integration tests for the cycle lifecycle driven by the countdown.

use std::sync::Arc;

use chrono::Duration;
use cyclekeeper_core::{CycleSession, CycleStatus, Event, ManualClock};

fn session() -> (CycleSession, ManualClock) {
    let clock = ManualClock::default();
    (CycleSession::with_clock(Arc::new(clock.clone())), clock)
}

fn count_finished(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::CycleFinished { .. }))
        .count()
}

#[test]
fn test_write_spec_then_interrupt() {
    let (mut session, clock) = session();
    let id = session.start_cycle("Write spec", 25).unwrap().id;
    clock.advance_millis(250);
    session.interrupt();

    let cycle = session.history().get(id).unwrap();
    assert!(cycle.start_date <= cycle.interrupted_date.unwrap());
    assert!(cycle.finished_date.is_none());
    assert!(session.active_cycle().is_none());
}

#[test]
fn test_completion_exactness() {
    let (mut session, clock) = session();
    let id = session.start_cycle("Focus", 1).unwrap().id;

    let mut events = Vec::new();
    for _ in 0..59 {
        clock.advance_secs(1);
        events.extend(session.tick());
    }
    assert_eq!(count_finished(&events), 0);
    assert_eq!(session.display().remaining_seconds(), 1);

    clock.advance_secs(1);
    events.extend(session.tick());
    assert_eq!(count_finished(&events), 1);
    assert_eq!(session.engine().elapsed_seconds(), 60);
    assert_eq!(session.elapsed_seconds(), 60);
    assert_eq!(session.display().remaining_seconds(), 0);

    // Further ticks and an explicit finish do nothing.
    clock.advance_secs(5);
    events.extend(session.tick());
    events.extend(session.tick());
    assert_eq!(count_finished(&events), 1);
    assert_eq!(session.history().get(id).unwrap().status(), CycleStatus::Finished);
}

#[test]
fn test_irregular_ticks_complete_on_next_sample() {
    let (mut session, clock) = session();
    let id = session.start_cycle("Focus", 1).unwrap().id;
    let start = session.history().get(id).unwrap().start_date;

    for (at_ms, expected) in [(900, 0), (2_300, 2), (3_100, 3)] {
        clock.set(start + Duration::milliseconds(at_ms));
        match session.tick() {
            Some(Event::CountdownTick {
                elapsed_seconds, ..
            }) => assert_eq!(elapsed_seconds, expected),
            other => panic!("Expected CountdownTick, got {other:?}"),
        }
    }

    // Host suspended: the next tick arrives 65 s after start.
    clock.set(start + Duration::seconds(65));
    let event = session.tick();
    assert!(matches!(event, Some(Event::CycleFinished { .. })));
    assert_eq!(session.elapsed_seconds(), 60);
    assert!(session.tick().is_none());
}

#[test]
fn test_no_double_finish() {
    let (mut session, clock) = session();
    let id = session.start_cycle("Focus", 1).unwrap().id;
    clock.advance_secs(60);
    session.tick();
    let finished = session.history().get(id).unwrap().finished_date;
    assert!(finished.is_some());

    clock.advance_secs(30);
    // Neither a late interrupt nor another tick touches the finished cycle.
    assert!(session.interrupt().is_none());
    assert!(session.tick().is_none());
    let cycle = session.history().get(id).unwrap();
    assert_eq!(cycle.finished_date, finished);
    assert!(cycle.interrupted_date.is_none());
}

#[test]
fn test_deep_work_end_to_end() {
    let (mut session, clock) = session();
    let id = session.start_cycle("Deep work", 25).unwrap().id;

    clock.advance_secs(1500);
    let events: Vec<Event> = session.tick().into_iter().collect();

    assert_eq!(count_finished(&events), 1);
    assert_eq!(session.display().remaining_seconds(), 0);
    assert!(session.active_cycle().is_none());

    let matching: Vec<_> = session
        .history()
        .cycles()
        .iter()
        .filter(|c| c.id == id)
        .collect();
    assert_eq!(matching.len(), 1);
    let cycle = matching[0];
    let finished = cycle.finished_date.unwrap();
    assert_eq!(finished - cycle.start_date, Duration::seconds(1500));
}

#[test]
fn test_start_while_active_is_rejected() {
    let (mut session, _clock) = session();
    let first = session.start_cycle("First", 25).unwrap().id;
    assert!(session.start_cycle("Second", 5).is_err());

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.active_cycle().map(|c| c.id), Some(first));
    assert_eq!(session.engine().bound_cycle_id(), Some(first));
}

#[test]
fn test_history_keeps_every_cycle_in_order() {
    let (mut session, clock) = session();
    let a = session.start_cycle("Email", 5).unwrap().id;
    session.interrupt();
    let b = session.start_cycle("Deep work", 1).unwrap().id;
    clock.advance_secs(60);
    session.tick();
    let c = session.start_cycle("Email", 10).unwrap().id;

    let ids: Vec<_> = session.history().cycles().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![a, b, c]);
    let statuses: Vec<_> = session
        .history()
        .cycles()
        .iter()
        .map(|c| c.status())
        .collect();
    assert_eq!(
        statuses,
        vec![CycleStatus::Interrupted, CycleStatus::Finished, CycleStatus::InProgress]
    );
    assert_eq!(session.task_suggestions(), vec!["Email", "Deep work"]);
}
