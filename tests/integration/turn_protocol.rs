//! Turn protocol safety and liveness.

use quorum::{CoordinatorEvent, DenialReason, TurnOutcome};

use crate::fixtures::{id, CoordinatorHarness, IMPLEMENTER, PLANNER, TESTER};

/// Test: speak/complete round with a contended floor
/// Given a planner holding the floor and two queued agents
/// When the planner completes the turn
/// Then exactly one queued agent is promoted, in FIFO order
#[test]
fn test_complete_turn_promotes_exactly_one_agent() {
    let mut harness = CoordinatorHarness::new();

    assert!(harness.speak(PLANNER).granted);
    assert!(!harness.speak(IMPLEMENTER).granted);
    assert!(!harness.speak(TESTER).granted);
    harness.assert_turn_invariants();

    let response = harness.complete(PLANNER);
    assert!(response.granted);
    assert_eq!(response.current_speaker, Some(id(IMPLEMENTER)));
    harness.assert_turn_invariants();

    let session = harness.session();
    assert_eq!(session.turn.wait_queue.len(), 1);
    assert_eq!(session.turn.queue_position(&id(TESTER)), Some(1));
}

#[test]
fn test_complete_turn_with_empty_queue_clears_floor() {
    let mut harness = CoordinatorHarness::new();
    harness.speak(PLANNER);

    let response = harness.complete(PLANNER);
    assert!(response.granted);
    assert_eq!(response.current_speaker, None);
    harness.assert_turn_invariants();
}

/// A complete_turn from an agent that never spoke is a structured denial.
#[test]
fn test_complete_turn_from_non_speaker_denied() {
    let mut harness = CoordinatorHarness::new();
    let response = harness.complete(PLANNER);
    assert!(!response.granted);
    assert_eq!(response.reason, Some(DenialReason::NotCurrentSpeaker));

    // Even with a speaker seated, only the speaker may complete.
    harness.speak(PLANNER);
    let response = harness.complete(IMPLEMENTER);
    assert!(!response.granted);
    assert_eq!(response.reason, Some(DenialReason::NotCurrentSpeaker));
}

#[test]
fn test_wait_estimates_scale_with_queue_position() {
    let mut harness = CoordinatorHarness::new();
    harness.speak(PLANNER);

    let first = harness.speak(IMPLEMENTER);
    let second = harness.speak(TESTER);
    assert_eq!(first.wait_estimate_secs, Some(120));
    assert_eq!(second.wait_estimate_secs, Some(240));

    // Re-requesting does not move the agent or change the estimate.
    let repeat = harness.speak(IMPLEMENTER);
    assert_eq!(repeat.wait_estimate_secs, Some(120));
    harness.assert_turn_invariants();
}

/// Test: escalation interrupt semantics
/// Given an implementer speaking and a tester waiting
/// When the planner escalates
/// Then the planner speaks and the implementer is first in the queue
#[test]
fn test_escalation_interrupts_and_requeues_at_front() {
    let mut harness = CoordinatorHarness::new();
    harness.advance(PLANNER); // Implementation phase: implementer owns the floor
    harness.speak(TESTER);

    let response = harness.escalate(PLANNER);
    assert!(response.granted);
    assert_eq!(response.current_speaker, Some(id(PLANNER)));
    harness.assert_turn_invariants();

    let session = harness.session();
    assert_eq!(session.turn.queue_position(&id(IMPLEMENTER)), Some(1));
    assert_eq!(session.turn.queue_position(&id(TESTER)), Some(2));

    let interrupted = session.turn.history.last().unwrap();
    assert_eq!(interrupted.agent_id, id(IMPLEMENTER));
    assert_eq!(interrupted.outcome, TurnOutcome::Interrupted);
}

#[test]
fn test_escalation_denied_for_non_planners() {
    let mut harness = CoordinatorHarness::new();
    harness.speak(PLANNER);

    for agent in [IMPLEMENTER, TESTER] {
        let response = harness.escalate(agent);
        assert!(!response.granted);
        assert!(matches!(
            response.reason,
            Some(DenialReason::EscalationNotAllowed { .. })
        ));
    }
    // The original speaker is untouched.
    assert_eq!(
        harness.session().turn.current_speaker,
        Some(id(PLANNER))
    );
}

/// The interrupted agent resumes from the front of the queue once the
/// escalator finishes.
#[test]
fn test_interrupted_speaker_resumes_after_escalation() {
    let mut harness = CoordinatorHarness::new();
    harness.advance(PLANNER);
    harness.escalate(PLANNER);

    let response = harness.complete(PLANNER);
    assert!(response.granted);
    assert_eq!(response.current_speaker, Some(id(IMPLEMENTER)));
    harness.assert_turn_invariants();
}

#[test]
fn test_turn_history_is_append_only_and_ordered() {
    let mut harness = CoordinatorHarness::new();
    harness.speak(PLANNER);
    harness.complete(PLANNER);
    harness.speak(PLANNER);
    harness.complete(PLANNER);

    let history = &harness.session().turn.history;
    assert_eq!(history.len(), 2);
    for record in history {
        assert_eq!(record.agent_id, id(PLANNER));
        assert_eq!(record.outcome, TurnOutcome::Completed);
        assert!(record.ended_at >= record.started_at);
    }
    assert!(history[1].started_at >= history[0].ended_at);
}

#[test]
fn test_turn_grant_events_carry_phase_and_deliverables() {
    let mut harness = CoordinatorHarness::new();
    harness.speak(PLANNER);

    let events = harness.drain_events();
    let grant = events
        .iter()
        .find_map(|event| match event {
            CoordinatorEvent::TurnGranted {
                agent_id,
                phase,
                deliverables,
                ..
            } => Some((agent_id.clone(), phase.clone(), deliverables.clone())),
            _ => None,
        })
        .expect("turn grant event");

    assert_eq!(grant.0, id(PLANNER));
    assert_eq!(grant.1, "Planning");
    assert!(!grant.2.is_empty());
}

#[test]
fn test_speaker_cleared_event_on_empty_queue() {
    let mut harness = CoordinatorHarness::new();
    harness.speak(PLANNER);
    harness.complete(PLANNER);

    let events = harness.drain_events();
    assert!(events
        .iter()
        .any(|event| matches!(event, CoordinatorEvent::SpeakerCleared { .. })));
}
