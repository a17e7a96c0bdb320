//! Priority scheduling properties, driven through the public surface.

use chrono::{Duration, Utc};

use quorum::{
    AgentId, ReasonCategory, SchedulerConfig, TurnScheduler, WorkState,
};

use crate::fixtures::{id, CoordinatorHarness, IMPLEMENTER, PLANNER, TESTER};

fn scheduler_with(agents: &[&str]) -> TurnScheduler {
    let mut scheduler = TurnScheduler::new(SchedulerConfig::default());
    for agent in agents {
        scheduler.register(AgentId::from(*agent));
    }
    scheduler
}

/// Three-agent team: P1 blocked, P2 active, P3 idle -> P1 speaks next.
#[test]
fn test_blocked_agent_wins_candidate_selection() {
    let mut scheduler = scheduler_with(&["p1", "p2", "p3"]);
    scheduler.update_work_state(&id("p1"), WorkState::Blocked).unwrap();
    scheduler.update_work_state(&id("p2"), WorkState::Active).unwrap();
    scheduler.update_work_state(&id("p3"), WorkState::Idle).unwrap();

    let candidates = [id("p1"), id("p2"), id("p3")];
    assert_eq!(scheduler.next_speaker(&candidates), Some(id("p1")));
}

#[test]
fn test_selection_is_stable_across_repeated_calls() {
    let mut scheduler = scheduler_with(&["a", "b", "c", "d"]);
    scheduler.update_work_state(&id("c"), WorkState::Active).unwrap();

    let candidates = [id("a"), id("b"), id("c"), id("d")];
    let now = Utc::now();
    let winner = scheduler.next_speaker_at(&candidates, now);
    for _ in 0..25 {
        assert_eq!(scheduler.next_speaker_at(&candidates, now), winner);
    }
}

/// A chatty agent cannot monopolize the floor: a recent speaker is
/// penalized below an otherwise-identical quiet peer, and a long-quiet
/// agent is boosted above the 5.0 floor from any state.
#[test]
fn test_recent_speaker_loses_to_quiet_peer() {
    let mut scheduler = scheduler_with(&["chatty", "quiet"]);
    scheduler.record_communication_activity(&id("chatty")).unwrap();

    // 30s after speaking, the penalty applies: chatty 0.0 vs quiet 2.0.
    let eval = scheduler
        .profile(&id("chatty"))
        .unwrap()
        .metrics
        .last_activity
        + Duration::seconds(30);
    let chatty_score = scheduler.priority_at(&id("chatty"), eval).unwrap();
    assert!(chatty_score.has_reason(ReasonCategory::RecentSpeakerPenalty));
    assert_eq!(
        scheduler.next_speaker_at(&[id("chatty"), id("quiet")], eval),
        Some(id("quiet"))
    );
}

#[test]
fn test_starvation_boost_clears_floor_after_window() {
    let mut scheduler = scheduler_with(&["quiet"]);
    scheduler.update_work_state(&id("quiet"), WorkState::Idle).unwrap();

    let eleven_minutes_on = Utc::now() + Duration::seconds(660);
    let score = scheduler.priority_at(&id("quiet"), eleven_minutes_on).unwrap();
    assert!(score.value > 5.0);
    assert!(score.has_reason(ReasonCategory::StarvationProtection));
}

/// Leadership follows the phase: the coordinator hands the leader bonus to
/// each phase's owner as the session advances.
#[test]
fn test_leadership_moves_with_phase_advancement() {
    let mut harness = CoordinatorHarness::new();

    let planner_score = harness
        .coordinator
        .priority(&harness.session_id, &id(PLANNER))
        .unwrap();
    let impl_score = harness
        .coordinator
        .priority(&harness.session_id, &id(IMPLEMENTER))
        .unwrap();
    assert!(planner_score.has_reason(ReasonCategory::PhaseLeader));
    assert!(planner_score.value > impl_score.value);

    harness.advance(PLANNER);

    let planner_score = harness
        .coordinator
        .priority(&harness.session_id, &id(PLANNER))
        .unwrap();
    let impl_score = harness
        .coordinator
        .priority(&harness.session_id, &id(IMPLEMENTER))
        .unwrap();
    assert!(impl_score.has_reason(ReasonCategory::PhaseLeader));
    assert!(!planner_score.has_reason(ReasonCategory::PhaseLeader));
}

/// Two sessions sharing one coordinator do not bleed scheduler state into
/// each other: identical agent ids stay session-scoped.
#[test]
fn test_sessions_are_isolated_in_shared_scheduler() {
    let mut harness = CoordinatorHarness::new();
    let second = harness
        .coordinator
        .initialize_session(
            "second objective",
            &std::path::PathBuf::from("/tmp/other"),
            &[
                quorum::ParticipantSpec::new(PLANNER, "claude", quorum::AgentRole::Planner),
                quorum::ParticipantSpec::new(TESTER, "claude", quorum::AgentRole::Tester),
            ],
        )
        .unwrap();

    harness
        .coordinator
        .update_work_state(&harness.session_id, &id(PLANNER), WorkState::Blocked)
        .unwrap();

    let first_score = harness
        .coordinator
        .priority(&harness.session_id, &id(PLANNER))
        .unwrap();
    let second_score = harness.coordinator.priority(&second, &id(PLANNER)).unwrap();

    assert!(first_score.has_reason(ReasonCategory::BlockedState));
    assert!(!second_score.has_reason(ReasonCategory::BlockedState));
}

#[test]
fn test_reason_categories_render_descriptive_phrases() {
    let mut scheduler = scheduler_with(&["a"]);
    scheduler.update_work_state(&id("a"), WorkState::Blocked).unwrap();

    let score = scheduler.priority(&id("a")).unwrap();
    assert!(score.reason_text().contains("Blocked state"));
}
