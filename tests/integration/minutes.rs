//! End-of-session minutes reporting.

use quorum::coordinator::PhaseOutcome;
use quorum::{ArtifactKind, DecisionImpact, SessionStatus};

use crate::fixtures::{id, CoordinatorHarness, IMPLEMENTER, PLANNER, TESTER};

/// Minutes for a completed session carry the whole story: phases, turns,
/// decisions, artifacts.
#[test]
fn test_minutes_for_completed_session() {
    let mut harness = CoordinatorHarness::new();

    harness.speak(PLANNER);
    harness
        .coordinator
        .record_decision(
            &harness.session_id,
            &id(PLANNER),
            "split the work into parser and evaluator",
            "keeps both implementable in parallel",
            DecisionImpact::Phase,
            vec![id(IMPLEMENTER)],
        )
        .unwrap();
    harness.complete(PLANNER);
    harness.advance(PLANNER);

    harness
        .coordinator
        .record_artifact(&harness.session_id, &id(IMPLEMENTER), ArtifactKind::Created, "src/parser.rs")
        .unwrap();
    harness.complete(IMPLEMENTER);
    harness.advance(IMPLEMENTER);

    harness
        .coordinator
        .record_artifact(&harness.session_id, &id(TESTER), ArtifactKind::Tested, "src/parser.rs")
        .unwrap();
    harness.complete(TESTER);
    harness.advance(TESTER);
    harness.advance(PLANNER);

    let minutes = harness
        .coordinator
        .generate_minutes(&harness.session_id)
        .unwrap();

    assert_eq!(minutes.status, SessionStatus::Completed);
    assert!(minutes.summary.contains("completed"));
    assert!(minutes
        .phases
        .iter()
        .all(|phase| phase.outcome == PhaseOutcome::Completed));
    assert!(minutes.phases.iter().all(|p| p.duration_secs.is_some()));
    assert_eq!(minutes.decisions.len(), 1);
    assert_eq!(minutes.artifacts.created, vec!["src/parser.rs"]);
    assert_eq!(minutes.artifacts.tested, vec!["src/parser.rs"]);

    // Each speaking participant is credited with a completed turn.
    for agent in [PLANNER, IMPLEMENTER, TESTER] {
        let contribution = minutes
            .contributions
            .iter()
            .find(|c| c.agent_id == id(agent))
            .unwrap();
        assert!(contribution.turns_completed >= 1, "{} has no turns", agent);
    }
    assert!(minutes.recommendations.is_empty());
}

/// Contribution totals equal the per-agent history entry counts.
#[test]
fn test_contribution_totals_match_history() {
    let mut harness = CoordinatorHarness::new();
    for _ in 0..3 {
        harness.speak(PLANNER);
        harness.complete(PLANNER);
    }

    let minutes = harness
        .coordinator
        .generate_minutes(&harness.session_id)
        .unwrap();
    let planner = minutes
        .contributions
        .iter()
        .find(|c| c.agent_id == id(PLANNER))
        .unwrap();
    assert_eq!(planner.turns_taken, 3);
    assert_eq!(planner.turns_completed, 3);

    let history = &harness.session().turn.history;
    assert_eq!(history.len(), 3);
}

#[test]
fn test_minutes_generation_is_read_only() {
    let mut harness = CoordinatorHarness::new();
    harness.speak(PLANNER);

    let before = serde_json::to_string(harness.session()).unwrap();
    harness
        .coordinator
        .generate_minutes(&harness.session_id)
        .unwrap();
    let after = serde_json::to_string(harness.session()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_minutes_for_failed_session() {
    let mut harness = CoordinatorHarness::new();
    harness
        .coordinator
        .mark_failed(&harness.session_id, "unrecoverable")
        .unwrap();

    let minutes = harness
        .coordinator
        .generate_minutes(&harness.session_id)
        .unwrap();
    assert_eq!(minutes.status, SessionStatus::Failed);
    assert!(minutes.summary.contains("failed"));
}
