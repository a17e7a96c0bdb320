//! Test fixtures for integration tests.
//!
//! Provides a coordinator harness with a standard three-agent roster
//! (planner, implementer, tester) and an attached event channel.

use std::path::PathBuf;

use crossbeam_channel::{unbounded, Receiver};

use quorum::{
    AgentId, AgentRole, CollaborationSession, CoordinationConfig, CoordinatorEvent,
    ParticipantSpec, PhaseCoordinator, SessionId, TurnRequestKind, TurnResponse,
};

pub const PLANNER: &str = "planner-1";
pub const IMPLEMENTER: &str = "impl-1";
pub const TESTER: &str = "tester-1";

pub fn id(s: &str) -> AgentId {
    AgentId::from(s)
}

/// A coordinator with one initialized session and an event sink.
pub struct CoordinatorHarness {
    pub coordinator: PhaseCoordinator,
    pub session_id: SessionId,
    pub events: Receiver<CoordinatorEvent>,
}

impl CoordinatorHarness {
    /// Standard roster: one planner, one implementer, one tester, with the
    /// default four-phase pipeline.
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        let mut coordinator = PhaseCoordinator::with_events(CoordinationConfig::default(), tx);
        let session_id = coordinator
            .initialize_session(
                "implement and verify the feature",
                &PathBuf::from("/tmp/workspace"),
                &[
                    ParticipantSpec::new(PLANNER, "claude", AgentRole::Planner),
                    ParticipantSpec::new(IMPLEMENTER, "claude", AgentRole::Implementer),
                    ParticipantSpec::new(TESTER, "claude", AgentRole::Tester),
                ],
            )
            .expect("session init");
        Self {
            coordinator,
            session_id,
            events: rx,
        }
    }

    pub fn session(&self) -> &CollaborationSession {
        self.coordinator.get_session(&self.session_id).expect("session")
    }

    pub fn speak(&mut self, agent: &str) -> TurnResponse {
        self.coordinator
            .request_turn(&self.session_id, &id(agent), TurnRequestKind::Speak)
            .expect("speak request")
    }

    pub fn complete(&mut self, agent: &str) -> TurnResponse {
        self.coordinator
            .request_turn(&self.session_id, &id(agent), TurnRequestKind::CompleteTurn)
            .expect("complete request")
    }

    pub fn escalate(&mut self, agent: &str) -> TurnResponse {
        self.coordinator
            .request_turn(&self.session_id, &id(agent), TurnRequestKind::Escalate)
            .expect("escalate request")
    }

    pub fn advance(&mut self, agent: &str) -> quorum::PhaseAdvance {
        self.coordinator
            .advance_phase(&self.session_id, &id(agent))
            .expect("advance")
    }

    /// Collect every event emitted so far.
    pub fn drain_events(&self) -> Vec<CoordinatorEvent> {
        self.events.try_iter().collect()
    }

    /// Check the single-speaker invariant and queue hygiene.
    pub fn assert_turn_invariants(&self) {
        let session = self.session();
        let speaking: Vec<_> = session
            .participants
            .iter()
            .filter(|p| p.status == quorum::ParticipantStatus::Speaking)
            .collect();
        assert!(
            speaking.len() <= 1,
            "at most one participant may be speaking, found {}",
            speaking.len()
        );

        if let Some(speaker) = &session.turn.current_speaker {
            assert!(
                session.turn.queue_position(speaker).is_none(),
                "wait queue must not contain the current speaker"
            );
        }
        let mut seen = std::collections::HashSet::new();
        for agent in &session.turn.wait_queue {
            assert!(seen.insert(agent.clone()), "duplicate queue entry: {}", agent);
        }
    }
}
