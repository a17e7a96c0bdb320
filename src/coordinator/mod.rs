//! Phase coordination for collaboration sessions.
//!
//! The `PhaseCoordinator` owns the session store and mediates everything
//! that mutates a session: turn requests, decision recording, artifact
//! recording, phase advancement, and failure reports. "Who should speak"
//! questions are delegated to the [`TurnScheduler`](crate::scheduling::TurnScheduler);
//! one scheduler instance serves every session by session-qualifying agent
//! identifiers.
//!
//! Callers must serialize operations per session (single writer at a time);
//! independent sessions share no mutable state and may be driven in
//! parallel from separate coordinators.

mod advance;
mod minutes;
mod protocol;

pub use advance::PhaseAdvance;
pub use minutes::{ContributionSummary, MinutesReport, PhaseOutcome, PhaseSummary};

use chrono::Utc;
use crossbeam_channel::Sender;
use std::collections::HashMap;
use std::path::Path;

use crate::config::CoordinationConfig;
use crate::decision::{DecisionId, DecisionImpact, DecisionRecord};
use crate::error::{Error, Result};
use crate::participant::{AgentId, AgentRole, MeetingParticipant, ParticipantStatus};
use crate::phase::{default_phases, CollaborativePhase};
use crate::scheduling::{PhaseRole, PriorityScore, TurnScheduler, WorkState};
use crate::session::{
    ArtifactKind, CollaborationSession, PhaseHistoryEntry, SessionId, SessionStatus,
};
use crate::{qlog, qlog_debug};

/// Notification data produced for the messaging collaborator.
///
/// The coordinator never delivers anything itself; events carry exactly the
/// data a delivery layer needs (speaker, phase, deliverables).
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    TurnGranted {
        session_id: SessionId,
        agent_id: AgentId,
        phase: String,
        deliverables: Vec<String>,
    },
    SpeakerCleared {
        session_id: SessionId,
    },
    DecisionRecorded {
        session_id: SessionId,
        decision_id: DecisionId,
    },
    PhaseAdvanced {
        session_id: SessionId,
        phase: String,
        owner: AgentId,
    },
    SessionCompleted {
        session_id: SessionId,
    },
    SessionFailed {
        session_id: SessionId,
        reason: String,
    },
}

/// One participant to seat at session initialization.
#[derive(Debug, Clone)]
pub struct ParticipantSpec {
    pub agent_id: AgentId,
    pub agent_type: String,
    pub role: AgentRole,
}

impl ParticipantSpec {
    pub fn new(agent_id: impl Into<String>, agent_type: impl Into<String>, role: AgentRole) -> Self {
        Self {
            agent_id: AgentId::new(agent_id),
            agent_type: agent_type.into(),
            role,
        }
    }
}

pub struct PhaseCoordinator {
    pub(crate) config: CoordinationConfig,
    pub(crate) scheduler: TurnScheduler,
    pub(crate) sessions: HashMap<SessionId, CollaborationSession>,
    pub(crate) event_tx: Option<Sender<CoordinatorEvent>>,
}

/// Send an event if a sink is attached. Delivery failures are the
/// messaging layer's problem, never the protocol's.
pub(crate) fn emit(tx: &Option<Sender<CoordinatorEvent>>, event: CoordinatorEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event);
    }
}

/// Session-qualified scheduler key for an agent.
pub(crate) fn scoped(session_id: &SessionId, agent: &AgentId) -> AgentId {
    AgentId::new(format!("{}:{}", session_id.short(), agent))
}

impl PhaseCoordinator {
    pub fn new(config: CoordinationConfig) -> Self {
        let scheduler = TurnScheduler::new(config.scheduler.clone());
        Self {
            config,
            scheduler,
            sessions: HashMap::new(),
            event_tx: None,
        }
    }

    /// Attach an event sink for the messaging collaborator.
    pub fn with_events(config: CoordinationConfig, event_tx: Sender<CoordinatorEvent>) -> Self {
        let mut coordinator = Self::new(config);
        coordinator.event_tx = Some(event_tx);
        coordinator
    }

    /// Initialize a session with the default four-phase pipeline.
    pub fn initialize_session(
        &mut self,
        objective: &str,
        workspace: &Path,
        participants: &[ParticipantSpec],
    ) -> Result<SessionId> {
        self.initialize_session_with_phases(objective, workspace, participants, default_phases())
    }

    /// Initialize a session against a caller-supplied ordered phase list.
    pub fn initialize_session_with_phases(
        &mut self,
        objective: &str,
        workspace: &Path,
        participants: &[ParticipantSpec],
        phases: Vec<CollaborativePhase>,
    ) -> Result<SessionId> {
        if participants.is_empty() {
            return Err(Error::Validation("session needs at least one participant".into()));
        }
        if phases.is_empty() {
            return Err(Error::Validation("session needs at least one phase".into()));
        }
        for (i, spec) in participants.iter().enumerate() {
            if participants[..i].iter().any(|p| p.agent_id == spec.agent_id) {
                return Err(Error::Validation(format!(
                    "duplicate participant id: {}",
                    spec.agent_id
                )));
            }
        }

        let id = SessionId::new();
        let now = Utc::now();
        let roster: Vec<MeetingParticipant> = participants
            .iter()
            .map(|spec| {
                MeetingParticipant::new(spec.agent_id.clone(), spec.agent_type.clone(), spec.role)
            })
            .collect();

        let first_phase_name = phases[0].name.clone();
        let session = CollaborationSession {
            id,
            objective: objective.to_string(),
            workspace: workspace.to_path_buf(),
            room_id: format!("room-{}", id.short()),
            participants: roster,
            phase_index: 0,
            phase_history: vec![PhaseHistoryEntry {
                phase_index: 0,
                name: first_phase_name,
                entered_at: now,
            }],
            turn: Default::default(),
            decisions: Vec::new(),
            artifacts: Default::default(),
            started_at: now,
            ended_at: None,
            status: SessionStatus::Planning,
            phases,
        };

        // Make every participant known to the scheduler and hand the first
        // phase's leadership out before any turn is requested.
        for participant in &session.participants {
            self.scheduler.register(scoped(&id, &participant.agent_id));
        }
        let leader = phase_owner_agent(&session);
        for participant in &session.participants {
            let role = if Some(&participant.agent_id) == leader.as_ref() {
                PhaseRole::Leader
            } else {
                PhaseRole::Participant
            };
            self.scheduler
                .set_phase_role(&scoped(&id, &participant.agent_id), role)?;
        }

        qlog!(
            "Session initialized: id={} objective={:?} participants={} phases={} room={}",
            id.short(),
            objective.chars().take(60).collect::<String>(),
            session.participants.len(),
            session.phases.len(),
            session.room_id
        );

        self.sessions.insert(id, session);
        Ok(id)
    }

    pub fn get_session(&self, session_id: &SessionId) -> Result<&CollaborationSession> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Append a pending decision to the session ledger.
    pub fn record_decision(
        &mut self,
        session_id: &SessionId,
        maker: &AgentId,
        decision: &str,
        reasoning: &str,
        impact: DecisionImpact,
        affected: Vec<AgentId>,
    ) -> Result<DecisionRecord> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        if !session.is_participant(maker) {
            return Err(Error::AgentNotInSession {
                session: session_id.short(),
                agent: maker.to_string(),
            });
        }

        let record = DecisionRecord::new(maker.clone(), decision, reasoning, impact, affected);
        qlog_debug!(
            "Decision recorded: session={} id={} maker={} impact={}",
            session_id.short(),
            record.id.short(),
            maker,
            impact
        );
        session.decisions.push(record.clone());
        emit(
            &self.event_tx,
            CoordinatorEvent::DecisionRecorded {
                session_id: *session_id,
                decision_id: record.id,
            },
        );
        Ok(record)
    }

    /// Record a file artifact into one of the session buckets.
    pub fn record_artifact(
        &mut self,
        session_id: &SessionId,
        agent_id: &AgentId,
        kind: ArtifactKind,
        path: &str,
    ) -> Result<()> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        if !session.is_participant(agent_id) {
            return Err(Error::AgentNotInSession {
                session: session_id.short(),
                agent: agent_id.to_string(),
            });
        }
        session.artifacts.record(kind, path);
        if let Some(participant) = session.participant_mut(agent_id) {
            participant.last_active = Utc::now();
        }
        Ok(())
    }

    /// Feed an agent's self-reported work state through to the scheduler.
    pub fn update_work_state(
        &mut self,
        session_id: &SessionId,
        agent_id: &AgentId,
        state: WorkState,
    ) -> Result<()> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        if !session.is_participant(agent_id) {
            return Err(Error::AgentNotInSession {
                session: session_id.short(),
                agent: agent_id.to_string(),
            });
        }
        self.scheduler
            .update_work_state(&scoped(session_id, agent_id), state)?;

        // Mirror blocked/unblocked onto the participant seat unless the
        // agent currently holds the floor.
        let speaking = session.turn.is_speaker(agent_id);
        let queued = session.turn.queue_position(agent_id).is_some();
        if let Some(participant) = session.participant_mut(agent_id) {
            if !speaking {
                match state {
                    WorkState::Blocked => participant.touch(ParticipantStatus::Blocked),
                    _ if participant.status == ParticipantStatus::Blocked => {
                        let status = if queued {
                            ParticipantStatus::Waiting
                        } else {
                            ParticipantStatus::Active
                        };
                        participant.touch(status);
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Priority of one participant as the scheduler sees it right now.
    pub fn priority(&self, session_id: &SessionId, agent_id: &AgentId) -> Result<PriorityScore> {
        let session = self.get_session(session_id)?;
        if !session.is_participant(agent_id) {
            return Err(Error::AgentNotInSession {
                session: session_id.short(),
                agent: agent_id.to_string(),
            });
        }
        self.scheduler.priority(&scoped(session_id, agent_id))
    }

    /// Rebuild the wait queue in priority order.
    ///
    /// FIFO is the steady-state discipline; this is the explicit reorder
    /// point where starvation boosts and blocked states can jump the line.
    pub fn reorder_queue(&mut self, session_id: &SessionId) -> Result<()> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        let mut remaining: Vec<AgentId> = session.turn.wait_queue.iter().cloned().collect();
        let mut reordered = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let keys: Vec<AgentId> = remaining.iter().map(|a| scoped(session_id, a)).collect();
            let next = match self.scheduler.next_speaker(&keys) {
                Some(key) => {
                    let index = keys.iter().position(|k| k == &key).unwrap_or(0);
                    remaining.remove(index)
                }
                // Unregistered stragglers keep their relative order.
                None => remaining.remove(0),
            };
            reordered.push(next);
        }
        session.turn.wait_queue = reordered.into();
        Ok(())
    }

    /// External report of unrecoverable team failure.
    ///
    /// This is the only path into the failed status; the coordinator never
    /// fails a session on its own.
    pub fn mark_failed(&mut self, session_id: &SessionId, reason: &str) -> Result<()> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        session.status = SessionStatus::Failed;
        session.ended_at = Some(Utc::now());
        session.turn.stand_down();
        session.turn.wait_queue.clear();
        qlog!("Session failed: id={} reason={}", session_id.short(), reason);
        emit(
            &self.event_tx,
            CoordinatorEvent::SessionFailed {
                session_id: *session_id,
                reason: reason.to_string(),
            },
        );
        Ok(())
    }

    /// Discard a session entirely. Retention is the caller's policy.
    pub fn discard_session(&mut self, session_id: &SessionId) -> Result<CollaborationSession> {
        self.sessions
            .remove(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }
}

/// First participant admitted by the current phase owner, falling back to
/// the first participant when no role matches (or the owner is `all`).
pub(crate) fn phase_owner_agent(session: &CollaborationSession) -> Option<AgentId> {
    let phase = session.current_phase()?;
    session
        .participants
        .iter()
        .find(|p| phase.owner.admits(p.role))
        .or_else(|| session.participants.first())
        .map(|p| p.agent_id.clone())
}
