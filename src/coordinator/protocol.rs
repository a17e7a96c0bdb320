//! The turn request protocol: speak, complete_turn, escalate.
//!
//! Contention outcomes are structured denials, never errors; only unknown
//! session or agent identifiers fault. The caller serializes requests per
//! session.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::participant::{AgentId, ParticipantStatus};
use crate::session::SessionId;
use crate::turn::{DenialReason, TurnOutcome, TurnRecord, TurnRequestKind, TurnResponse};
use crate::{qlog_debug, qlog_warn};

use super::{emit, scoped, CoordinatorEvent, PhaseCoordinator};

impl PhaseCoordinator {
    /// Handle one turn request for a session.
    pub fn request_turn(
        &mut self,
        session_id: &SessionId,
        agent_id: &AgentId,
        kind: TurnRequestKind,
    ) -> Result<TurnResponse> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        let role = session
            .participant(agent_id)
            .map(|p| p.role)
            .ok_or_else(|| Error::AgentNotInSession {
                session: session_id.short(),
                agent: agent_id.to_string(),
            })?;

        if session.is_ended() {
            return Ok(TurnResponse::denied(
                DenialReason::SessionEnded,
                session.turn.current_speaker.clone(),
            ));
        }

        qlog_debug!(
            "request_turn session={} agent={} kind={}",
            session_id.short(),
            agent_id,
            kind
        );

        match kind {
            TurnRequestKind::Speak => {
                // Re-granting the current speaker is idempotent.
                if session.turn.is_speaker(agent_id) {
                    return Ok(TurnResponse::granted(Some(agent_id.clone())));
                }

                if session.turn.current_speaker.is_some() {
                    let position = session.turn.enqueue(agent_id);
                    if let Some(participant) = session.participant_mut(agent_id) {
                        participant.touch(ParticipantStatus::Waiting);
                    }
                    let estimate =
                        position as u64 * self.config.turn.wait_estimate_per_turn_secs;
                    return Ok(TurnResponse::queued(
                        position,
                        estimate,
                        session.turn.current_speaker.clone(),
                    ));
                }

                // Floor is open: the requester's role must own the phase.
                let phase = match session.current_phase() {
                    Some(phase) => phase,
                    None => {
                        return Ok(TurnResponse::denied(DenialReason::SessionEnded, None));
                    }
                };
                if !phase.owner.admits(role) {
                    return Ok(TurnResponse::denied(
                        DenialReason::RoleMismatch {
                            agent_role: role.to_string(),
                            phase_owner: phase.owner.to_string(),
                        },
                        None,
                    ));
                }

                let phase_name = phase.name.clone();
                let deliverables = phase.deliverables.clone();
                let now = Utc::now();
                session.turn.seat(agent_id.clone(), now);
                if let Some(participant) = session.participant_mut(agent_id) {
                    participant.touch(ParticipantStatus::Speaking);
                }
                emit(
                    &self.event_tx,
                    CoordinatorEvent::TurnGranted {
                        session_id: *session_id,
                        agent_id: agent_id.clone(),
                        phase: phase_name,
                        deliverables,
                    },
                );
                Ok(TurnResponse::granted(Some(agent_id.clone())))
            }

            TurnRequestKind::CompleteTurn => {
                if !session.turn.is_speaker(agent_id) {
                    return Ok(TurnResponse::denied(
                        DenialReason::NotCurrentSpeaker,
                        session.turn.current_speaker.clone(),
                    ));
                }

                let now = Utc::now();
                let started = session.turn.turn_started_at.unwrap_or(now);
                session.turn.record(TurnRecord {
                    agent_id: agent_id.clone(),
                    role,
                    started_at: started,
                    ended_at: now,
                    action: "speak".to_string(),
                    outcome: TurnOutcome::Completed,
                });
                self.scheduler
                    .record_communication_activity(&scoped(session_id, agent_id))?;
                if let Some(participant) = session.participant_mut(agent_id) {
                    participant.touch(ParticipantStatus::Active);
                }

                let next = session.turn.promote_next(now);
                match &next {
                    Some(next_agent) => {
                        let (phase_name, deliverables) = match session.current_phase() {
                            Some(phase) => (phase.name.clone(), phase.deliverables.clone()),
                            None => (String::new(), Vec::new()),
                        };
                        if let Some(participant) = session.participant_mut(next_agent) {
                            participant.touch(ParticipantStatus::Speaking);
                        }
                        emit(
                            &self.event_tx,
                            CoordinatorEvent::TurnGranted {
                                session_id: *session_id,
                                agent_id: next_agent.clone(),
                                phase: phase_name,
                                deliverables,
                            },
                        );
                    }
                    None => {
                        emit(
                            &self.event_tx,
                            CoordinatorEvent::SpeakerCleared {
                                session_id: *session_id,
                            },
                        );
                    }
                }
                Ok(TurnResponse::granted(next))
            }

            TurnRequestKind::Escalate => {
                if !role.can_escalate() {
                    return Ok(TurnResponse::denied(
                        DenialReason::EscalationNotAllowed {
                            agent_role: role.to_string(),
                        },
                        session.turn.current_speaker.clone(),
                    ));
                }
                if session.turn.is_speaker(agent_id) {
                    return Ok(TurnResponse::granted(Some(agent_id.clone())));
                }

                let now = Utc::now();
                if let Some(interrupted) = session.turn.current_speaker.clone() {
                    let interrupted_role = session
                        .participant(&interrupted)
                        .map(|p| p.role)
                        .ok_or_else(|| Error::AgentNotInSession {
                            session: session_id.short(),
                            agent: interrupted.to_string(),
                        })?;
                    let started = session.turn.turn_started_at.unwrap_or(now);
                    // The interrupted turn is closed without a metrics update,
                    // so the speaker is not treated as having just spoken.
                    session.turn.record(TurnRecord {
                        agent_id: interrupted.clone(),
                        role: interrupted_role,
                        started_at: started,
                        ended_at: now,
                        action: "speak".to_string(),
                        outcome: TurnOutcome::Interrupted,
                    });
                    session.turn.reinsert_front(interrupted.clone());
                    if let Some(participant) = session.participant_mut(&interrupted) {
                        participant.touch(ParticipantStatus::Waiting);
                    }
                    qlog_debug!(
                        "escalation: session={} {} interrupted {}",
                        session_id.short(),
                        agent_id,
                        interrupted
                    );
                }

                let (phase_name, deliverables) = match session.current_phase() {
                    Some(phase) => (phase.name.clone(), phase.deliverables.clone()),
                    None => (String::new(), Vec::new()),
                };
                session.turn.seat(agent_id.clone(), now);
                if let Some(participant) = session.participant_mut(agent_id) {
                    participant.touch(ParticipantStatus::Speaking);
                }
                emit(
                    &self.event_tx,
                    CoordinatorEvent::TurnGranted {
                        session_id: *session_id,
                        agent_id: agent_id.clone(),
                        phase: phase_name,
                        deliverables,
                    },
                );
                Ok(TurnResponse::granted(Some(agent_id.clone())))
            }
        }
    }

    /// Advisory turn-timeout check, invoked explicitly by the caller.
    ///
    /// Closes the current turn with a `timed_out` outcome when it has
    /// outlived the configured budget, seating the queue head. Returns
    /// whether a turn was closed.
    pub fn sweep_turn(&mut self, session_id: &SessionId) -> Result<bool> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        if session.is_ended() {
            return Ok(false);
        }
        let (speaker, started) = match (
            session.turn.current_speaker.clone(),
            session.turn.turn_started_at,
        ) {
            (Some(speaker), Some(started)) => (speaker, started),
            _ => return Ok(false),
        };

        let now = Utc::now();
        let elapsed = (now - started).num_seconds().max(0) as u64;
        if elapsed <= self.config.turn.turn_timeout_secs {
            return Ok(false);
        }

        let role = session
            .participant(&speaker)
            .map(|p| p.role)
            .ok_or_else(|| Error::AgentNotInSession {
                session: session_id.short(),
                agent: speaker.to_string(),
            })?;
        qlog_warn!(
            "turn timed out: session={} agent={} elapsed={}s",
            session_id.short(),
            speaker,
            elapsed
        );
        session.turn.record(TurnRecord {
            agent_id: speaker.clone(),
            role,
            started_at: started,
            ended_at: now,
            action: "speak".to_string(),
            outcome: TurnOutcome::TimedOut,
        });
        if let Some(participant) = session.participant_mut(&speaker) {
            participant.touch(ParticipantStatus::Active);
        }

        let next = session.turn.promote_next(now);
        match &next {
            Some(next_agent) => {
                let (phase_name, deliverables) = match session.current_phase() {
                    Some(phase) => (phase.name.clone(), phase.deliverables.clone()),
                    None => (String::new(), Vec::new()),
                };
                if let Some(participant) = session.participant_mut(next_agent) {
                    participant.touch(ParticipantStatus::Speaking);
                }
                emit(
                    &self.event_tx,
                    CoordinatorEvent::TurnGranted {
                        session_id: *session_id,
                        agent_id: next_agent.clone(),
                        phase: phase_name,
                        deliverables,
                    },
                );
            }
            None => {
                emit(
                    &self.event_tx,
                    CoordinatorEvent::SpeakerCleared {
                        session_id: *session_id,
                    },
                );
            }
        }
        Ok(true)
    }
}
