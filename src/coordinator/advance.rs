//! Phase-completion validation and advancement.
//!
//! The phase index only ever moves forward. Advancement validates the
//! current phase's time budget, then seats the owner of the next phase and
//! re-seeds the wait queue; exhausting the list completes the session.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::participant::{AgentId, ParticipantStatus};
use crate::scheduling::PhaseRole;
use crate::session::{PhaseHistoryEntry, SessionId, SessionStatus};
use crate::{qlog, qlog_debug};

use super::{emit, phase_owner_agent, scoped, CoordinatorEvent, PhaseCoordinator};

/// Outcome of an advancement attempt.
///
/// Validation failures are reported here, never as errors: an incomplete
/// phase is an expected outcome the caller polls against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseAdvance {
    pub success: bool,
    /// Name of the phase now in progress; `None` when the session completed.
    pub new_phase: Option<String>,
    /// Human-readable validation failures when `success` is false.
    pub reasons: Vec<String>,
}

impl PhaseAdvance {
    fn advanced(new_phase: Option<String>) -> Self {
        Self {
            success: true,
            new_phase,
            reasons: Vec::new(),
        }
    }

    fn denied(reasons: Vec<String>) -> Self {
        Self {
            success: false,
            new_phase: None,
            reasons,
        }
    }
}

impl PhaseCoordinator {
    /// Validate the current phase and, if it passes, move to the next one.
    pub fn advance_phase(
        &mut self,
        session_id: &SessionId,
        initiated_by: &AgentId,
    ) -> Result<PhaseAdvance> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        if !session.is_participant(initiated_by) {
            return Err(Error::AgentNotInSession {
                session: session_id.short(),
                agent: initiated_by.to_string(),
            });
        }

        if session.is_ended() {
            return Ok(PhaseAdvance::denied(vec![format!(
                "Session is {} and cannot advance",
                session.status
            )]));
        }

        // Completion validation: the phase must still be inside its time
        // budget. Deliverable satisfaction is tracked by the caller through
        // decision and artifact records.
        let now = Utc::now();
        let mut reasons = Vec::new();
        if let (Some(phase), Some(started)) = (session.current_phase(), session.phase_started_at())
        {
            let elapsed = (now - started).num_seconds().max(0) as u64;
            if elapsed > phase.max_duration_secs {
                reasons.push(format!(
                    "Phase '{}' exceeded its {}s budget ({}s elapsed)",
                    phase.name, phase.max_duration_secs, elapsed
                ));
            }
        }
        if !reasons.is_empty() {
            qlog_debug!(
                "advance_phase denied: session={} reasons={:?}",
                session_id.short(),
                reasons
            );
            return Ok(PhaseAdvance::denied(reasons));
        }

        session.phase_index += 1;

        if session.phase_index >= session.phases.len() {
            session.status = SessionStatus::Completed;
            session.ended_at = Some(now);
            session.turn.stand_down();
            session.turn.wait_queue.clear();
            for participant in &mut session.participants {
                participant.touch(ParticipantStatus::Completed);
            }
            qlog!("Session completed: id={}", session_id.short());
            emit(
                &self.event_tx,
                CoordinatorEvent::SessionCompleted {
                    session_id: *session_id,
                },
            );
            return Ok(PhaseAdvance::advanced(None));
        }

        session.status = SessionStatus::for_phase_index(session.phase_index);
        let phase_name = session.phases[session.phase_index].name.clone();
        session.phase_history.push(PhaseHistoryEntry {
            phase_index: session.phase_index,
            name: phase_name.clone(),
            entered_at: now,
        });

        // Seat the new phase owner and line everyone else up behind them.
        let owner = match phase_owner_agent(session) {
            Some(owner) => owner,
            None => {
                // Roster is never empty after initialization.
                return Err(Error::Validation(format!(
                    "session {} has no participants to seat",
                    session_id.short()
                )));
            }
        };
        let others = session.roster_except(&owner);
        session.turn.reset_for_phase(owner.clone(), others.clone(), now);
        if let Some(participant) = session.participant_mut(&owner) {
            participant.touch(ParticipantStatus::Speaking);
        }
        for waiting in &others {
            if let Some(participant) = session.participant_mut(waiting) {
                participant.touch(ParticipantStatus::Waiting);
            }
        }
        for participant_id in std::iter::once(&owner).chain(others.iter()) {
            let role = if participant_id == &owner {
                PhaseRole::Leader
            } else {
                PhaseRole::Participant
            };
            self.scheduler
                .set_phase_role(&scoped(session_id, participant_id), role)?;
        }

        qlog!(
            "Phase advanced: session={} phase={} owner={} initiated_by={}",
            session_id.short(),
            phase_name,
            owner,
            initiated_by
        );
        emit(
            &self.event_tx,
            CoordinatorEvent::PhaseAdvanced {
                session_id: *session_id,
                phase: phase_name.clone(),
                owner,
            },
        );
        Ok(PhaseAdvance::advanced(Some(phase_name)))
    }
}
