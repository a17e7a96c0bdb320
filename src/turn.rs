//! Turn context: who holds the floor, who is waiting, and what happened.
//!
//! One turn context exists per session. The wait queue is FIFO with no
//! duplicates and never contains the current speaker; the history is
//! append-only and survives phase transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::participant::{AgentId, AgentRole};

/// The three turn request kinds agents may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRequestKind {
    Speak,
    CompleteTurn,
    Escalate,
}

impl std::fmt::Display for TurnRequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRequestKind::Speak => write!(f, "speak"),
            TurnRequestKind::CompleteTurn => write!(f, "complete_turn"),
            TurnRequestKind::Escalate => write!(f, "escalate"),
        }
    }
}

/// How a recorded turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    Completed,
    /// Cut short by a planner escalation.
    Interrupted,
    /// Closed by the advisory timeout sweep.
    TimedOut,
}

impl std::fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnOutcome::Completed => write!(f, "completed"),
            TurnOutcome::Interrupted => write!(f, "interrupted"),
            TurnOutcome::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Immutable record of one finished turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub agent_id: AgentId,
    pub role: AgentRole,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub action: String,
    pub outcome: TurnOutcome,
}

impl TurnRecord {
    /// Wall-clock length of the turn. Clock skew clamps to zero.
    pub fn duration_secs(&self) -> u64 {
        (self.ended_at - self.started_at).num_seconds().max(0) as u64
    }
}

/// Why a turn request was denied.
///
/// Denials are expected contention outcomes, not faults; the category is
/// what tests assert on, the `Display` rendering is what agents read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    /// The requester's role does not own the current phase.
    RoleMismatch { agent_role: String, phase_owner: String },
    /// Someone else holds the floor; the requester was queued.
    SpeakerActive { queue_position: usize },
    /// Only the current speaker may complete the turn.
    NotCurrentSpeaker,
    /// Only planners may escalate.
    EscalationNotAllowed { agent_role: String },
    /// The session already completed or failed.
    SessionEnded,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::RoleMismatch {
                agent_role,
                phase_owner,
            } => write!(
                f,
                "Role {} does not own the current phase (owner: {})",
                agent_role, phase_owner
            ),
            DenialReason::SpeakerActive { queue_position } => write!(
                f,
                "Another agent is speaking; queued at position {}",
                queue_position
            ),
            DenialReason::NotCurrentSpeaker => {
                write!(f, "Requester is not the current speaker")
            }
            DenialReason::EscalationNotAllowed { agent_role } => {
                write!(f, "Escalation requires the planner role (requester: {})", agent_role)
            }
            DenialReason::SessionEnded => write!(f, "Session has ended"),
        }
    }
}

/// Outcome of a turn request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub granted: bool,
    pub current_speaker: Option<AgentId>,
    /// Projected wait when queued, `queue position x per-turn estimate`.
    pub wait_estimate_secs: Option<u64>,
    pub reason: Option<DenialReason>,
}

impl TurnResponse {
    pub fn granted(current_speaker: Option<AgentId>) -> Self {
        Self {
            granted: true,
            current_speaker,
            wait_estimate_secs: None,
            reason: None,
        }
    }

    pub fn denied(reason: DenialReason, current_speaker: Option<AgentId>) -> Self {
        Self {
            granted: false,
            current_speaker,
            wait_estimate_secs: None,
            reason: Some(reason),
        }
    }

    pub fn queued(
        queue_position: usize,
        wait_estimate_secs: u64,
        current_speaker: Option<AgentId>,
    ) -> Self {
        Self {
            granted: false,
            current_speaker,
            wait_estimate_secs: Some(wait_estimate_secs),
            reason: Some(DenialReason::SpeakerActive { queue_position }),
        }
    }
}

/// Mutable floor state for one session.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TurnContext {
    pub current_speaker: Option<AgentId>,
    pub turn_started_at: Option<DateTime<Utc>>,
    pub wait_queue: VecDeque<AgentId>,
    pub history: Vec<TurnRecord>,
}

impl TurnContext {
    pub fn is_speaker(&self, agent: &AgentId) -> bool {
        self.current_speaker.as_ref() == Some(agent)
    }

    /// 1-based queue position, if queued.
    pub fn queue_position(&self, agent: &AgentId) -> Option<usize> {
        self.wait_queue.iter().position(|a| a == agent).map(|i| i + 1)
    }

    /// Add the agent to the back of the queue unless already present.
    ///
    /// Returns the 1-based position either way. Must not be called with the
    /// current speaker; the protocol grants that case instead.
    pub fn enqueue(&mut self, agent: &AgentId) -> usize {
        if let Some(position) = self.queue_position(agent) {
            return position;
        }
        self.wait_queue.push_back(agent.clone());
        self.wait_queue.len()
    }

    pub fn remove_from_queue(&mut self, agent: &AgentId) {
        self.wait_queue.retain(|a| a != agent);
    }

    /// Give the floor to `agent` with a fresh turn start.
    pub fn seat(&mut self, agent: AgentId, now: DateTime<Utc>) {
        self.remove_from_queue(&agent);
        self.current_speaker = Some(agent);
        self.turn_started_at = Some(now);
    }

    /// Clear the floor without recording anything.
    pub fn stand_down(&mut self) {
        self.current_speaker = None;
        self.turn_started_at = None;
    }

    /// Seat the queue head, if any.
    pub fn promote_next(&mut self, now: DateTime<Utc>) -> Option<AgentId> {
        match self.wait_queue.pop_front() {
            Some(next) => {
                self.current_speaker = Some(next.clone());
                self.turn_started_at = Some(now);
                Some(next)
            }
            None => {
                self.stand_down();
                None
            }
        }
    }

    /// Put an interrupted speaker at the front of the queue.
    pub fn reinsert_front(&mut self, agent: AgentId) {
        self.remove_from_queue(&agent);
        self.wait_queue.push_front(agent);
    }

    /// Append a finished turn. History entries are never mutated.
    pub fn record(&mut self, record: TurnRecord) {
        self.history.push(record);
    }

    /// Re-seed for a new phase: seat the owner, queue everyone else in order.
    pub fn reset_for_phase(
        &mut self,
        owner: AgentId,
        others: impl IntoIterator<Item = AgentId>,
        now: DateTime<Utc>,
    ) {
        self.wait_queue.clear();
        self.current_speaker = Some(owner);
        self.turn_started_at = Some(now);
        for agent in others {
            self.wait_queue.push_back(agent);
        }
    }
}
