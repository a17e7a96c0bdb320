//! Collaboration session state.
//!
//! A session is one end-to-end collaboration instance: a fixed objective
//! and phase list, a participant roster, the turn context, the decision
//! ledger, and artifact buckets. Sessions are created once and mutated by
//! every subsequent operation; they are retained until the caller discards
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::decision::DecisionRecord;
use crate::participant::{AgentId, MeetingParticipant};
use crate::phase::CollaborativePhase;
use crate::turn::TurnContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Overall session status.
///
/// Progresses along the ladder planning -> implementing -> testing ->
/// reviewing as phases advance, then completed. Failed is only entered on
/// an external report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Planning,
    Implementing,
    Testing,
    Reviewing,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Status for an in-flight phase at the given position.
    ///
    /// Saturates at `Reviewing` for phase lists longer than four.
    pub fn for_phase_index(index: usize) -> Self {
        match index {
            0 => SessionStatus::Planning,
            1 => SessionStatus::Implementing,
            2 => SessionStatus::Testing,
            _ => SessionStatus::Reviewing,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Planning => write!(f, "planning"),
            SessionStatus::Implementing => write!(f, "implementing"),
            SessionStatus::Testing => write!(f, "testing"),
            SessionStatus::Reviewing => write!(f, "reviewing"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Which bucket an artifact lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Created,
    Modified,
    Tested,
    Documented,
}

/// File paths the session touched, bucketed by what happened to them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArtifactLog {
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub tested: Vec<String>,
    pub documented: Vec<String>,
}

impl ArtifactLog {
    pub fn record(&mut self, kind: ArtifactKind, path: impl Into<String>) {
        let bucket = match kind {
            ArtifactKind::Created => &mut self.created,
            ArtifactKind::Modified => &mut self.modified,
            ArtifactKind::Tested => &mut self.tested,
            ArtifactKind::Documented => &mut self.documented,
        };
        bucket.push(path.into());
    }

    pub fn total(&self) -> usize {
        self.created.len() + self.modified.len() + self.tested.len() + self.documented.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A phase entry with the instant it was entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseHistoryEntry {
    pub phase_index: usize,
    pub name: String,
    pub entered_at: DateTime<Utc>,
}

/// One end-to-end collaboration instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborationSession {
    pub id: SessionId,
    pub objective: String,
    /// Opaque workspace reference handed through to collaborators.
    pub workspace: PathBuf,
    /// Coordination room handed to the messaging collaborator.
    pub room_id: String,
    /// Roster in join order; participants are never removed.
    pub participants: Vec<MeetingParticipant>,
    pub phases: Vec<CollaborativePhase>,
    /// Monotonically non-decreasing, bounded by `phases.len()`.
    pub phase_index: usize,
    pub phase_history: Vec<PhaseHistoryEntry>,
    pub turn: TurnContext,
    pub decisions: Vec<DecisionRecord>,
    pub artifacts: ArtifactLog,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

impl CollaborationSession {
    pub fn participant(&self, agent: &AgentId) -> Option<&MeetingParticipant> {
        self.participants.iter().find(|p| &p.agent_id == agent)
    }

    pub fn participant_mut(&mut self, agent: &AgentId) -> Option<&mut MeetingParticipant> {
        self.participants.iter_mut().find(|p| &p.agent_id == agent)
    }

    pub fn is_participant(&self, agent: &AgentId) -> bool {
        self.participant(agent).is_some()
    }

    /// The phase currently in progress, `None` once the list is exhausted.
    pub fn current_phase(&self) -> Option<&CollaborativePhase> {
        self.phases.get(self.phase_index)
    }

    /// When the current phase was entered.
    pub fn phase_started_at(&self) -> Option<DateTime<Utc>> {
        self.phase_history.last().map(|entry| entry.entered_at)
    }

    /// Roster ids in join order, excluding one agent.
    pub fn roster_except(&self, agent: &AgentId) -> Vec<AgentId> {
        self.participants
            .iter()
            .filter(|p| &p.agent_id != agent)
            .map(|p| p.agent_id.clone())
            .collect()
    }

    pub fn is_ended(&self) -> bool {
        self.status.is_terminal()
    }
}
