//! Meeting participants and their roles within a collaboration session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque agent identifier supplied by the identity collaborator.
///
/// The coordinator never interprets the contents; it only compares and
/// displays them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Functional role an agent plays for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Owns planning and may escalate to seize the turn.
    Planner,
    /// Owns implementation work.
    Implementer,
    /// Owns testing and verification.
    Tester,
}

impl AgentRole {
    /// Only planners may interrupt the current speaker.
    pub fn can_escalate(&self) -> bool {
        matches!(self, AgentRole::Planner)
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Planner => write!(f, "planner"),
            AgentRole::Implementer => write!(f, "implementer"),
            AgentRole::Tester => write!(f, "tester"),
        }
    }
}

/// Lifecycle status of a participant within the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[default]
    Active,
    Waiting,
    Speaking,
    Completed,
    Blocked,
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantStatus::Active => write!(f, "active"),
            ParticipantStatus::Waiting => write!(f, "waiting"),
            ParticipantStatus::Speaking => write!(f, "speaking"),
            ParticipantStatus::Completed => write!(f, "completed"),
            ParticipantStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// One agent's seat at the table.
///
/// Created at session initialization and mutated for the life of the
/// session; participants are never removed, only their status changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingParticipant {
    pub agent_id: AgentId,
    /// Free-form agent-type label (e.g. "claude", "codex").
    pub agent_type: String,
    pub role: AgentRole,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl MeetingParticipant {
    pub fn new(agent_id: AgentId, agent_type: impl Into<String>, role: AgentRole) -> Self {
        let now = Utc::now();
        Self {
            agent_id,
            agent_type: agent_type.into(),
            role,
            status: ParticipantStatus::Active,
            joined_at: now,
            last_active: now,
        }
    }

    /// Stamp activity and move to the given status.
    pub fn touch(&mut self, status: ParticipantStatus) {
        self.status = status;
        self.last_active = Utc::now();
    }
}
