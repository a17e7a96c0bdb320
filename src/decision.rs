//! Append-only decision ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::AgentId;

/// Unique identifier for a decision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(pub Uuid);

impl DecisionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a decision affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionImpact {
    Phase,
    Objective,
    Process,
}

impl std::fmt::Display for DecisionImpact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionImpact::Phase => write!(f, "phase"),
            DecisionImpact::Objective => write!(f, "objective"),
            DecisionImpact::Process => write!(f, "process"),
        }
    }
}

/// Lifecycle status of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    #[default]
    Pending,
    Accepted,
    Disputed,
    Implemented,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Pending => write!(f, "pending"),
            DecisionStatus::Accepted => write!(f, "accepted"),
            DecisionStatus::Disputed => write!(f, "disputed"),
            DecisionStatus::Implemented => write!(f, "implemented"),
        }
    }
}

/// One audited choice made during the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: DecisionId,
    pub decided_at: DateTime<Utc>,
    pub maker: AgentId,
    pub decision: String,
    pub reasoning: String,
    pub impact: DecisionImpact,
    pub affected: Vec<AgentId>,
    pub status: DecisionStatus,
}

impl DecisionRecord {
    pub fn new(
        maker: AgentId,
        decision: impl Into<String>,
        reasoning: impl Into<String>,
        impact: DecisionImpact,
        affected: Vec<AgentId>,
    ) -> Self {
        Self {
            id: DecisionId::new(),
            decided_at: Utc::now(),
            maker,
            decision: decision.into(),
            reasoning: reasoning.into(),
            impact,
            affected,
            status: DecisionStatus::Pending,
        }
    }
}
