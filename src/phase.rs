//! Collaborative phase definitions.
//!
//! A phase is an ordered stage of work owned by one role (or all roles),
//! with a time budget, expected deliverables, and acceptance criteria.
//! The phase list is fixed at session creation and never reordered.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::participant::AgentRole;

/// Which role owns a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOwner {
    Planner,
    Implementer,
    Tester,
    /// Any participant may hold the floor.
    All,
}

impl PhaseOwner {
    /// Whether an agent with the given role may open a turn in this phase.
    pub fn admits(&self, role: AgentRole) -> bool {
        match self {
            PhaseOwner::Planner => role == AgentRole::Planner,
            PhaseOwner::Implementer => role == AgentRole::Implementer,
            PhaseOwner::Tester => role == AgentRole::Tester,
            PhaseOwner::All => true,
        }
    }
}

impl std::fmt::Display for PhaseOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseOwner::Planner => write!(f, "planner"),
            PhaseOwner::Implementer => write!(f, "implementer"),
            PhaseOwner::Tester => write!(f, "tester"),
            PhaseOwner::All => write!(f, "all"),
        }
    }
}

/// Immutable definition of one stage of the collaboration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborativePhase {
    pub name: String,
    pub description: String,
    pub owner: PhaseOwner,
    /// Time budget for the phase, checked at advancement.
    pub max_duration_secs: u64,
    /// Free-text labels for what the phase is expected to produce.
    pub deliverables: Vec<String>,
    /// Statements the deliverables must satisfy.
    pub acceptance_criteria: Vec<String>,
}

impl CollaborativePhase {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        owner: PhaseOwner,
        max_duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            owner,
            max_duration_secs: max_duration.as_secs(),
            deliverables: Vec::new(),
            acceptance_criteria: Vec::new(),
        }
    }

    pub fn with_deliverables(mut self, deliverables: &[&str]) -> Self {
        self.deliverables = deliverables.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_acceptance_criteria(mut self, criteria: &[&str]) -> Self {
        self.acceptance_criteria = criteria.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}

/// The default four-phase pipeline: Planning, Implementation, Testing, Review.
pub fn default_phases() -> Vec<CollaborativePhase> {
    vec![
        CollaborativePhase::new(
            "Planning",
            "Decompose the objective into tasks and agree on an approach",
            PhaseOwner::Planner,
            Duration::from_secs(30 * 60),
        )
        .with_deliverables(&["task breakdown", "design outline"])
        .with_acceptance_criteria(&["every task has an owner", "open risks are listed"]),
        CollaborativePhase::new(
            "Implementation",
            "Carry out the planned tasks against the workspace",
            PhaseOwner::Implementer,
            Duration::from_secs(120 * 60),
        )
        .with_deliverables(&["implemented changes"])
        .with_acceptance_criteria(&["changes build cleanly"]),
        CollaborativePhase::new(
            "Testing",
            "Exercise the implemented changes and report defects",
            PhaseOwner::Tester,
            Duration::from_secs(60 * 60),
        )
        .with_deliverables(&["test results", "defect list"])
        .with_acceptance_criteria(&["all planned scenarios executed"]),
        CollaborativePhase::new(
            "Review",
            "Walk through outcomes together and sign off",
            PhaseOwner::All,
            Duration::from_secs(30 * 60),
        )
        .with_deliverables(&["review notes"])
        .with_acceptance_criteria(&["each participant has signed off"]),
    ]
}
