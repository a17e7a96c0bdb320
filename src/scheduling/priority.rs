//! Priority scores with structured reasons.
//!
//! Each contribution to a score carries a tagged category so callers can
//! assert on *why* an agent scored the way it did without substring-matching
//! prose; the category renders to a descriptive phrase at the boundary.

use serde::{Deserialize, Serialize};

/// Category of one scoring contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    BlockedState,
    ActiveState,
    IdleState,
    PhaseLeader,
    StarvationProtection,
    RecentSpeakerPenalty,
}

impl std::fmt::Display for ReasonCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasonCategory::BlockedState => write!(f, "Blocked state"),
            ReasonCategory::ActiveState => write!(f, "Active state"),
            ReasonCategory::IdleState => write!(f, "Idle state"),
            ReasonCategory::PhaseLeader => write!(f, "Phase leader"),
            ReasonCategory::StarvationProtection => write!(f, "Starvation protection"),
            ReasonCategory::RecentSpeakerPenalty => write!(f, "Recent speaker penalty"),
        }
    }
}

/// One scoring contribution with its signed delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityReason {
    pub category: ReasonCategory,
    pub delta: f64,
}

/// Computed priority for an agent at a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    pub value: f64,
    pub reasons: Vec<PriorityReason>,
}

impl PriorityScore {
    pub(crate) fn new() -> Self {
        Self {
            value: 0.0,
            reasons: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, category: ReasonCategory, delta: f64) {
        self.value += delta;
        self.reasons.push(PriorityReason { category, delta });
    }

    pub fn has_reason(&self, category: ReasonCategory) -> bool {
        self.reasons.iter().any(|r| r.category == category)
    }

    /// Render the reasons as a single human-readable string.
    pub fn reason_text(&self) -> String {
        self.reasons
            .iter()
            .map(|r| r.category.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
