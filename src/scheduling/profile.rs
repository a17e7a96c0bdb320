//! Per-agent mutable state read by the priority scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Work state reported by the owning agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkState {
    #[default]
    Idle,
    Active,
    /// Waiting on another agent or external input; scheduled first.
    Blocked,
}

impl std::fmt::Display for WorkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkState::Idle => write!(f, "idle"),
            WorkState::Active => write!(f, "active"),
            WorkState::Blocked => write!(f, "blocked"),
        }
    }
}

/// Standing of an agent within the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseRole {
    Leader,
    #[default]
    Participant,
}

impl std::fmt::Display for PhaseRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseRole::Leader => write!(f, "leader"),
            PhaseRole::Participant => write!(f, "participant"),
        }
    }
}

/// Monotone communication counters; feeds decay and starvation checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationMetrics {
    pub messages_sent: u64,
    pub last_activity: DateTime<Utc>,
}

impl CommunicationMetrics {
    pub fn new() -> Self {
        Self {
            messages_sent: 0,
            last_activity: Utc::now(),
        }
    }

    /// Record one completed communication. Counters never decrease.
    pub fn record(&mut self) {
        self.messages_sent += 1;
        self.last_activity = Utc::now();
    }

    /// Seconds of silence as of `now`. Clock skew clamps to zero.
    pub fn silence_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.last_activity).num_seconds().max(0) as u64
    }
}

impl Default for CommunicationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the scheduler knows about one agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentProfile {
    pub work_state: WorkState,
    pub phase_role: PhaseRole,
    pub metrics: CommunicationMetrics,
}
