//! Meeting minutes: a read-side projection over session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::decision::DecisionRecord;
use crate::error::Result;
use crate::participant::{AgentId, AgentRole};
use crate::phase::PhaseOwner;
use crate::session::{ArtifactLog, SessionId, SessionStatus};
use crate::turn::TurnOutcome;

use super::PhaseCoordinator;

/// Whether a phase has been passed or is still ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    Completed,
    Pending,
}

/// One phase as reported in the minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub name: String,
    pub owner: PhaseOwner,
    pub outcome: PhaseOutcome,
    /// Wall-clock time spent in the phase; `None` if never entered.
    pub duration_secs: Option<u64>,
}

/// One participant's contribution totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionSummary {
    pub agent_id: AgentId,
    pub agent_type: String,
    pub role: AgentRole,
    pub turns_taken: usize,
    pub turns_completed: usize,
    /// Total time this agent held the floor, across all turns.
    pub active_secs: u64,
}

/// The full minutes report for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinutesReport {
    pub session_id: SessionId,
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    pub status: SessionStatus,
    pub phases: Vec<PhaseSummary>,
    pub decisions: Vec<DecisionRecord>,
    pub artifacts: ArtifactLog,
    pub contributions: Vec<ContributionSummary>,
    pub recommendations: Vec<String>,
}

impl PhaseCoordinator {
    /// Project the session state into a minutes report.
    ///
    /// Pure read side: generating minutes mutates nothing and can be done
    /// at any point in the session's life.
    pub fn generate_minutes(&self, session_id: &SessionId) -> Result<MinutesReport> {
        let session = self.get_session(session_id)?;
        let now = Utc::now();
        let end = session.ended_at.unwrap_or(now);
        let elapsed_secs = (end - session.started_at).num_seconds().max(0) as u64;

        let summary = format!(
            "Objective: {} | Duration: {}s | Status: {}",
            session.objective, elapsed_secs, session.status
        );

        // Per-phase durations from the entry history: a phase ends when the
        // next one is entered, or when the session ends.
        let mut durations: HashMap<usize, u64> = HashMap::new();
        for (i, entry) in session.phase_history.iter().enumerate() {
            let phase_end = session
                .phase_history
                .get(i + 1)
                .map(|next| next.entered_at)
                .unwrap_or(end);
            let duration = (phase_end - entry.entered_at).num_seconds().max(0) as u64;
            durations.insert(entry.phase_index, duration);
        }

        let phases = session
            .phases
            .iter()
            .enumerate()
            .map(|(i, phase)| PhaseSummary {
                name: phase.name.clone(),
                owner: phase.owner,
                outcome: if i < session.phase_index {
                    PhaseOutcome::Completed
                } else {
                    PhaseOutcome::Pending
                },
                duration_secs: durations.get(&i).copied(),
            })
            .collect();

        let contributions: Vec<ContributionSummary> = session
            .participants
            .iter()
            .map(|participant| {
                let turns: Vec<_> = session
                    .turn
                    .history
                    .iter()
                    .filter(|record| record.agent_id == participant.agent_id)
                    .collect();
                ContributionSummary {
                    agent_id: participant.agent_id.clone(),
                    agent_type: participant.agent_type.clone(),
                    role: participant.role,
                    turns_taken: turns.len(),
                    turns_completed: turns
                        .iter()
                        .filter(|record| record.outcome == TurnOutcome::Completed)
                        .count(),
                    active_secs: turns.iter().map(|record| record.duration_secs()).sum(),
                }
            })
            .collect();

        let mut recommendations = Vec::new();
        if session.decisions.is_empty() {
            recommendations.push(
                "No decisions were recorded; capture key choices as decision records".to_string(),
            );
        }
        if session.artifacts.is_empty() {
            recommendations.push(
                "No artifacts were recorded; the session produced no tracked output".to_string(),
            );
        }
        if !session.turn.history.is_empty() {
            for contribution in &contributions {
                if contribution.turns_taken == 0 {
                    recommendations.push(format!(
                        "Participant {} never held the floor; check for starvation",
                        contribution.agent_id
                    ));
                }
            }
        }

        Ok(MinutesReport {
            session_id: *session_id,
            generated_at: now,
            summary,
            status: session.status,
            phases,
            decisions: session.decisions.clone(),
            artifacts: session.artifacts.clone(),
            contributions,
            recommendations,
        })
    }
}
