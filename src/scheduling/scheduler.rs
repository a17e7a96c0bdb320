//! Priority-based speaker selection.
//!
//! The `TurnScheduler` owns a per-agent map of work state, phase role, and
//! communication metrics, updated through explicit mutation methods. Scoring
//! is additive: a base from the work state, a leadership bonus, an
//! anti-starvation boost, and a recent-speaker penalty. `next_speaker` picks
//! the strict maximum over a candidate set, breaking ties by first-seen
//! order, so repeated calls with unchanged inputs are reproducible.
//!
//! The scheduler holds no session state of its own; callers that share one
//! scheduler across sessions must session-qualify agent identifiers.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::participant::AgentId;
use crate::{qlog_trace, qlog_warn};

use super::priority::{PriorityScore, ReasonCategory};
use super::profile::{AgentProfile, PhaseRole, WorkState};

pub struct TurnScheduler {
    config: SchedulerConfig,
    agents: HashMap<AgentId, AgentProfile>,
}

impl TurnScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            agents: HashMap::new(),
        }
    }

    /// Make an agent known to the scheduler with a fresh default profile.
    ///
    /// Registering an already-known agent leaves its profile untouched.
    pub fn register(&mut self, agent: AgentId) {
        self.agents.entry(agent).or_default();
    }

    pub fn is_registered(&self, agent: &AgentId) -> bool {
        self.agents.contains_key(agent)
    }

    pub fn profile(&self, agent: &AgentId) -> Option<&AgentProfile> {
        self.agents.get(agent)
    }

    /// Report the agent's current work state.
    pub fn update_work_state(&mut self, agent: &AgentId, state: WorkState) -> Result<()> {
        let profile = self.profile_mut(agent)?;
        profile.work_state = state;
        Ok(())
    }

    /// Assign the agent's standing for the current phase.
    pub fn set_phase_role(&mut self, agent: &AgentId, role: PhaseRole) -> Result<()> {
        let profile = self.profile_mut(agent)?;
        profile.phase_role = role;
        Ok(())
    }

    /// Record one completed communication (turn completion or message sent).
    pub fn record_communication_activity(&mut self, agent: &AgentId) -> Result<()> {
        let profile = self.profile_mut(agent)?;
        profile.metrics.record();
        Ok(())
    }

    /// Compute the agent's priority as of now.
    pub fn priority(&self, agent: &AgentId) -> Result<PriorityScore> {
        self.priority_at(agent, Utc::now())
    }

    /// Compute the agent's priority at a fixed instant.
    ///
    /// Deterministic for a given profile and `now`; the time-sensitive
    /// contributions (starvation, recency) are evaluated against `now`.
    pub fn priority_at(&self, agent: &AgentId, now: DateTime<Utc>) -> Result<PriorityScore> {
        let profile = self
            .agents
            .get(agent)
            .ok_or_else(|| Error::AgentNotRegistered(agent.to_string()))?;

        let mut score = PriorityScore::new();

        match profile.work_state {
            WorkState::Blocked => score.add(ReasonCategory::BlockedState, self.config.blocked_score),
            WorkState::Active => score.add(ReasonCategory::ActiveState, self.config.active_score),
            WorkState::Idle => score.add(ReasonCategory::IdleState, self.config.idle_score),
        }

        if profile.phase_role == PhaseRole::Leader {
            score.add(ReasonCategory::PhaseLeader, self.config.leader_bonus);
        }

        let silence = profile.metrics.silence_secs(now);
        if silence > self.config.starvation_window_secs {
            score.add(ReasonCategory::StarvationProtection, self.config.starvation_boost);
        } else if profile.metrics.messages_sent > 0 && silence < self.config.recency_window_secs {
            // A freshly registered agent has never spoken; only actual
            // recent communication draws the penalty.
            score.add(
                ReasonCategory::RecentSpeakerPenalty,
                -self.config.recent_speaker_penalty,
            );
        }

        qlog_trace!(
            "priority agent={} value={:.1} reasons={}",
            agent,
            score.value,
            score.reason_text()
        );

        Ok(score)
    }

    /// Select the highest-priority agent among the candidates as of now.
    pub fn next_speaker(&self, candidates: &[AgentId]) -> Option<AgentId> {
        self.next_speaker_at(candidates, Utc::now())
    }

    /// Select the highest-priority candidate at a fixed instant.
    ///
    /// Ties are broken by first-seen order in the candidate list.
    /// Unregistered candidates are skipped.
    pub fn next_speaker_at(
        &self,
        candidates: &[AgentId],
        now: DateTime<Utc>,
    ) -> Option<AgentId> {
        let mut best: Option<(&AgentId, f64)> = None;
        for candidate in candidates {
            let score = match self.priority_at(candidate, now) {
                Ok(score) => score,
                Err(_) => {
                    qlog_warn!("next_speaker skipping unregistered candidate {}", candidate);
                    continue;
                }
            };
            match best {
                // Strictly greater only: an equal score keeps the earlier candidate.
                Some((_, best_value)) if score.value <= best_value => {}
                _ => best = Some((candidate, score.value)),
            }
        }
        best.map(|(agent, _)| agent.clone())
    }

    fn profile_mut(&mut self, agent: &AgentId) -> Result<&mut AgentProfile> {
        self.agents
            .get_mut(agent)
            .ok_or_else(|| Error::AgentNotRegistered(agent.to_string()))
    }
}
