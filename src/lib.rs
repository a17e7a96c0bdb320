//! Turn scheduling and phase coordination for small agent teams.
//!
//! `quorum` governs *when* an agent on a 2-4 member team is authorized to
//! speak or act, and how the team's collaboration progresses through an
//! ordered list of phases. It is a synchronous, in-memory library: the
//! orchestration layer that spawns agents, delivers messages, and persists
//! state sits outside and drives it one operation at a time per session.

pub mod config;
pub mod coordinator;
pub mod decision;
pub mod error;
pub mod log;
pub mod participant;
pub mod phase;
pub mod scheduling;
pub mod session;
pub mod turn;

pub use config::{CoordinationConfig, SchedulerConfig, TurnConfig};
pub use coordinator::{
    CoordinatorEvent, MinutesReport, ParticipantSpec, PhaseAdvance, PhaseCoordinator,
};
pub use decision::{DecisionImpact, DecisionRecord, DecisionStatus};
pub use error::{Error, Result};
pub use participant::{AgentId, AgentRole, MeetingParticipant, ParticipantStatus};
pub use phase::{default_phases, CollaborativePhase, PhaseOwner};
pub use scheduling::{PhaseRole, PriorityScore, ReasonCategory, TurnScheduler, WorkState};
pub use session::{ArtifactKind, ArtifactLog, CollaborationSession, SessionId, SessionStatus};
pub use turn::{DenialReason, TurnOutcome, TurnRequestKind, TurnResponse};
