//! Coordination tunables, loadable from `~/.quorum/quorum.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::{qlog_debug, Error, Result};

/// Priority scoring tunables for the turn scheduler.
///
/// The defaults keep the strict ordering blocked > active > idle and
/// guarantee that a starved agent scores above 5.0 from any state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Base score for an agent reporting a blocked work state.
    pub blocked_score: f64,
    /// Base score for an agent reporting an active work state.
    pub active_score: f64,
    /// Base score for an agent reporting an idle work state.
    pub idle_score: f64,
    /// Added when the agent holds the leader role for the current phase.
    pub leader_bonus: f64,
    /// Added when the agent has not communicated within the starvation window.
    pub starvation_boost: f64,
    /// Seconds of silence before starvation protection kicks in.
    pub starvation_window_secs: u64,
    /// Subtracted when the agent communicated within the recency window.
    pub recent_speaker_penalty: f64,
    /// Seconds during which a recent speaker is penalized.
    pub recency_window_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            blocked_score: 8.0,
            active_score: 5.0,
            idle_score: 2.0,
            leader_bonus: 2.0,
            starvation_boost: 4.0,
            starvation_window_secs: 600,
            recent_speaker_penalty: 2.0,
            recency_window_secs: 120,
        }
    }
}

impl SchedulerConfig {
    pub fn starvation_window(&self) -> Duration {
        Duration::from_secs(self.starvation_window_secs)
    }

    pub fn recency_window(&self) -> Duration {
        Duration::from_secs(self.recency_window_secs)
    }
}

/// Turn protocol tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Advisory budget for a single turn; checked by the sweep, never by a timer.
    pub turn_timeout_secs: u64,
    /// Fixed per-turn estimate used for queue wait projections.
    pub wait_estimate_per_turn_secs: u64,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: 300,
            wait_estimate_per_turn_secs: 120,
        }
    }
}

impl TurnConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn wait_estimate_per_turn(&self) -> Duration {
        Duration::from_secs(self.wait_estimate_per_turn_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoordinationConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub turn: TurnConfig,
}

impl CoordinationConfig {
    pub fn quorum_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".quorum"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::quorum_dir()?.join("quorum.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        qlog_debug!("CoordinationConfig::load path={}", path.display());
        if !path.exists() {
            qlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let quorum_dir = Self::quorum_dir()?;
        if !quorum_dir.exists() {
            qlog_debug!("Creating quorum directory: {}", quorum_dir.display());
            fs::create_dir_all(&quorum_dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        qlog_debug!("Config saved to {}", path.display());
        Ok(())
    }
}
