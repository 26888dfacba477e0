//! Agent Identity Types
//!
//! Identifiers, roles and binomial experiment records shared between the
//! engine and its consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for an agent. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{:04}", self.0)
    }
}

/// What kind of participant an agent is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Experiments while credence allows and updates on evidence
    #[default]
    Ordinary,
    /// Never revises its credence; may still experiment
    Skeptic,
    /// Always experiments, reports only results that favor the false theory
    Propagandist,
}

impl AgentRole {
    /// Whether this role revises its own credence on evidence.
    pub fn updates_credence(&self) -> bool {
        matches!(self, AgentRole::Ordinary)
    }

    /// Whether this role belongs to the scientific community being studied.
    ///
    /// Propagandists sit outside it: they are never scored, never retire and
    /// never count towards consensus or abandonment.
    pub fn is_community(&self) -> bool {
        !matches!(self, AgentRole::Propagandist)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Ordinary => "ordinary",
            AgentRole::Skeptic => "skeptic",
            AgentRole::Propagandist => "propagandist",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one round of binomial trials: `successes` out of `trials`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub successes: u32,
    pub trials: u32,
}

impl Experiment {
    pub fn new(successes: u32, trials: u32) -> Self {
        debug_assert!(successes <= trials);
        Self { successes, trials }
    }

    /// Observed success proportion, `None` for an empty experiment.
    pub fn success_rate(&self) -> Option<f64> {
        if self.trials == 0 {
            None
        } else {
            Some(self.successes as f64 / self.trials as f64)
        }
    }

    /// True when fewer than half the trials succeeded.
    pub fn favors_false_theory(&self) -> bool {
        // 2k < n avoids the division and treats n = 0 as neutral
        (self.successes as u64) * 2 < self.trials as u64
    }
}
