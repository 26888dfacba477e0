//! Simulation Result Types
//!
//! One `SimulationResult` is emitted per run. Aggregation across runs
//! (means, standard deviations, CSV output) happens downstream.

use serde::{Deserialize, Serialize};

/// Terminal condition of a run and the round at which it was reached.
///
/// Exactly one condition is reported per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Every community agent exceeded the consensus threshold
    Consensus { round: u32 },
    /// Every community agent fell to or below the low-stop threshold
    Abandoned { round: u32 },
    /// Confident believers and unreachable laggards, frozen apart
    StablePolarization { round: u32 },
    /// Round cap reached without another terminal condition
    UnstableHorizonReached { round: u32 },
}

impl Outcome {
    pub fn round(&self) -> u32 {
        match *self {
            Outcome::Consensus { round }
            | Outcome::Abandoned { round }
            | Outcome::StablePolarization { round }
            | Outcome::UnstableHorizonReached { round } => round,
        }
    }

    pub fn consensus_round(&self) -> Option<u32> {
        match *self {
            Outcome::Consensus { round } => Some(round),
            _ => None,
        }
    }

    pub fn abandoned_round(&self) -> Option<u32> {
        match *self {
            Outcome::Abandoned { round } => Some(round),
            _ => None,
        }
    }

    pub fn stable_polarization_round(&self) -> Option<u32> {
        match *self {
            Outcome::StablePolarization { round } => Some(round),
            _ => None,
        }
    }

    pub fn unstable_round(&self) -> Option<u32> {
        match *self {
            Outcome::UnstableHorizonReached { round } => Some(round),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Consensus { .. } => "consensus",
            Outcome::Abandoned { .. } => "abandoned",
            Outcome::StablePolarization { .. } => "stable_polarization",
            Outcome::UnstableHorizonReached { .. } => "unstable_horizon_reached",
        }
    }
}

/// Accumulated Brier penalties over a run.
///
/// Each scored agent contributes `(credence - 1)^2` per round, so the
/// maximum obtainable penalty is the number of agent-rounds scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrierSummary {
    pub total_penalty: f64,
    pub max_penalty: f64,
    pub ratio: f64,
    /// Same ratio with skeptics left out; only present when skeptics were configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_skeptic_ratio: Option<f64>,
}

/// Turnover statistics, present only for lifecycle runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleSummary {
    /// Number of retire/admit cycles that took place
    pub turnover: usize,
    /// Active plus retired agents
    pub n_all_agents: usize,
    pub prop_working_confident: f64,
    /// `None` when nobody retired during the run
    #[serde(default)]
    pub prop_retired_confident: Option<f64>,
    #[serde(default)]
    pub av_retired_brier_penalty: Option<f64>,
}

/// Immutable summary of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Rounds the network actually advanced
    pub rounds_played: u32,
    /// Fraction of agents above the confidence threshold at the end of the run
    pub prop_confident_in_true_view: f64,
    pub brier: BrierSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<LifecycleSummary>,
}

impl SimulationResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
