//! Configuration loading for simulation runs.
//!
//! A run is described by a single TOML document. Every section has defaults,
//! so a file only needs to name the parameters it changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use epinet_results::AgentRole;

use crate::error::ConfigError;
use crate::priors::PriorDistribution;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "epinet.toml";

/// Influence graph shape. Closed set: anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Topology {
    /// Everyone hears everyone, in a per-agent shuffled order
    #[default]
    Complete,
    /// Each agent hears its left neighbour, itself and its right neighbour
    Cycle,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Complete => f.write_str("complete"),
            Topology::Cycle => f.write_str("cycle"),
        }
    }
}

impl FromStr for Topology {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complete" => Ok(Topology::Complete),
            "cycle" => Ok(Topology::Cycle),
            other => Err(ConfigError::UnsupportedTopology(other.to_string())),
        }
    }
}

impl TryFrom<String> for Topology {
    type Error = ConfigError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

/// Complete configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    /// Prior credences of the founding population
    #[serde(default)]
    pub priors: PriorDistribution,
    #[serde(default)]
    pub simulation: RunConfig,
    /// Generational turnover; required when no consensus threshold is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<LifecycleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeptics: Option<SkepticConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagandists: Option<PropagandistConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            priors: PriorDistribution::default(),
            simulation: RunConfig::default(),
            lifecycle: None,
            skeptics: None,
            propagandists: None,
        }
    }
}

/// Population and per-agent parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Size of the founding scientific community (skeptics included)
    pub population: usize,
    pub topology: Topology,
    /// Binomial trials per experiment
    pub trials_per_round: u32,
    /// Edge of the better theory: success probability is 0.5 + epsilon
    pub epsilon: f64,
    /// Credence below which an agent stops experimenting
    pub low_stop: f64,
    /// Distrust multiplier m applied to credence distance
    pub trust_discount: f64,
    /// Whether an agent counts its own experiment on the complete topology
    pub self_influence: bool,
    /// Coin-flip between experimenting and abstaining at credence exactly 0.5
    pub alternate_at_indifference: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            population: 10,
            topology: Topology::Complete,
            trials_per_round: 1000,
            epsilon: 0.001,
            low_stop: 0.5,
            trust_discount: 0.0,
            self_influence: true,
            alternate_at_indifference: false,
        }
    }
}

/// Round budget and termination thresholds.
///
/// Leaving `consensus_threshold` out of a `[simulation]` table selects
/// lifecycle mode: the run always goes to `max_rounds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus_threshold: Option<f64>,
    /// Credence above which an agent "confidently holds the true view"
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

fn default_max_rounds() -> u32 {
    3000
}

fn default_confidence_threshold() -> f64 {
    0.99
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            consensus_threshold: Some(0.99),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Retirement and admission of agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// One retire/admit cycle every this many rounds
    pub rounds_to_new_agent: u32,
    /// Rounds an agent must have played before it may retire
    pub experience_floor: u32,
    /// Population may not shrink to this fraction of the founding size
    pub contraction_floor: f64,
    /// Experience credited to founding agents
    pub founder_experience: u32,
    /// Priors of newly admitted ordinary agents
    pub admissions_priors: PriorDistribution,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            rounds_to_new_agent: 8,
            experience_floor: 20,
            contraction_floor: 0.7,
            founder_experience: 20,
            admissions_priors: PriorDistribution::default(),
        }
    }
}

/// Agents that never revise their credence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkepticConfig {
    pub count: usize,
    /// Skeptic credences are drawn from `[credence_low, credence_high)`
    pub credence_low: f64,
    pub credence_high: f64,
    /// Whether skeptics run experiments (subject to the low-stop rule)
    pub experiments: bool,
}

impl Default for SkepticConfig {
    fn default() -> Self {
        Self {
            count: 1,
            credence_low: 0.501,
            credence_high: 0.8,
            experiments: true,
        }
    }
}

/// Agents outside the community that publish only unfavourable results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagandistConfig {
    pub count: usize,
    /// Fixed credence listeners use when discounting propagandist evidence
    pub credence: f64,
}

impl Default for PropagandistConfig {
    fn default() -> Self {
        Self {
            count: 1,
            credence: 0.001,
        }
    }
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = content.parse()?;
        if let Some(name) = table
            .get("network")
            .and_then(|network| network.get("topology"))
            .and_then(toml::Value::as_str)
        {
            name.parse::<Topology>()?;
        }
        Ok(toml::Value::Table(table).try_into::<Self>()?)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// True when the run never stops early and reports turnover statistics.
    pub fn is_lifecycle_mode(&self) -> bool {
        self.simulation.consensus_threshold.is_none()
    }

    /// Checks every parameter and combination before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let net = &self.network;

        if net.population == 0 {
            return Err(ConfigError::invalid("network.population", "must be at least 1"));
        }
        if !(net.epsilon > -0.5 && net.epsilon < 0.5) {
            return Err(ConfigError::invalid(
                "network.epsilon",
                format!("{} is outside (-0.5, 0.5)", net.epsilon),
            ));
        }
        if !(0.0..1.0).contains(&net.low_stop) {
            return Err(ConfigError::invalid(
                "network.low_stop",
                format!("{} is outside [0, 1)", net.low_stop),
            ));
        }
        if !net.trust_discount.is_finite() || net.trust_discount < 0.0 {
            return Err(ConfigError::invalid(
                "network.trust_discount",
                format!("{} must be a finite, non-negative number", net.trust_discount),
            ));
        }
        self.priors.validate("priors")?;

        let sim = &self.simulation;
        if sim.max_rounds == 0 {
            return Err(ConfigError::invalid("simulation.max_rounds", "must be at least 1"));
        }
        if !(sim.confidence_threshold > 0.0 && sim.confidence_threshold < 1.0) {
            return Err(ConfigError::invalid(
                "simulation.confidence_threshold",
                format!("{} is outside (0, 1)", sim.confidence_threshold),
            ));
        }

        match (sim.consensus_threshold, &self.lifecycle) {
            (Some(threshold), None) => {
                if !(threshold > net.low_stop && threshold < 1.0) {
                    return Err(ConfigError::invalid(
                        "simulation.consensus_threshold",
                        format!("{} must lie between low_stop ({}) and 1", threshold, net.low_stop),
                    ));
                }
            }
            (Some(_), Some(_)) => return Err(ConfigError::ChurnInStableMode),
            (None, None) => return Err(ConfigError::MissingLifecycle),
            (None, Some(lifecycle)) => {
                if net.topology != Topology::Complete {
                    return Err(ConfigError::ChurnUnsupported(net.topology));
                }
                if lifecycle.rounds_to_new_agent == 0 {
                    return Err(ConfigError::invalid(
                        "lifecycle.rounds_to_new_agent",
                        "must be at least 1",
                    ));
                }
                if !(0.0..=1.0).contains(&lifecycle.contraction_floor) {
                    return Err(ConfigError::invalid(
                        "lifecycle.contraction_floor",
                        format!("{} is outside [0, 1]", lifecycle.contraction_floor),
                    ));
                }
                lifecycle.admissions_priors.validate("lifecycle.admissions_priors")?;
            }
        }

        if let Some(skeptics) = &self.skeptics {
            if net.topology == Topology::Cycle {
                return Err(ConfigError::RoleUnsupported {
                    role: AgentRole::Skeptic,
                    topology: net.topology,
                });
            }
            if skeptics.count > net.population {
                return Err(ConfigError::invalid(
                    "skeptics.count",
                    format!("{} exceeds the population of {}", skeptics.count, net.population),
                ));
            }
            if !(skeptics.credence_low > 0.0
                && skeptics.credence_low < skeptics.credence_high
                && skeptics.credence_high <= 1.0)
            {
                return Err(ConfigError::invalid(
                    "skeptics.credence_low",
                    format!(
                        "range [{}, {}) must be non-empty and inside (0, 1]",
                        skeptics.credence_low, skeptics.credence_high
                    ),
                ));
            }
        }

        if let Some(propagandists) = &self.propagandists {
            if net.topology == Topology::Cycle {
                return Err(ConfigError::RoleUnsupported {
                    role: AgentRole::Propagandist,
                    topology: net.topology,
                });
            }
            if !(0.0..=1.0).contains(&propagandists.credence) {
                return Err(ConfigError::invalid(
                    "propagandists.credence",
                    format!("{} is outside [0, 1]", propagandists.credence),
                ));
            }
        }

        Ok(())
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Epistemic network configuration

[network]
population = 10
topology = "complete"
trials_per_round = 1000
epsilon = 0.001
low_stop = 0.5
trust_discount = 0.0
self_influence = true
alternate_at_indifference = false

[priors]
kind = "uniform"
low = 0.001

[simulation]
max_rounds = 3000
# Remove to run in lifecycle mode (requires a [lifecycle] table)
consensus_threshold = 0.99
confidence_threshold = 0.99
"#
    .to_string()
}
