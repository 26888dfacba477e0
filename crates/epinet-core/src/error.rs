//! Error Types
//!
//! Configuration errors are surfaced before a run starts. Simulation errors
//! abort a run and indicate either a bad configuration that slipped through
//! or a bug in the engine.

use thiserror::Error;

use epinet_results::{AgentId, AgentRole};

use crate::config::Topology;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config could not be rendered back to TOML
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Topology name outside the supported set
    #[error("unsupported topology '{0}' (expected 'complete' or 'cycle')")]
    UnsupportedTopology(String),

    /// Skeptics or propagandists requested on a topology that cannot place them
    #[error("{role} agents are not supported on a {topology} network")]
    RoleUnsupported { role: AgentRole, topology: Topology },

    /// Lifecycle mode (no consensus threshold) without a `[lifecycle]` section
    #[error("lifecycle mode requires a [lifecycle] section")]
    MissingLifecycle,

    /// Churn configured for a run that looks for a stable outcome
    #[error("lifecycle churn cannot be combined with a consensus threshold")]
    ChurnInStableMode,

    /// Churn is only wired for the complete topology
    #[error("lifecycle churn is not supported on a {0} network")]
    ChurnUnsupported(Topology),

    /// A numeric parameter is outside its domain
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The prior distribution produced the wrong number of credences
    #[error("expected {expected} initial credences, prior distribution produced {actual}")]
    PopulationMismatch { expected: usize, actual: usize },

    /// An agent id was looked up that is not in the active population
    #[error("{0} is not in the active population")]
    UnknownAgent(AgentId),

    /// Only community members retire
    #[error("{agent} is a {role} and cannot retire")]
    NotRetirable { agent: AgentId, role: AgentRole },

    /// The update rule left the unit interval or produced NaN
    #[error("numerical failure updating {agent}: {source}")]
    Numerical {
        agent: AgentId,
        #[source]
        source: NumericalError,
    },
}

/// Out-of-domain values met inside the Jeffrey update.
///
/// Valid configurations never produce these; seeing one means the epsilon or
/// trial count pushed the likelihoods outside what `f64` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NumericalError {
    #[error("marginal likelihood P(E) = {0} is not a probability")]
    Marginal(f64),

    #[error("posterior credence {0} left [0, 1]")]
    Posterior(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_unsupported_display() {
        let err = ConfigError::RoleUnsupported {
            role: AgentRole::Skeptic,
            topology: Topology::Cycle,
        };
        assert_eq!(
            err.to_string(),
            "skeptic agents are not supported on a cycle network"
        );
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = ConfigError::invalid("epsilon", "must lie in (-0.5, 0.5)");
        assert!(err.to_string().contains("epsilon"));
        assert!(err.to_string().contains("(-0.5, 0.5)"));
    }

    #[test]
    fn test_config_error_converts_to_sim_error() {
        let err: SimError = ConfigError::MissingLifecycle.into();
        assert!(matches!(err, SimError::Config(ConfigError::MissingLifecycle)));
        assert!(err.to_string().contains("[lifecycle]"));
    }

    #[test]
    fn test_numerical_error_chains_source() {
        use std::error::Error as _;

        let err = SimError::Numerical {
            agent: AgentId(2),
            source: NumericalError::Posterior(f64::NAN),
        };
        assert!(err.to_string().contains("agent_0002"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_unknown_agent_display() {
        let err = SimError::UnknownAgent(AgentId(3));
        assert!(err.to_string().contains("agent_0003"));
    }
}
