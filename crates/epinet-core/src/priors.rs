//! Prior Distributions
//!
//! Generators for the initial credences of founding and newly admitted
//! agents.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Lowest credence handed out by the uniform prior. Keeps priors off 0,
/// which is an absorbing state for the update rule.
pub const UNIFORM_LOW: f64 = 0.001;

/// Credence of the confident prior, just above the usual 0.99 threshold.
pub const CONFIDENT_CREDENCE: f64 = 0.991;

/// How a batch of prior credences is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorDistribution {
    /// Uniform on `[low, 1)`
    Uniform {
        #[serde(default = "default_uniform_low")]
        low: f64,
    },
    /// Everyone starts with the same high credence
    Confident {
        #[serde(default = "default_confident_credence")]
        credence: f64,
    },
    /// Explicit credences, one per agent, in population order
    Fixed { credences: Vec<f64> },
}

fn default_uniform_low() -> f64 {
    UNIFORM_LOW
}

fn default_confident_credence() -> f64 {
    CONFIDENT_CREDENCE
}

impl Default for PriorDistribution {
    fn default() -> Self {
        PriorDistribution::Uniform { low: UNIFORM_LOW }
    }
}

impl PriorDistribution {
    /// Draws `count` priors.
    ///
    /// `Fixed` ignores `count` and returns its list as-is; the caller checks
    /// the length against the population it expects.
    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<f64> {
        match self {
            PriorDistribution::Uniform { low } => {
                (0..count).map(|_| rng.gen_range(*low..1.0)).collect()
            }
            PriorDistribution::Confident { credence } => vec![*credence; count],
            PriorDistribution::Fixed { credences } => credences.clone(),
        }
    }

    /// Draws a single prior for an admitted agent.
    ///
    /// `Fixed` cycles through its list by admission index.
    pub fn draw_one<R: Rng + ?Sized>(&self, admission_index: usize, rng: &mut R) -> f64 {
        match self {
            PriorDistribution::Fixed { credences } => credences[admission_index % credences.len()],
            other => other.generate(1, rng)[0],
        }
    }

    pub(crate) fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        match self {
            PriorDistribution::Uniform { low } => {
                if !(0.0..1.0).contains(low) {
                    return Err(ConfigError::invalid(name, format!("uniform low {} is outside [0, 1)", low)));
                }
            }
            PriorDistribution::Confident { credence } => {
                if !(0.0..=1.0).contains(credence) {
                    return Err(ConfigError::invalid(name, format!("credence {} is outside [0, 1]", credence)));
                }
            }
            PriorDistribution::Fixed { credences } => {
                if credences.is_empty() {
                    return Err(ConfigError::invalid(name, "fixed priors need at least one credence"));
                }
                if let Some(bad) = credences.iter().find(|c| !(0.0..=1.0).contains(*c)) {
                    return Err(ConfigError::invalid(name, format!("credence {} is outside [0, 1]", bad)));
                }
            }
        }
        Ok(())
    }
}
