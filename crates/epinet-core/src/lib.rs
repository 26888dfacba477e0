//! Epistemic Network Simulation Engine
//!
//! Populations of scientists run binomial experiments, share results over an
//! influence graph and revise their credence in the better theory by
//! trust-discounted Jeffrey updating. A run ends in consensus, abandonment,
//! stable polarization, or at the round horizon.
//!
//! ```no_run
//! use epinet_core::{SimConfig, Simulation};
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! let config = SimConfig::load("epinet.toml")?;
//! let result = Simulation::new(config, SmallRng::seed_from_u64(42))?.run()?;
//! println!("{}", result.outcome.label());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod experiment;
pub mod network;
pub mod priors;
pub mod scoring;
pub mod simulation;
pub mod topology;

pub use agent::{jeffrey_update, Agent, AgentParams, EvidenceBoard, Report};
pub use config::{
    default_config_toml, LifecycleConfig, NetworkConfig, PropagandistConfig, RunConfig, SimConfig, SkepticConfig,
    Topology, DEFAULT_CONFIG_PATH,
};
pub use error::{ConfigError, NumericalError, SimError};
pub use experiment::ExperimentGenerator;
pub use network::{Network, Vacancy};
pub use priors::PriorDistribution;
pub use scoring::BrierTracker;
pub use simulation::{is_stably_polarized, Simulation};
