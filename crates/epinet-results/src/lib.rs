//! Shared record types for epistemic network simulations.
//!
//! This crate contains pure data structures with no simulation logic.
//! The engine in `epinet-core` produces them; aggregators and plotting
//! tools consume them.

pub mod agent;
pub mod result;
pub mod snapshot;

pub use agent::{AgentId, AgentRole, Experiment};

pub use result::{BrierSummary, LifecycleSummary, Outcome, SimulationResult};

pub use snapshot::{AgentSnapshot, NetworkSnapshot, RetiredAgent};
