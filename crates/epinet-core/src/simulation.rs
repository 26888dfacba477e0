//! Simulation
//!
//! Drives a network round by round until it reaches a terminal state or the
//! round budget runs out, scoring the community along the way.
//!
//! In stable-outcome mode each round checks, in priority order:
//! 1. Abandoned: every community member is at or below the low-stop threshold
//! 2. Consensus: every community member is above the consensus threshold
//! 3. Stable polarization: see [`is_stably_polarized`]
//!
//! Lifecycle runs never stop early and always report the horizon.

use rand::Rng;
use tracing::{debug, info};

use epinet_results::{LifecycleSummary, Outcome, SimulationResult};

use crate::agent::Agent;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::network::Network;
use crate::scoring::{mean_retired_penalty, proportion_above, BrierTracker};

/// One run of one configuration, owning its random source.
#[derive(Debug)]
pub struct Simulation<R: Rng> {
    config: SimConfig,
    network: Network,
    brier: BrierTracker,
    rng: R,
}

impl<R: Rng> Simulation<R> {
    pub fn new(config: SimConfig, mut rng: R) -> Result<Self, SimError> {
        let network = Network::new(&config, &mut rng)?;
        let brier = BrierTracker::new(config.skeptics.is_some());
        Ok(Self {
            config,
            network,
            brier,
            rng,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Plays rounds `1..=max_rounds`. Each round scores the state it starts
    /// from, checks for a terminal state and otherwise advances the network.
    pub fn run(mut self) -> Result<SimulationResult, SimError> {
        let max_rounds = self.config.simulation.max_rounds;
        let consensus_threshold = self.config.simulation.consensus_threshold;
        debug!(
            max_rounds,
            lifecycle = self.config.is_lifecycle_mode(),
            "Simulation started"
        );

        for round in 1..=max_rounds {
            self.brier.record(self.network.community());

            if let Some(threshold) = consensus_threshold {
                if let Some(outcome) = self.terminal_outcome(round, threshold) {
                    return Ok(self.finish(outcome));
                }
            }

            self.network.advance_round(&mut self.rng)?;
        }

        Ok(self.finish(Outcome::UnstableHorizonReached { round: max_rounds }))
    }

    fn terminal_outcome(&self, round: u32, threshold: f64) -> Option<Outcome> {
        let community: Vec<&Agent> = self.network.community().collect();

        if community.iter().all(|a| a.credence() <= a.low_stop()) {
            Some(Outcome::Abandoned { round })
        } else if community.iter().all(|a| a.credence() > threshold) {
            Some(Outcome::Consensus { round })
        } else if is_stably_polarized(&community, threshold) {
            Some(Outcome::StablePolarization { round })
        } else {
            None
        }
    }

    fn finish(self, outcome: Outcome) -> SimulationResult {
        let confidence = self.config.simulation.confidence_threshold;
        let working: Vec<f64> = self.network.community().map(Agent::credence).collect();
        let retired = self.network.retired();
        let prop_working = proportion_above(working.iter().copied(), confidence).unwrap_or(0.0);

        // Lifecycle runs count everyone who ever held a seat
        let prop_confident = if self.config.is_lifecycle_mode() {
            let everyone = working.iter().copied().chain(retired.iter().map(|r| r.final_credence));
            proportion_above(everyone, confidence).unwrap_or(0.0)
        } else {
            prop_working
        };

        let lifecycle = self.config.is_lifecycle_mode().then(|| {
            LifecycleSummary {
                turnover: retired.len(),
                n_all_agents: working.len() + retired.len(),
                prop_working_confident: prop_working,
                prop_retired_confident: proportion_above(retired.iter().map(|r| r.final_credence), confidence),
                av_retired_brier_penalty: mean_retired_penalty(retired),
            }
        });

        let brier = self.brier.summary();
        info!(
            outcome = outcome.label(),
            round = outcome.round(),
            brier_ratio = brier.ratio,
            prop_confident,
            "Simulation finished"
        );

        SimulationResult {
            outcome,
            rounds_played: self.network.rounds_played(),
            prop_confident_in_true_view: prop_confident,
            brier,
            lifecycle,
        }
    }
}

/// True when the community has split for good: everyone is either above
/// `threshold` or has stopped experimenting and sits beyond the reach of
/// every confident agent (`dm >= 1`).
///
/// All-confident and all-abstaining communities are not polarized.
pub fn is_stably_polarized(agents: &[&Agent], threshold: f64) -> bool {
    if agents.iter().all(|a| a.credence() > threshold) {
        return false;
    }
    if agents.iter().all(|a| a.credence() <= a.low_stop()) {
        return false;
    }

    let confident: Vec<&Agent> = agents.iter().copied().filter(|a| a.credence() > threshold).collect();

    agents.iter().all(|agent| {
        if agent.credence() > threshold {
            true
        } else if agent.credence() > agent.low_stop() {
            // Still experimenting
            false
        } else {
            confident.iter().all(|high| agent.dm(high) >= 1.0)
        }
    })
}
