//! End-to-end scenarios
//!
//! Terminal-state detection, topology shapes, the round barrier and
//! lifecycle churn, driven through the public API.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashSet;

use epinet_core::{
    jeffrey_update, LifecycleConfig, Network, PriorDistribution, PropagandistConfig, RunConfig, SimConfig,
    Simulation, SkepticConfig, Topology,
};
use epinet_results::{AgentId, AgentRole, Outcome};

fn fixed_config(credences: Vec<f64>) -> SimConfig {
    let mut config = SimConfig::default();
    config.network.population = credences.len();
    config.network.trials_per_round = 1000;
    config.network.epsilon = 0.1;
    config.network.low_stop = 0.5;
    config.priors = PriorDistribution::Fixed { credences };
    config.simulation.max_rounds = 50;
    config
}

fn lifecycle_config(population: usize, max_rounds: u32) -> SimConfig {
    let mut config = SimConfig::default();
    config.network.population = population;
    config.network.trials_per_round = 50;
    config.network.epsilon = 0.02;
    config.simulation = RunConfig {
        max_rounds,
        consensus_threshold: None,
        ..RunConfig::default()
    };
    config.lifecycle = Some(LifecycleConfig::default());
    config
}

fn run(config: SimConfig, seed: u64) -> epinet_results::SimulationResult {
    Simulation::new(config, SmallRng::seed_from_u64(seed)).unwrap().run().unwrap()
}

// ============================================================================
// Terminal states
// ============================================================================

#[test]
fn test_split_beyond_trust_is_stable_polarization() {
    let mut config = fixed_config(vec![0.999, 0.3]);
    config.network.trust_discount = 2.0;

    assert_eq!(run(config, 1).outcome, Outcome::StablePolarization { round: 1 });
}

#[test]
fn test_split_within_trust_keeps_running() {
    // dm = 0.699 * 1.2 < 1: the low agent can still be pulled up
    let mut config = fixed_config(vec![0.999, 0.3]);
    config.network.trust_discount = 1.2;

    assert_ne!(run(config, 1).outcome, Outcome::StablePolarization { round: 1 });
}

#[test]
fn test_everyone_below_low_stop_is_abandoned() {
    assert_eq!(run(fixed_config(vec![0.3; 5]), 1).outcome, Outcome::Abandoned { round: 1 });
}

#[test]
fn test_everyone_confident_is_consensus() {
    let result = run(fixed_config(vec![0.995; 5]), 1);
    assert_eq!(result.outcome, Outcome::Consensus { round: 1 });
    assert_eq!(result.rounds_played, 0);
}

#[test]
fn test_abandonment_takes_priority() {
    // A lone sub-threshold agent satisfies the abandonment check first
    let mut config = fixed_config(vec![0.001]);
    config.network.self_influence = false;

    assert_eq!(run(config, 1).outcome, Outcome::Abandoned { round: 1 });
}

#[test]
fn test_agent_without_influencers_never_updates() {
    let mut config = fixed_config(vec![0.001]);
    config.network.self_influence = false;
    let mut rng = SmallRng::seed_from_u64(8);
    let mut network = Network::new(&config, &mut rng).unwrap();
    assert!(network.agents()[0].influencers().is_empty());

    for _ in 0..50 {
        network.advance_round(&mut rng).unwrap();
    }

    assert_eq!(network.rounds_played(), 50);
    assert_eq!(network.agents()[0].credence(), 0.001);

    // An experimenting agent with nobody to listen to runs out the clock
    let mut config = fixed_config(vec![0.7]);
    config.network.self_influence = false;
    let result = run(config, 8);

    assert_eq!(result.outcome, Outcome::UnstableHorizonReached { round: 50 });
    assert_eq!(result.rounds_played, 50);
    assert_eq!(result.prop_confident_in_true_view, 0.0);
    assert!((result.brier.total_penalty - 50.0 * 0.09).abs() < 1e-9);
}

#[test]
fn test_consensus_reached_from_open_minds() {
    let mut config = fixed_config(vec![0.55, 0.6, 0.65, 0.7, 0.75, 0.8]);
    config.network.trials_per_round = 100;
    config.simulation.max_rounds = 1000;

    let result = run(config, 2024);

    assert!(result.outcome.consensus_round().is_some(), "got {:?}", result.outcome);
    assert_eq!(result.prop_confident_in_true_view, 1.0);
}

#[test]
fn test_propagandist_does_not_block_termination_checks() {
    let mut config = fixed_config(vec![0.995; 4]);
    config.propagandists = Some(PropagandistConfig::default());

    // The propagandist's own credence never counts against consensus
    assert_eq!(run(config, 3).outcome, Outcome::Consensus { round: 1 });
}

// ============================================================================
// Topology
// ============================================================================

#[test]
fn test_complete_topology_counts() {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut config = fixed_config(vec![0.6; 7]);

    let network = Network::new(&config, &mut rng).unwrap();
    assert!(network.agents().iter().all(|a| a.influencers().len() == 7));

    config.network.self_influence = false;
    let network = Network::new(&config, &mut rng).unwrap();
    assert!(network.agents().iter().all(|a| a.influencers().len() == 6));
}

#[test]
fn test_cycle_topology_counts() {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut config = fixed_config(vec![0.6; 9]);
    config.network.topology = Topology::Cycle;

    let network = Network::new(&config, &mut rng).unwrap();

    for agent in network.agents() {
        assert_eq!(agent.influencers().len(), 3);
        assert!(agent.influencers().contains(&agent.id()));
    }
}

// ============================================================================
// Round barrier
// ============================================================================

/// With no discount, every agent ends the round at the Bayesian posterior of
/// its pre-round credence given all of the round's evidence, whatever order
/// it hears it in.
#[test]
fn test_updates_read_pre_round_state() {
    let mut config = fixed_config(vec![0.6, 0.7, 0.8]);
    config.network.trials_per_round = 20;
    config.network.epsilon = 0.05;
    let mut rng = SmallRng::seed_from_u64(31);
    let mut network = Network::new(&config, &mut rng).unwrap();
    let before: Vec<f64> = network.agents().iter().map(|a| a.credence()).collect();

    network.advance_round(&mut rng).unwrap();

    let (k, n) = network
        .agents()
        .iter()
        .filter_map(|a| a.previous_experiment())
        .fold((0i32, 0i32), |(k, n), e| (k + e.successes as i32, n + e.trials as i32));
    assert_eq!(n, 60);

    let p: f64 = 0.55;
    for (agent, c) in network.agents().iter().zip(before) {
        let l_h = p.powi(k) * (1.0 - p).powi(n - k);
        let l_nh = (1.0 - p).powi(k) * p.powi(n - k);
        let expected = c * l_h / (c * l_h + (1.0 - c) * l_nh);
        assert!((agent.credence() - expected).abs() < 1e-9, "{} vs {}", agent.credence(), expected);
    }
}

/// With a discount, each agent folds its influencers in its own order,
/// discounting against the credences they held before the round.
#[test]
fn test_discount_uses_pre_round_credences() {
    let mut config = fixed_config(vec![0.55, 0.7, 0.9, 0.98]);
    config.network.trials_per_round = 10;
    config.network.epsilon = 0.05;
    config.network.trust_discount = 1.5;
    let mut rng = SmallRng::seed_from_u64(77);
    let mut network = Network::new(&config, &mut rng).unwrap();
    let before = network.snapshot();

    network.advance_round(&mut rng).unwrap();

    for agent in network.agents() {
        let pre = before.find_agent(agent.id()).unwrap();
        let mut expected = pre.credence;
        for influencer in agent.influencers() {
            let source = network.agent(*influencer).unwrap();
            let Some(evidence) = source.previous_experiment() else {
                continue;
            };
            let dm = if *influencer == agent.id() {
                0.0
            } else {
                (expected - before.find_agent(*influencer).unwrap().credence).abs() * 1.5
            };
            expected = jeffrey_update(expected, evidence, 0.05, dm).unwrap();
        }
        assert_eq!(agent.credence(), expected, "{}", agent.id());
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_lifecycle_conserves_population() {
    let mut config = lifecycle_config(10, 400);
    config.skeptics = Some(SkepticConfig {
        count: 2,
        ..SkepticConfig::default()
    });
    let mut rng = SmallRng::seed_from_u64(17);
    let mut network = Network::new(&config, &mut rng).unwrap();

    let mut ever_active: HashSet<AgentId> = network.agents().iter().map(|a| a.id()).collect();
    let mut last_total = ever_active.len();
    for _ in 0..400 {
        network.advance_round(&mut rng).unwrap();

        assert_eq!(network.agents().len(), 10);
        assert_eq!(network.count_role(AgentRole::Skeptic), 2);
        ever_active.extend(network.agents().iter().map(|a| a.id()));
        let total = network.agents().len() + network.retired().len();
        assert_eq!(ever_active.len(), total);
        assert!(total >= last_total);
        last_total = total;

        let active: HashSet<AgentId> = network.agents().iter().map(|a| a.id()).collect();
        for agent in network.agents() {
            assert!(agent.influencers().iter().all(|id| active.contains(id)));
        }
    }

    assert_eq!(network.retired().len(), 50);
}

#[test]
fn test_lifecycle_result_statistics() {
    let result = run(lifecycle_config(8, 200), 4);

    assert_eq!(result.outcome, Outcome::UnstableHorizonReached { round: 200 });
    let lifecycle = result.lifecycle.expect("lifecycle runs report turnover");
    assert_eq!(lifecycle.turnover, 25);
    assert_eq!(lifecycle.n_all_agents, 33);
    assert!(lifecycle.prop_retired_confident.is_some());
    let penalty = lifecycle.av_retired_brier_penalty.unwrap();
    assert!((0.0..=1.0).contains(&penalty));
    assert_eq!(result.brier.non_skeptic_ratio, None);
}

// ============================================================================
// Scoring
// ============================================================================

#[test]
fn test_brier_ratio_bounded() {
    for seed in 0..8 {
        let mut config = SimConfig::default();
        config.network.population = 6;
        config.network.trials_per_round = 10;
        config.network.epsilon = 0.05;
        config.network.trust_discount = seed as f64 * 0.5;
        config.simulation.max_rounds = 300;

        let result = run(config, seed);
        assert!(result.brier.max_penalty > 0.0);
        assert!((0.0..=1.0).contains(&result.brier.ratio), "seed {}: {}", seed, result.brier.ratio);
    }
}
