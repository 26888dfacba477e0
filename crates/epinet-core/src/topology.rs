//! Influence Graph
//!
//! Builds every agent's influencer list from the active population. The
//! lists hold ids, not references, and are rebuilt from scratch whenever
//! membership changes so that no agent keeps hearing a retiree.

use rand::seq::SliceRandom;
use rand::Rng;

use epinet_results::{AgentId, AgentRole};

use crate::agent::Agent;
use crate::config::Topology;
use crate::error::ConfigError;

/// Rewires `agents` according to `topology`.
///
/// Complete: every community agent hears every community agent (itself
/// included when `self_influence` is set) plus every propagandist, in an
/// order shuffled per agent. The shuffle matters because updates fold
/// sequentially: a fixed order would always give the same influencer the
/// last word. Propagandists hear nobody.
///
/// Cycle: agent `i` hears `i - 1`, `i` and `i + 1`, wrapping around.
/// Skeptics and propagandists cannot be placed on a cycle.
pub fn wire<R: Rng + ?Sized>(
    agents: &mut [Agent],
    topology: Topology,
    self_influence: bool,
    rng: &mut R,
) -> Result<(), ConfigError> {
    match topology {
        Topology::Complete => {
            wire_complete(agents, self_influence, rng);
            Ok(())
        }
        Topology::Cycle => wire_cycle(agents),
    }
}

fn wire_complete<R: Rng + ?Sized>(agents: &mut [Agent], self_influence: bool, rng: &mut R) {
    let community: Vec<AgentId> = agents
        .iter()
        .filter(|a| a.role().is_community())
        .map(Agent::id)
        .collect();
    let propagandists: Vec<AgentId> = agents
        .iter()
        .filter(|a| !a.role().is_community())
        .map(Agent::id)
        .collect();

    for agent in agents.iter_mut() {
        if !agent.role().is_community() {
            agent.set_influencers(Vec::new());
            continue;
        }
        let own_id = agent.id();
        let mut influencers: Vec<AgentId> = community
            .iter()
            .copied()
            .filter(|&id| self_influence || id != own_id)
            .chain(propagandists.iter().copied())
            .collect();
        influencers.shuffle(rng);
        agent.set_influencers(influencers);
    }
}

fn wire_cycle(agents: &mut [Agent]) -> Result<(), ConfigError> {
    if let Some(misplaced) = agents.iter().find(|a| a.role() != AgentRole::Ordinary) {
        return Err(ConfigError::RoleUnsupported {
            role: misplaced.role(),
            topology: Topology::Cycle,
        });
    }

    let ids: Vec<AgentId> = agents.iter().map(Agent::id).collect();
    let n = ids.len();
    for (i, agent) in agents.iter_mut().enumerate() {
        agent.set_influencers(vec![ids[(i + n - 1) % n], ids[i], ids[(i + 1) % n]]);
    }
    Ok(())
}
