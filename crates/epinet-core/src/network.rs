//! Network
//!
//! Owns the agent arena, the influence graph and the retired roll. Agents
//! refer to each other by id only; the `index` map is rebuilt whenever
//! membership changes and the topology is rewired with it.

use rand::seq::index::sample;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, trace};

use epinet_results::{AgentId, AgentRole, NetworkSnapshot, RetiredAgent};

use crate::agent::{Agent, AgentParams, EvidenceBoard};
use crate::config::{LifecycleConfig, SimConfig, SkepticConfig, Topology};
use crate::error::SimError;
use crate::priors::PriorDistribution;
use crate::topology;

/// A seat left open by a retirement.
///
/// Only [`Network::retire`] hands these out and [`Network::admit`] consumes
/// them, so an admission always replaces exactly one retiree.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an unfilled vacancy shrinks the population"]
pub struct Vacancy {
    role: AgentRole,
    retiree: AgentId,
}

impl Vacancy {
    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn retiree(&self) -> AgentId {
        self.retiree
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    agents: Vec<Agent>,
    index: HashMap<AgentId, usize>,
    retired: Vec<RetiredAgent>,
    rounds_played: u32,
    /// Founding size of the community (propagandists excluded)
    initial_population: usize,
    next_id: u32,
    admissions: usize,
    topology: Topology,
    self_influence: bool,
    params: AgentParams,
    lifecycle: Option<LifecycleConfig>,
    skeptics: Option<SkepticConfig>,
}

impl Network {
    /// Builds the founding population and wires it.
    pub fn new<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Result<Self, SimError> {
        config.validate()?;

        let population = config.network.population;
        let priors = config.priors.generate(population, rng);
        if priors.len() != population {
            return Err(SimError::PopulationMismatch {
                expected: population,
                actual: priors.len(),
            });
        }

        let params = AgentParams::from(config);
        let mut agents: Vec<Agent> = priors
            .into_iter()
            .enumerate()
            .map(|(i, prior)| Agent::new(AgentId(i as u32), AgentRole::Ordinary, prior, &params))
            .collect();

        if let Some(skeptics) = &config.skeptics {
            for i in sample(rng, population, skeptics.count) {
                let credence = rng.gen_range(skeptics.credence_low..skeptics.credence_high);
                agents[i] = Agent::new(AgentId(i as u32), AgentRole::Skeptic, credence, &params);
            }
        }

        if let Some(lifecycle) = &config.lifecycle {
            for agent in &mut agents {
                agent.rounds_of_experience = lifecycle.founder_experience;
            }
            let floor = contraction_floor(population, lifecycle);
            if population <= floor {
                debug!(population, floor, "Contraction floor blocks all turnover");
            }
        }

        if let Some(propagandists) = &config.propagandists {
            for _ in 0..propagandists.count {
                let id = AgentId(agents.len() as u32);
                agents.push(Agent::new(id, AgentRole::Propagandist, propagandists.credence, &params));
            }
        }

        let next_id = agents.len() as u32;
        let mut network = Self {
            agents,
            index: HashMap::new(),
            retired: Vec::new(),
            rounds_played: 0,
            initial_population: population,
            next_id,
            admissions: 0,
            topology: config.network.topology,
            self_influence: config.network.self_influence,
            params,
            lifecycle: config.lifecycle.clone(),
            skeptics: config.skeptics.clone(),
        };
        network.rebuild(rng)?;

        debug!(
            population = population,
            topology = %network.topology,
            skeptics = network.count_role(AgentRole::Skeptic),
            propagandists = network.count_role(AgentRole::Propagandist),
            "Network built"
        );
        Ok(network)
    }

    /// Plays one round: every agent decides and experiments, then every
    /// updater folds in the evidence published this round, then everyone
    /// ages. Churn follows when the round count hits the turnover interval.
    pub fn advance_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SimError> {
        for agent in &mut self.agents {
            agent.decide_and_act(rng);
        }

        let board = EvidenceBoard::publish(&self.agents);
        for agent in &mut self.agents {
            agent.update_credence(&board)?;
        }

        for agent in &mut self.agents {
            agent.age();
        }
        self.rounds_played += 1;

        trace!(
            round = self.rounds_played,
            experimenters = board_experimenters(&board, &self.agents),
            mean_credence = self.mean_credence(),
            "Round played"
        );

        let interval = self.lifecycle.as_ref().map(|l| l.rounds_to_new_agent);
        if let Some(interval) = interval {
            if self.rounds_played % interval == 0 {
                if let Some(vacancy) = self.retire(rng)? {
                    self.admit(vacancy, rng)?;
                }
            }
        }

        Ok(())
    }

    /// Retires a randomly chosen experienced community member.
    ///
    /// Returns `None` without touching the population when nobody has
    /// reached the experience floor or the community is already at its
    /// contraction floor. Also `None` when no lifecycle is configured.
    pub fn retire<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<Vacancy>, SimError> {
        let Some(lifecycle) = &self.lifecycle else {
            return Ok(None);
        };

        let floor = contraction_floor(self.initial_population, lifecycle);
        let community_size = self.community().count();
        if community_size <= floor {
            trace!(community_size, floor, "Retirement skipped: contraction floor");
            return Ok(None);
        }

        let experience_floor = lifecycle.experience_floor;
        let eligible: Vec<AgentId> = self
            .community()
            .filter(|a| a.rounds_of_experience >= experience_floor)
            .map(Agent::id)
            .collect();
        if eligible.is_empty() {
            trace!("Retirement skipped: nobody experienced enough");
            return Ok(None);
        }

        let retiree = eligible[rng.gen_range(0..eligible.len())];
        self.retire_agent(retiree, rng).map(Some)
    }

    /// Removes `agent_id` from the active population and records it on the
    /// retired roll.
    pub fn retire_agent<R: Rng + ?Sized>(&mut self, agent_id: AgentId, rng: &mut R) -> Result<Vacancy, SimError> {
        let position = *self.index.get(&agent_id).ok_or(SimError::UnknownAgent(agent_id))?;
        let role = self.agents[position].role();
        if !role.is_community() {
            return Err(SimError::NotRetirable { agent: agent_id, role });
        }
        let agent = self.agents.remove(position);

        let record = RetiredAgent {
            agent_id,
            role: agent.role(),
            final_credence: agent.credence(),
            rounds_of_experience: agent.rounds_of_experience,
            retired_at_round: self.rounds_played,
        };
        debug!(
            agent = %agent_id,
            role = %record.role,
            credence = record.final_credence,
            round = self.rounds_played,
            "Agent retired"
        );
        self.retired.push(record);
        self.rebuild(rng)?;

        Ok(Vacancy {
            role: agent.role(),
            retiree: agent_id,
        })
    }

    /// Fills `vacancy` with a newcomer of the same kind.
    ///
    /// A retired skeptic is replaced by a skeptic with a prior from the
    /// skeptic range; anyone else by an ordinary agent drawn from the
    /// admissions priors.
    pub fn admit<R: Rng + ?Sized>(&mut self, vacancy: Vacancy, rng: &mut R) -> Result<AgentId, SimError> {
        let prior = match (vacancy.role, &self.skeptics) {
            (AgentRole::Skeptic, Some(skeptics)) => rng.gen_range(skeptics.credence_low..skeptics.credence_high),
            _ => match &self.lifecycle {
                Some(lifecycle) => lifecycle.admissions_priors.draw_one(self.admissions, rng),
                None => PriorDistribution::default().draw_one(self.admissions, rng),
            },
        };

        let id = AgentId(self.next_id);
        self.next_id += 1;
        self.admissions += 1;
        self.agents.push(Agent::new(id, vacancy.role, prior, &self.params));
        self.rebuild(rng)?;

        debug!(
            agent = %id,
            role = %vacancy.role,
            replaces = %vacancy.retiree,
            prior,
            "Agent admitted"
        );
        Ok(id)
    }

    fn rebuild<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SimError> {
        self.index = self
            .agents
            .iter()
            .enumerate()
            .map(|(position, agent)| (agent.id(), position))
            .collect();
        topology::wire(&mut self.agents, self.topology, self.self_influence, rng)?;
        trace!(agents = self.agents.len(), topology = %self.topology, "Topology rebuilt");
        Ok(())
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, agent_id: AgentId) -> Option<&Agent> {
        self.index.get(&agent_id).map(|&position| &self.agents[position])
    }

    /// Scientists and skeptics; propagandists sit outside the community.
    pub fn community(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.iter().filter(|a| a.role().is_community())
    }

    pub fn retired(&self) -> &[RetiredAgent] {
        &self.retired
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn initial_population(&self) -> usize {
        self.initial_population
    }

    pub fn low_stop(&self) -> f64 {
        self.params.low_stop
    }

    pub fn count_role(&self, role: AgentRole) -> usize {
        self.agents.iter().filter(|a| a.role() == role).count()
    }

    fn mean_credence(&self) -> f64 {
        let (sum, n) = self.community().fold((0.0, 0usize), |(sum, n), a| (sum + a.credence(), n + 1));
        if n == 0 {
            0.0
        } else {
            sum / n as f64
        }
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            rounds_played: self.rounds_played,
            agents: self.agents.iter().map(Agent::snapshot).collect(),
            retired: self.retired.clone(),
        }
    }
}

/// Community size at or below which nobody retires.
fn contraction_floor(initial_population: usize, lifecycle: &LifecycleConfig) -> usize {
    (initial_population as f64 * lifecycle.contraction_floor).ceil() as usize
}

fn board_experimenters(board: &EvidenceBoard, agents: &[Agent]) -> usize {
    agents
        .iter()
        .filter_map(|a| board.get(a.id()))
        .filter(|report| report.experiment.is_some())
        .count()
}
