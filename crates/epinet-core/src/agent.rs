//! Agents and the belief-update rule.
//!
//! Every agent holds a credence in the better theory H, where H says the
//! studied action succeeds with probability `p = 0.5 + epsilon` and not-H
//! says it succeeds with `1 - p`. Agents update on their influencers'
//! binomial results with Jeffrey conditioning, discounted by how far the
//! influencer's credence is from their own.

use rand::Rng;
use std::collections::HashMap;
use std::fmt;

use epinet_results::{AgentId, AgentRole, AgentSnapshot, Experiment};

use crate::config::SimConfig;
use crate::error::{NumericalError, SimError};
use crate::experiment::ExperimentGenerator;

/// Tolerance for rounding drift past the unit interval before it counts as a failure.
const POSTERIOR_SLACK: f64 = 1e-9;

/// Parameters shared by every agent in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentParams {
    pub trials_per_round: u32,
    pub epsilon: f64,
    pub low_stop: f64,
    pub trust_discount: f64,
    pub alternate_at_indifference: bool,
    /// Whether skeptics run experiments at all
    pub skeptics_experiment: bool,
}

impl From<&SimConfig> for AgentParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            trials_per_round: config.network.trials_per_round,
            epsilon: config.network.epsilon,
            low_stop: config.network.low_stop,
            trust_discount: config.network.trust_discount,
            alternate_at_indifference: config.network.alternate_at_indifference,
            skeptics_experiment: config.skeptics.as_ref().map_or(true, |s| s.experiments),
        }
    }
}

/// A scientist, skeptic or propagandist.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    role: AgentRole,
    credence: f64,
    epsilon: f64,
    trust_discount: f64,
    low_stop: f64,
    trials_per_round: u32,
    alternate_at_indifference: bool,
    experiments: bool,
    pub rounds_of_experience: u32,
    latest_experiment: Option<Experiment>,
    previous_experiment: Option<Experiment>,
    /// Ids of agents whose evidence this agent consumes, in update order.
    /// Relation only: the network owns every agent.
    influencers: Vec<AgentId>,
}

impl Agent {
    pub fn new(id: AgentId, role: AgentRole, prior: f64, params: &AgentParams) -> Self {
        let experiments = match role {
            AgentRole::Skeptic => params.skeptics_experiment,
            AgentRole::Ordinary | AgentRole::Propagandist => true,
        };
        Self {
            id,
            role,
            credence: prior,
            epsilon: params.epsilon,
            trust_discount: params.trust_discount,
            low_stop: params.low_stop,
            trials_per_round: params.trials_per_round,
            alternate_at_indifference: params.alternate_at_indifference,
            experiments,
            rounds_of_experience: 0,
            latest_experiment: None,
            previous_experiment: None,
            influencers: Vec::new(),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn credence(&self) -> f64 {
        self.credence
    }

    pub fn low_stop(&self) -> f64 {
        self.low_stop
    }

    pub fn latest_experiment(&self) -> Option<Experiment> {
        self.latest_experiment
    }

    pub fn previous_experiment(&self) -> Option<Experiment> {
        self.previous_experiment
    }

    pub fn influencers(&self) -> &[AgentId] {
        &self.influencers
    }

    pub(crate) fn set_influencers(&mut self, influencers: Vec<AgentId>) {
        self.influencers = influencers;
    }

    /// Runs this round's experiment or abstains.
    pub fn decide_and_act<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let experiment = match self.role {
            AgentRole::Propagandist => true,
            _ if !self.experiments => false,
            _ if self.credence < self.low_stop => false,
            _ if self.alternate_at_indifference && self.credence == 0.5 => rng.gen_bool(0.5),
            _ => true,
        };

        self.latest_experiment = if experiment {
            Some(ExperimentGenerator::run_experiment(self.trials_per_round, self.epsilon, rng))
        } else {
            None
        };
    }

    /// The experiment this agent shows its audience this round.
    ///
    /// Propagandists only publish results that favour the false theory.
    pub fn report_experiment(&self) -> Option<Experiment> {
        match self.role {
            AgentRole::Propagandist => self.latest_experiment.filter(Experiment::favors_false_theory),
            AgentRole::Ordinary | AgentRole::Skeptic => self.latest_experiment,
        }
    }

    /// Distrust towards `other`: credence distance times the trust discount.
    pub fn dm(&self, other: &Agent) -> f64 {
        self.dm_to(other.credence)
    }

    pub fn dm_to(&self, other_credence: f64) -> f64 {
        (self.credence - other_credence).abs() * self.trust_discount
    }

    /// Folds every influencer's published result into this agent's credence.
    ///
    /// Influencers are visited in `influencers` order and each update starts
    /// from the credence the previous one produced. Their credences and
    /// results come from `board`, which is fixed for the whole update phase.
    pub fn update_credence(&mut self, board: &EvidenceBoard) -> Result<(), SimError> {
        if !self.role.updates_credence() {
            return Ok(());
        }

        for &influencer in &self.influencers {
            let report = board.get(influencer).ok_or(SimError::UnknownAgent(influencer))?;
            let Some(evidence) = report.experiment else {
                continue;
            };
            // An agent's own data is never discounted
            let dm = if influencer == self.id {
                0.0
            } else {
                (self.credence - report.credence).abs() * self.trust_discount
            };
            self.credence = jeffrey_update(self.credence, evidence, self.epsilon, dm)
                .map_err(|source| SimError::Numerical { agent: self.id, source })?;
        }

        Ok(())
    }

    /// End-of-round bookkeeping.
    pub fn age(&mut self) {
        self.previous_experiment = self.latest_experiment.take();
        self.rounds_of_experience += 1;
    }

    /// Squared distance from certainty in the true theory.
    pub fn brier_penalty(&self) -> f64 {
        (self.credence - 1.0).powi(2)
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: self.id,
            role: self.role,
            credence: self.credence,
            rounds_of_experience: self.rounds_of_experience,
            previous_experiment: self.previous_experiment,
            influencers: self.influencers.clone(),
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.previous_experiment {
            Some(exp) => write!(f, "credence = {:.3}, k = {}, n = {}", self.credence, exp.successes, exp.trials),
            None => write!(f, "credence = {:.3}, k = N/A, n = N/A", self.credence),
        }
    }
}

/// What an agent made visible to its audience this round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub credence: f64,
    pub experiment: Option<Experiment>,
}

/// Frozen view of every agent's credence and published result, taken once
/// per round before anyone updates.
#[derive(Debug, Clone, Default)]
pub struct EvidenceBoard {
    reports: HashMap<AgentId, Report>,
}

impl EvidenceBoard {
    pub fn publish<'a>(agents: impl IntoIterator<Item = &'a Agent>) -> Self {
        let reports = agents
            .into_iter()
            .map(|agent| {
                (
                    agent.id,
                    Report {
                        credence: agent.credence,
                        experiment: agent.report_experiment(),
                    },
                )
            })
            .collect();
        Self { reports }
    }

    pub fn get(&self, agent_id: AgentId) -> Option<&Report> {
        self.reports.get(&agent_id)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Discounted Jeffrey update of `credence` on `evidence`.
///
/// With `dm = 0` this is plain Bayesian conditioning on the two-point model
/// {p, 1 - p}; with `dm >= 1` the evidence is ignored. In between, the
/// probability the agent assigns to the evidence is pulled from 1 towards its
/// marginal likelihood, so discounting only damps an update and never flips it.
///
/// Zero credence is absorbing.
///
/// The raw likelihoods `p^k (1-p)^(n-k)` underflow for trial counts in the
/// thousands, so `P(H|E)` is computed from the likelihood ratio in log space.
/// The remaining terms only need `P(E|H)` and `P(E)` away from 1.
pub fn jeffrey_update(credence: f64, evidence: Experiment, epsilon: f64, dm: f64) -> Result<f64, NumericalError> {
    if credence <= 0.0 {
        return Ok(0.0);
    }
    if dm >= 1.0 {
        return Ok(credence);
    }

    let p = 0.5 + epsilon;
    let k = f64::from(evidence.successes);
    let n = f64::from(evidence.trials);

    // Binomial coefficients cancel between the two hypotheses
    let p_e_h = p.powf(k) * (1.0 - p).powf(n - k);
    let p_e_nh = (1.0 - p).powf(k) * p.powf(n - k);
    let p_e = credence * p_e_h + (1.0 - credence) * p_e_nh;
    if !p_e.is_finite() || p_e < 0.0 {
        return Err(NumericalError::Marginal(p_e));
    }

    // P(E|not H) / P(E|H) = ((1-p)/p)^(2k-n)
    let likelihood_ratio = ((2.0 * k - n) * ((1.0 - p) / p).ln()).exp();
    let p_h_e = credence / (credence + (1.0 - credence) * likelihood_ratio);

    // Jeffrey weight on not-E; zero when the agent fully accepts E
    let weight_not_e = dm.max(0.0) * (1.0 - p_e);
    let mut updated = p_h_e * (1.0 - weight_not_e);
    if weight_not_e > 0.0 {
        let p_h_ne = credence * (1.0 - p_e_h) / (1.0 - p_e);
        updated += p_h_ne * weight_not_e;
    }

    if !updated.is_finite() || !(-POSTERIOR_SLACK..=1.0 + POSTERIOR_SLACK).contains(&updated) {
        return Err(NumericalError::Posterior(updated));
    }
    Ok(updated.clamp(0.0, 1.0))
}
