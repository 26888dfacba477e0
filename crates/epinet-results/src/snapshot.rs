//! Snapshot Types
//!
//! Point-in-time views of the population, used for diagnostics and for the
//! retirement record kept during lifecycle runs.

use serde::{Deserialize, Serialize};

use crate::{AgentId, AgentRole, Experiment};

/// An agent removed from the active population, with its final credence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetiredAgent {
    pub agent_id: AgentId,
    pub role: AgentRole,
    pub final_credence: f64,
    pub rounds_of_experience: u32,
    /// Network round after which the agent retired
    pub retired_at_round: u32,
}

impl RetiredAgent {
    /// Squared distance of the final credence from certainty in the true theory.
    pub fn brier_penalty(&self) -> f64 {
        (self.final_credence - 1.0).powi(2)
    }
}

/// State of a single agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: AgentId,
    pub role: AgentRole,
    pub credence: f64,
    pub rounds_of_experience: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_experiment: Option<Experiment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub influencers: Vec<AgentId>,
}

/// State of the whole network after a given round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub rounds_played: u32,
    pub agents: Vec<AgentSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retired: Vec<RetiredAgent>,
}

impl NetworkSnapshot {
    pub fn find_agent(&self, agent_id: AgentId) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    pub fn credences(&self) -> Vec<f64> {
        self.agents.iter().map(|a| a.credence).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retired_brier_penalty() {
        let retired = RetiredAgent {
            agent_id: AgentId(1),
            role: AgentRole::Ordinary,
            final_credence: 0.5,
            rounds_of_experience: 30,
            retired_at_round: 8,
        };
        assert!((retired.brier_penalty() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_find_agent() {
        let snapshot = NetworkSnapshot {
            rounds_played: 3,
            agents: vec![
                AgentSnapshot {
                    agent_id: AgentId(0),
                    role: AgentRole::Ordinary,
                    credence: 0.7,
                    rounds_of_experience: 3,
                    previous_experiment: Some(Experiment::new(6, 10)),
                    influencers: vec![AgentId(0), AgentId(1)],
                },
                AgentSnapshot {
                    agent_id: AgentId(1),
                    role: AgentRole::Skeptic,
                    credence: 0.6,
                    rounds_of_experience: 3,
                    previous_experiment: None,
                    influencers: vec![],
                },
            ],
            retired: vec![],
        };

        assert_eq!(snapshot.find_agent(AgentId(1)).unwrap().role, AgentRole::Skeptic);
        assert!(snapshot.find_agent(AgentId(9)).is_none());
        assert_eq!(snapshot.credences(), vec![0.7, 0.6]);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("previous_experiment"));
    }
}
