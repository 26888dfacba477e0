//! Brier Scoring
//!
//! Running accuracy penalties over the scientific community.

use epinet_results::{AgentRole, BrierSummary, RetiredAgent};

use crate::agent::Agent;

/// Accumulates `(credence - 1)^2` for every scored agent, once per round.
#[derive(Debug, Clone, Default)]
pub struct BrierTracker {
    total: f64,
    max: f64,
    non_skeptic_total: f64,
    non_skeptic_max: f64,
    /// Report the skeptic-free ratio
    split_skeptics: bool,
}

impl BrierTracker {
    pub fn new(split_skeptics: bool) -> Self {
        Self {
            split_skeptics,
            ..Self::default()
        }
    }

    /// Scores one round. Propagandists are never scored.
    pub fn record<'a>(&mut self, agents: impl IntoIterator<Item = &'a Agent>) {
        for agent in agents {
            if !agent.role().is_community() {
                continue;
            }
            let penalty = agent.brier_penalty();
            self.total += penalty;
            self.max += 1.0;
            if agent.role() != AgentRole::Skeptic {
                self.non_skeptic_total += penalty;
                self.non_skeptic_max += 1.0;
            }
        }
    }

    pub fn summary(&self) -> BrierSummary {
        BrierSummary {
            total_penalty: self.total,
            max_penalty: self.max,
            ratio: ratio(self.total, self.max),
            non_skeptic_ratio: self
                .split_skeptics
                .then(|| ratio(self.non_skeptic_total, self.non_skeptic_max)),
        }
    }
}

fn ratio(total: f64, max: f64) -> f64 {
    if max > 0.0 {
        total / max
    } else {
        0.0
    }
}

/// Fraction of `credences` strictly above `threshold`; `None` for an empty set.
pub fn proportion_above(credences: impl IntoIterator<Item = f64>, threshold: f64) -> Option<f64> {
    let (above, n) = credences
        .into_iter()
        .fold((0usize, 0usize), |(above, n), c| (above + usize::from(c > threshold), n + 1));
    (n > 0).then(|| above as f64 / n as f64)
}

/// Mean Brier penalty at exit; `None` when nobody has retired.
pub fn mean_retired_penalty(retired: &[RetiredAgent]) -> Option<f64> {
    if retired.is_empty() {
        return None;
    }
    Some(retired.iter().map(RetiredAgent::brier_penalty).sum::<f64>() / retired.len() as f64)
}
