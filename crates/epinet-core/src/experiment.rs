//! Binomial Experiments
//!
//! Draws the outcome of `n` trials of the better theory's action.

use rand::Rng;

use epinet_results::Experiment;

/// Draws binomial trial outcomes from the run's random source.
///
/// Stateless: reproducibility comes entirely from the `Rng` passed in, so a
/// run that owns its own seeded generator gets its own independent stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExperimentGenerator;

impl ExperimentGenerator {
    /// Runs `trials` Bernoulli trials with success probability `0.5 + epsilon`.
    ///
    /// `epsilon` must lie in `[-0.5, 0.5]`.
    pub fn run_experiment<R: Rng + ?Sized>(trials: u32, epsilon: f64, rng: &mut R) -> Experiment {
        debug_assert!((-0.5..=0.5).contains(&epsilon));
        let p = (0.5 + epsilon).clamp(0.0, 1.0);
        let successes = (0..trials).filter(|_| rng.gen_bool(p)).count();
        Experiment::new(successes as u32, trials)
    }
}
