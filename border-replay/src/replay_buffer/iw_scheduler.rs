//! Scheduling the exponent of importance weight for PER.
use serde::{Deserialize, Serialize};

/// Scheduler of the exponent of importance weight for PER.
///
/// $\beta$ grows by `step_size` every time a prioritized batch is drawn until it
/// reaches `beta_final`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct IwScheduler {
    /// Initial value of $\beta$.
    pub beta_0: f64,

    /// Final value of $\beta$.
    pub beta_final: f64,

    /// Increment of $\beta$ per draw.
    pub step_size: f64,

    /// Number of draws so far.
    pub n_steps: usize,

    beta: f64,
}

impl IwScheduler {
    /// Creates a scheduler annealing towards 1.
    pub fn new(beta_0: f64, step_size: f64) -> Self {
        Self {
            beta_0,
            beta_final: 1.0,
            step_size,
            n_steps: 0,
            beta: beta_0.min(1.0),
        }
    }

    /// Gets the exponent of importance sampling weight.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Advances $\beta$ by one step and returns the new value.
    pub fn step(&mut self) -> f64 {
        self.n_steps += 1;
        self.beta = (self.beta + self.step_size).min(self.beta_final);
        self.beta
    }
}
