//! Configuration of [`ReplayBuffer`](super::ReplayBuffer).
use crate::error::BufferError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ReplayBuffer`](super::ReplayBuffer).
///
/// # Examples
///
/// ```rust
/// use border_replay::ReplayBufferConfig;
///
/// let config = ReplayBufferConfig::default()
///     .capacity(10000)
///     .batch_size(64)
///     .alpha(0.6)
///     .beta(0.4)
///     .beta_step_size(1e-4)
///     .seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of samples. The oldest sample is evicted once it is reached.
    pub capacity: usize,

    /// Number of samples in a batch.
    pub batch_size: usize,

    /// Exponent for prioritization. A value of 0 results in uniform sampling.
    pub alpha: f64,

    /// Initial exponent of importance sampling weights.
    pub beta: f64,

    /// Increment of `beta` per batch, annealing it towards 1.
    pub beta_step_size: f64,

    /// Random seed used for sampling.
    pub seed: u64,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 20000,
            batch_size: 32,
            alpha: 0.6,
            beta: 0.4,
            beta_step_size: 0.001,
            seed: 42,
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the prioritization exponent `alpha`.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the initial importance sampling exponent `beta`.
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Sets the increment of `beta` per batch.
    pub fn beta_step_size(mut self, beta_step_size: f64) -> Self {
        self.beta_step_size = beta_step_size;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that a buffer can be built from the configuration.
    pub fn validate(&self) -> Result<(), BufferError> {
        let invalid = |msg: String| Err(BufferError::InvalidConfig(msg));

        if self.capacity == 0 {
            return invalid("capacity must be positive".to_string());
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be positive".to_string());
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return invalid(format!("alpha must be non-negative, got {}", self.alpha));
        }
        if !(self.beta.is_finite() && (0.0..=1.0).contains(&self.beta)) {
            return invalid(format!("beta must be in [0, 1], got {}", self.beta));
        }
        if !(self.beta_step_size.is_finite() && self.beta_step_size >= 0.0) {
            return invalid(format!(
                "beta_step_size must be non-negative, got {}",
                self.beta_step_size
            ));
        }
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
