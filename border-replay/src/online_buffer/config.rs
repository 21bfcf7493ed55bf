//! Configuration of [`OnlineBuffer`](super::OnlineBuffer).
use crate::error::BufferError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`OnlineBuffer`](super::OnlineBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct OnlineBufferConfig {
    /// Maximum number of samples.
    pub capacity: usize,

    /// Number of samples in a batch. `0` means the whole buffer.
    pub batch_size: usize,

    /// Random seed used for uniform sampling.
    pub seed: u64,
}

impl Default for OnlineBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            batch_size: 0,
            seed: 42,
        }
    }
}

impl OnlineBufferConfig {
    /// Sets the capacity of the buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the batch size, `0` for the whole buffer.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that a buffer can be built from the configuration.
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.capacity == 0 {
            return Err(BufferError::InvalidConfig(
                "capacity must be positive".to_string(),
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
