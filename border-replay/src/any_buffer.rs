//! Buffer selected by configuration.
use crate::{
    Batch, Buffer, OnlineBuffer, OnlineBufferConfig, ReplayBuffer, ReplayBufferConfig, Sample,
    SampleId,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of either buffer variant.
///
/// In YAML, the variant is the single key of the mapping, `Replay` or `Online`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum BufferConfig {
    /// Prioritized replay buffer.
    Replay(ReplayBufferConfig),

    /// Non-prioritized FIFO buffer.
    Online(OnlineBufferConfig),
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::Replay(ReplayBufferConfig::default())
    }
}

impl BufferConfig {
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

/// One of the buffer variants, dispatched at runtime.
pub enum AnyBuffer<T> {
    /// Prioritized replay buffer.
    Replay(ReplayBuffer<T>),

    /// Non-prioritized FIFO buffer.
    Online(OnlineBuffer<T>),
}

macro_rules! dispatch {
    ($self:ident, $b:ident => $e:expr) => {
        match $self {
            AnyBuffer::Replay($b) => $e,
            AnyBuffer::Online($b) => $e,
        }
    };
}

impl<T> Buffer for AnyBuffer<T> {
    type Item = T;
    type Config = BufferConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(match config {
            BufferConfig::Replay(config) => Self::Replay(ReplayBuffer::build(config)?),
            BufferConfig::Online(config) => Self::Online(OnlineBuffer::build(config)?),
        })
    }

    fn len(&self) -> usize {
        dispatch!(self, b => b.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, b => b.capacity())
    }

    fn add(&mut self, sample: Sample<T>) -> SampleId {
        dispatch!(self, b => b.add(sample))
    }

    fn update(&mut self, id: SampleId) -> Result<()> {
        dispatch!(self, b => b.update(id))
    }

    fn clear(&mut self) {
        dispatch!(self, b => b.clear())
    }

    fn samples(&mut self) -> Batch {
        dispatch!(self, b => b.samples())
    }

    fn random_samples(&mut self) -> Batch {
        dispatch!(self, b => b.random_samples())
    }

    fn has_importance_sampling_weights(&self) -> bool {
        dispatch!(self, b => b.has_importance_sampling_weights())
    }

    fn sample(&self, id: SampleId) -> Option<&Sample<T>> {
        dispatch!(self, b => b.sample(id))
    }

    fn sample_mut(&mut self, id: SampleId) -> Option<&mut Sample<T>> {
        dispatch!(self, b => b.sample_mut(id))
    }
}
