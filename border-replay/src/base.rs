//! Replay buffer interface.
//!
//! A buffer stores [`Sample`]s produced by an agent, hands out batches of them and,
//! for prioritized buffers, maintains priorities from error signals computed by the
//! caller.
use crate::{error::BufferError, Sample, SampleId};
use anyhow::Result;

/// Samples drawn from a buffer.
///
/// A batch refers to samples by identifier; their data stays in the buffer and is
/// accessed through [`Buffer::sample`] or [`Buffer::batch_samples`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    ids: Vec<SampleId>,
    weights: Option<Vec<f64>>,
}

impl Batch {
    /// Creates a batch.
    ///
    /// If given, `weights` must have the same length as `ids`.
    pub fn new(ids: Vec<SampleId>, weights: Option<Vec<f64>>) -> Self {
        debug_assert!(weights.as_ref().map_or(true, |w| w.len() == ids.len()));
        Self { ids, weights }
    }

    /// Identifiers of the drawn samples in draw order.
    pub fn ids(&self) -> &[SampleId] {
        &self.ids
    }

    /// Normalized importance sampling weights, present for prioritized draws.
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Number of drawn samples.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing was drawn.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Common interface of replay buffers.
///
/// Callers check [`Buffer::has_importance_sampling_weights`] to decide whether the
/// weights of drawn samples must be applied in the learning update.
pub trait Buffer {
    /// Payload of the stored samples.
    type Item;

    /// Configuration of the buffer.
    type Config: Clone;

    /// Builds a buffer, rejecting invalid configurations.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Number of stored samples.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no sample.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of stored samples.
    fn capacity(&self) -> usize;

    /// Adds a sample, evicting the oldest one if the buffer is full.
    fn add(&mut self, sample: Sample<Self::Item>) -> SampleId;

    /// Recomputes the priority of a sample from its `td_error`.
    fn update(&mut self, id: SampleId) -> Result<()>;

    /// Calls [`Buffer::update`] for every sample in `batch`.
    fn update_batch(&mut self, batch: &Batch) -> Result<()> {
        for &id in batch.ids() {
            self.update(id)?;
        }
        Ok(())
    }

    /// Removes stored samples where the buffer supports it.
    fn clear(&mut self);

    /// Draws a batch of samples following the sampling policy of the buffer.
    fn samples(&mut self) -> Batch;

    /// Draws a batch of samples uniformly at random.
    fn random_samples(&mut self) -> Batch;

    /// Whether [`Buffer::samples`] assigns importance sampling weights.
    fn has_importance_sampling_weights(&self) -> bool;

    /// Returns the stored sample `id`.
    fn sample(&self, id: SampleId) -> Option<&Sample<Self::Item>>;

    /// Returns the stored sample `id` for writing its error signal.
    fn sample_mut(&mut self, id: SampleId) -> Option<&mut Sample<Self::Item>>;

    /// Sets the error signal of the stored sample `id`.
    fn set_td_error(&mut self, id: SampleId, td_error: f64) -> Result<()> {
        let sample = self
            .sample_mut(id)
            .ok_or(BufferError::UnknownSample(id))?;
        sample.td_error = td_error;
        Ok(())
    }

    /// Samples of `batch` still held by the buffer, in draw order.
    fn batch_samples(&self, batch: &Batch) -> Vec<&Sample<Self::Item>> {
        batch.ids().iter().filter_map(|&id| self.sample(id)).collect()
    }
}
