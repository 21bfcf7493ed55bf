//! Online buffer.
use super::OnlineBufferConfig;
use crate::{Batch, Buffer, Sample, SampleId};
use anyhow::Result;
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;

/// A bounded FIFO buffer without priorities.
///
/// [`Buffer::samples`] returns the oldest samples in insertion order and
/// [`Buffer::random_samples`] draws uniformly with replacement. Updates are no-ops.
pub struct OnlineBuffer<T> {
    capacity: usize,

    batch_size: usize,

    next_id: u64,

    samples: VecDeque<Sample<T>>,

    rng: StdRng,
}

impl<T> OnlineBuffer<T> {
    /// Number of samples in a batch, `0` for the whole buffer.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of samples a batch actually contains.
    fn n_batch(&self) -> usize {
        if self.batch_size == 0 {
            self.samples.len()
        } else {
            self.batch_size
        }
    }

    /// Position of `id` in the queue.
    ///
    /// Identifiers in the queue are consecutive, ending just before `next_id`.
    fn position(&self, id: SampleId) -> Option<usize> {
        let first = self.next_id - self.samples.len() as u64;
        if id.0 >= first && id.0 < self.next_id {
            Some((id.0 - first) as usize)
        } else {
            None
        }
    }

    /// Iterates over the stored samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Sample<T>> {
        self.samples.iter()
    }
}

impl<T> Buffer for OnlineBuffer<T> {
    type Item = T;
    type Config = OnlineBufferConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;
        info!(
            "Build online buffer: capacity={}, batch_size={}",
            config.capacity, config.batch_size
        );

        Ok(Self {
            capacity: config.capacity,
            batch_size: config.batch_size,
            next_id: 0,
            samples: VecDeque::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn add(&mut self, mut sample: Sample<T>) -> SampleId {
        let id = SampleId(self.next_id);
        self.next_id += 1;

        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        sample.set_id(id);
        self.samples.push_back(sample);
        id
    }

    fn update(&mut self, _id: SampleId) -> Result<()> {
        Ok(())
    }

    fn clear(&mut self) {
        self.samples.clear();
    }

    fn samples(&mut self) -> Batch {
        let ids = self
            .samples
            .iter()
            .take(self.n_batch())
            .filter_map(|s| s.id())
            .collect();
        Batch::new(ids, None)
    }

    fn random_samples(&mut self) -> Batch {
        let len = self.samples.len();
        if len == 0 {
            debug!("Sampled from an empty online buffer");
            return Batch::default();
        }

        let n = self.n_batch();
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            let ix = self.rng.gen_range(0..len);
            if let Some(id) = self.samples[ix].id() {
                ids.push(id);
            }
        }
        Batch::new(ids, None)
    }

    fn has_importance_sampling_weights(&self) -> bool {
        false
    }

    fn sample(&self, id: SampleId) -> Option<&Sample<T>> {
        self.position(id).and_then(|ix| self.samples.get(ix))
    }

    fn sample_mut(&mut self, id: SampleId) -> Option<&mut Sample<T>> {
        let ix = self.position(id)?;
        self.samples.get_mut(ix)
    }
}
