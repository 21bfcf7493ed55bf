//! Prioritized replay buffer.
use super::{IwScheduler, ReplayBufferConfig};
use crate::{error::BufferError, Batch, Buffer, Sample, SampleId, SumTree};
use anyhow::Result;
use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Added to the magnitude of an error signal so that no priority is zero.
pub const EPSILON: f64 = 1e-8;

/// A replay buffer with prioritized sampling.
///
/// New samples get the largest priority assigned so far, which makes them likely to be
/// drawn before their error is known. After the caller writes the error signal of a
/// sample, [`Buffer::update`] sets its priority to $(|\delta| + \epsilon)^\alpha$.
///
/// [`Buffer::clear`] does nothing: priorities persist while the sum tree is reused as
/// a ring.
///
/// # Examples
///
/// ```rust
/// use border_replay::{Buffer, ReplayBuffer, ReplayBufferConfig, Sample};
///
/// let config = ReplayBufferConfig::default().capacity(100).batch_size(4);
/// let mut buffer = ReplayBuffer::<u32>::build(&config).unwrap();
/// for i in 0..10 {
///     buffer.add(Sample::new(i));
/// }
///
/// let batch = buffer.samples();
/// assert_eq!(batch.len(), 4);
/// for &id in batch.ids() {
///     buffer.set_td_error(id, 0.5).unwrap();
/// }
/// buffer.update_batch(&batch).unwrap();
/// ```
pub struct ReplayBuffer<T> {
    batch_size: usize,

    alpha: f64,

    /// Largest priority assigned so far.
    max_priority: f64,

    next_id: u64,

    sum_tree: SumTree<T>,

    iw_scheduler: IwScheduler,

    rng: StdRng,
}

impl<T> ReplayBuffer<T> {
    /// Exponent for prioritization.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Current exponent of importance sampling weights.
    pub fn beta(&self) -> f64 {
        self.iw_scheduler.beta()
    }

    /// Largest priority assigned so far.
    pub fn max_priority(&self) -> f64 {
        self.max_priority
    }

    /// Sum of the priorities of all stored samples.
    pub fn total_priority(&self) -> f64 {
        self.sum_tree.total()
    }

    /// Number of samples in a batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The underlying sum tree.
    pub fn sum_tree(&self) -> &SumTree<T> {
        &self.sum_tree
    }

    /// Priority for the error signal `td_error`.
    pub fn priority_of(&self, td_error: f64) -> f64 {
        (td_error.abs() + EPSILON).powf(self.alpha)
    }

    /// Draws one cumulative priority from each of `batch_size` equal segments of
    /// `[0, total)` and returns the slots they fall on.
    fn stratified_slots(&mut self, total: f64) -> Vec<usize> {
        let segment = total / self.batch_size as f64;
        let mut slots = Vec::with_capacity(self.batch_size);

        for k in 0..self.batch_size {
            let lower = segment * k as f64;
            let upper = segment * (k + 1) as f64;
            let s = if upper > lower {
                self.rng.gen_range(lower..upper)
            } else {
                lower
            };
            if let Some(slot) = self.sum_tree.find(s) {
                slots.push(slot);
            }
        }

        slots
    }
}

impl<T> Buffer for ReplayBuffer<T> {
    type Item = T;
    type Config = ReplayBufferConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;
        info!(
            "Build prioritized replay buffer: capacity={}, batch_size={}, alpha={}, beta={}, beta_step_size={}",
            config.capacity, config.batch_size, config.alpha, config.beta, config.beta_step_size
        );

        Ok(Self {
            batch_size: config.batch_size,
            alpha: config.alpha,
            max_priority: 1.0,
            next_id: 0,
            sum_tree: SumTree::new(config.capacity),
            iw_scheduler: IwScheduler::new(config.beta, config.beta_step_size),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn len(&self) -> usize {
        self.sum_tree.len()
    }

    fn capacity(&self) -> usize {
        self.sum_tree.capacity()
    }

    fn add(&mut self, mut sample: Sample<T>) -> SampleId {
        let id = SampleId(self.next_id);
        self.next_id += 1;

        sample.set_priority(self.max_priority);
        if let Some(evicted) = self.sum_tree.add(id, sample) {
            trace!("Evicted sample {:?}", evicted.id());
        }
        id
    }

    fn update(&mut self, id: SampleId) -> Result<()> {
        let td_error = self
            .sum_tree
            .sample(id)
            .ok_or(BufferError::UnknownSample(id))?
            .td_error;
        if !td_error.is_finite() {
            return Err(BufferError::NonFiniteError { id, value: td_error }.into());
        }

        let p = self.priority_of(td_error);
        if let Some(sample) = self.sum_tree.sample_mut(id) {
            sample.set_priority(p);
        }
        self.max_priority = self.max_priority.max(p);
        self.sum_tree.update(id)?;
        Ok(())
    }

    fn clear(&mut self) {}

    fn samples(&mut self) -> Batch {
        let beta = self.iw_scheduler.step();
        let total = self.sum_tree.total();

        if self.sum_tree.is_empty() || !(total > 0.0) {
            debug!("Sampled from an empty replay buffer");
            return Batch::new(vec![], Some(vec![]));
        }
        trace!("Sample batch: beta={}, total_priority={}", beta, total);

        let slots = self.stratified_slots(total);
        let n = self.sum_tree.len() as f64;
        let mut ids = Vec::with_capacity(slots.len());
        let mut ws = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Some(id) = self.sum_tree.slot(slot).and_then(|s| s.id()) {
                let prob = self.sum_tree.priority(slot) / total;
                ids.push(id);
                ws.push((n * prob).powf(-beta));
            }
        }

        // Normalize within the batch
        let w_max = ws.iter().fold(f64::NEG_INFINITY, |m, &w| m.max(w));
        let ws = ws.iter().map(|w| w / w_max).collect::<Vec<_>>();

        for (&id, &w) in ids.iter().zip(ws.iter()) {
            if let Some(sample) = self.sum_tree.sample_mut(id) {
                sample.set_importance_sampling_weight(w);
            }
        }

        Batch::new(ids, Some(ws))
    }

    fn random_samples(&mut self) -> Batch {
        let mut ids = Vec::with_capacity(self.batch_size);
        for _ in 0..self.batch_size {
            match self
                .sum_tree
                .random_sample(&mut self.rng)
                .and_then(|s| s.id())
            {
                Some(id) => ids.push(id),
                None => break,
            }
        }
        Batch::new(ids, None)
    }

    fn has_importance_sampling_weights(&self) -> bool {
        true
    }

    fn sample(&self, id: SampleId) -> Option<&Sample<T>> {
        self.sum_tree.sample(id)
    }

    fn sample_mut(&mut self, id: SampleId) -> Option<&mut Sample<T>> {
        self.sum_tree.sample_mut(id)
    }
}
