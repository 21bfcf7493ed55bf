//! Sum tree for prioritized sampling.
//!
//! The layout follows https://github.com/jaromiru/AI-blog/blob/master/SumTree.py:
//! a flat array of `2 * capacity - 1` nodes whose last `capacity` entries are leaves.
use crate::{error::BufferError, Sample, SampleId};
use rand::Rng;
use std::collections::HashMap;

/// Fixed-capacity sum tree holding samples at its leaves.
///
/// Every internal node stores the sum of its two children, so the root is the total
/// priority. Samples are written circularly; once the tree is full the oldest sample
/// is evicted.
#[derive(Debug)]
pub struct SumTree<T> {
    capacity: usize,

    /// Slot the next sample is written to.
    write_ix: usize,

    n_entries: usize,

    tree: Vec<f64>,

    slots: Vec<Option<Sample<T>>>,

    leaf_map: HashMap<SampleId, usize>,
}

impl<T> SumTree<T> {
    /// Creates an empty sum tree.
    ///
    /// `capacity` must be positive.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity of a sum tree must be positive");
        Self {
            capacity,
            write_ix: 0,
            n_entries: 0,
            tree: vec![0f64; 2 * capacity - 1],
            slots: (0..capacity).map(|_| None).collect(),
            leaf_map: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    fn node_ix(&self, slot: usize) -> usize {
        slot + self.capacity - 1
    }

    /// Recomputes the ancestors of node `ix` from their children.
    fn propagate(&mut self, mut ix: usize) {
        while ix != 0 {
            let parent = (ix - 1) / 2;
            self.tree[parent] = self.tree[2 * parent + 1] + self.tree[2 * parent + 2];
            ix = parent;
        }
    }

    fn set_leaf(&mut self, slot: usize, p: f64) {
        let ix = self.node_ix(slot);
        self.tree[ix] = p;
        self.propagate(ix);
    }

    /// Walks down from the root and returns the slot covering the cumulative priority `s`.
    ///
    /// A subtree with zero sum is never entered unless the whole tree is empty.
    fn retrieve(&self, mut s: f64) -> usize {
        let mut ix = 0;
        loop {
            let left = 2 * ix + 1;
            if left >= self.tree.len() {
                break;
            }
            let right = left + 1;
            let (p_left, p_right) = (self.tree[left], self.tree[right]);

            if p_left > 0.0 && (s <= p_left || p_right <= 0.0) {
                ix = left;
            } else {
                s -= p_left;
                ix = right;
            }
        }
        ix + 1 - self.capacity
    }

    /// Adds a sample at the current write position with its current priority.
    ///
    /// Returns the sample evicted from that position, if any.
    pub fn add(&mut self, id: SampleId, mut sample: Sample<T>) -> Option<Sample<T>> {
        let slot = self.write_ix;
        sample.set_id(id);

        let evicted = self.slots[slot].take();
        if let Some(id) = evicted.as_ref().and_then(|s| s.id()) {
            self.leaf_map.remove(&id);
        }

        self.set_leaf(slot, sample.priority());
        self.slots[slot] = Some(sample);
        self.leaf_map.insert(id, slot);

        self.write_ix = (self.write_ix + 1) % self.capacity;
        if self.n_entries < self.capacity {
            self.n_entries += 1;
        }

        evicted
    }

    /// Propagates the current priority of the sample `id` into the tree.
    ///
    /// The tree is left untouched when `id` is not stored.
    pub fn update(&mut self, id: SampleId) -> Result<(), BufferError> {
        let slot = self.leaf_of(id).ok_or(BufferError::UnknownSample(id))?;
        let p = self.slots[slot]
            .as_ref()
            .map(|s| s.priority())
            .ok_or(BufferError::UnknownSample(id))?;
        self.set_leaf(slot, p);
        Ok(())
    }

    /// Returns the slot of the sample covering the cumulative priority `s`.
    ///
    /// `s` is expected in `[0, total())`; values outside the range select the first or
    /// last populated leaf.
    pub fn find(&self, s: f64) -> Option<usize> {
        if self.n_entries == 0 {
            return None;
        }
        let slot = self.retrieve(s);
        self.slots[slot].as_ref().map(|_| slot)
    }

    /// Returns the sample covering the cumulative priority `s`.
    pub fn get(&self, s: f64) -> Option<&Sample<T>> {
        self.find(s).and_then(|slot| self.slots[slot].as_ref())
    }

    /// Returns a populated slot chosen uniformly at random, ignoring priorities.
    pub fn random_slot<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        // Slots are filled from the front, so `0..n_entries` are populated.
        if self.n_entries == 0 {
            None
        } else {
            Some(rng.gen_range(0..self.n_entries))
        }
    }

    /// Returns a sample chosen uniformly at random, ignoring priorities.
    pub fn random_sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Sample<T>> {
        self.random_slot(rng)
            .and_then(|slot| self.slots[slot].as_ref())
    }

    /// Sum of all priorities.
    pub fn total(&self) -> f64 {
        self.tree[0]
    }

    /// Number of populated leaves.
    pub fn len(&self) -> usize {
        self.n_entries
    }

    /// Returns `true` if no sample has been added.
    pub fn is_empty(&self) -> bool {
        self.n_entries == 0
    }

    /// Maximum number of samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All nodes of the tree, root first.
    pub fn nodes(&self) -> &[f64] {
        &self.tree
    }

    /// Priority stored at `slot`.
    pub fn priority(&self, slot: usize) -> f64 {
        self.tree[self.node_ix(slot)]
    }

    /// Slot of the sample `id`.
    pub fn leaf_of(&self, id: SampleId) -> Option<usize> {
        self.leaf_map.get(&id).copied()
    }

    /// Sample stored at `slot`.
    pub fn slot(&self, slot: usize) -> Option<&Sample<T>> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Sample with identifier `id`.
    pub fn sample(&self, id: SampleId) -> Option<&Sample<T>> {
        self.leaf_of(id).and_then(|slot| self.slot(slot))
    }

    /// Mutable access to the sample with identifier `id`.
    ///
    /// Changing the priority through this reference has no effect on the tree until
    /// [`SumTree::update`] is called.
    pub fn sample_mut(&mut self, id: SampleId) -> Option<&mut Sample<T>> {
        let slot = self.leaf_of(id)?;
        self.slots[slot].as_mut()
    }

    /// Iterates over the stored samples in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample<T>> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}
