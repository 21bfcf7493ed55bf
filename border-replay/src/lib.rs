#![warn(missing_docs)]
//! Experience replay buffers for reinforcement learning.
//!
//! The crate provides two implementations of the [`Buffer`] interface:
//!
//! * [`ReplayBuffer`]: prioritized experience replay backed by a [`SumTree`], with
//!   stratified proportional sampling and importance sampling weights.
//! * [`OnlineBuffer`]: a bounded FIFO queue without priorities.
//!
//! An agent adds a [`Sample`] after each interaction step, draws batches, computes an
//! error signal for the drawn samples and hands it back to the buffer:
//!
//! ```rust
//! use border_replay::{Buffer, ReplayBuffer, ReplayBufferConfig, Sample, Transition};
//!
//! let config = ReplayBufferConfig::default().capacity(1000).batch_size(8);
//! let mut buffer = ReplayBuffer::build(&config).unwrap();
//!
//! for t in 0..100 {
//!     let tr = Transition::new(vec![t as f32], t % 2, 1.0, Some(vec![t as f32 + 1.0]), false);
//!     buffer.add(Sample::new(tr));
//! }
//!
//! let batch = buffer.samples();
//! let weights = batch.weights().unwrap().to_vec();
//! for (&id, w) in batch.ids().iter().zip(weights) {
//!     assert!(w > 0.0 && w <= 1.0);
//!     buffer.set_td_error(id, 0.1).unwrap();
//! }
//! buffer.update_batch(&batch).unwrap();
//! ```
//!
//! Buffers do no locking; share them between threads with `Arc<Mutex<_>>`.
pub mod error;
mod any_buffer;
mod base;
mod online_buffer;
mod replay_buffer;
mod sample;
mod sum_tree;

pub use any_buffer::{AnyBuffer, BufferConfig};
pub use base::{Batch, Buffer};
pub use error::BufferError;
pub use online_buffer::{OnlineBuffer, OnlineBufferConfig};
pub use replay_buffer::{IwScheduler, ReplayBuffer, ReplayBufferConfig, EPSILON};
pub use sample::{Sample, SampleId, Transition};
pub use sum_tree::SumTree;
