//! Prioritized experience replay.
//!
//! Samples are drawn with probability proportional to their priority using stratified
//! sampling over a [`SumTree`](crate::SumTree), and importance sampling weights correct
//! the bias introduced by the non-uniform draw (Schaul et al., 2016).
mod base;
mod config;
mod iw_scheduler;
pub use base::{ReplayBuffer, EPSILON};
pub use config::ReplayBufferConfig;
pub use iw_scheduler::IwScheduler;
