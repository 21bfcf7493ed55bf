//! Samples stored in replay buffers.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a sample, assigned by a buffer when the sample is added.
///
/// Identifiers are taken from a counter that only increases, so the identifier of an
/// evicted sample never refers to another sample later on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct SampleId(pub u64);

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A learning sample held by a buffer.
///
/// `payload` is opaque to the buffer. The caller writes `td_error` before asking the
/// buffer to update the priority, while `priority` and `importance_sampling_weight`
/// are written by the buffer only.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    id: Option<SampleId>,

    /// Data of the sample, e.g., a [`Transition`].
    pub payload: T,

    /// Error signal computed by the caller, typically a TD error.
    pub td_error: f64,

    priority: f64,

    importance_sampling_weight: f64,
}

impl<T> Sample<T> {
    /// Creates a sample not yet owned by any buffer.
    pub fn new(payload: T) -> Self {
        Self {
            id: None,
            payload,
            td_error: 0.0,
            priority: 0.0,
            importance_sampling_weight: 1.0,
        }
    }

    /// Identifier given by the buffer, `None` before the sample is added.
    pub fn id(&self) -> Option<SampleId> {
        self.id
    }

    /// Current sampling priority.
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Importance sampling weight assigned by the last prioritized draw.
    pub fn importance_sampling_weight(&self) -> f64 {
        self.importance_sampling_weight
    }

    pub(crate) fn set_id(&mut self, id: SampleId) {
        self.id = Some(id);
    }

    pub(crate) fn set_priority(&mut self, priority: f64) {
        self.priority = priority;
    }

    pub(crate) fn set_importance_sampling_weight(&mut self, weight: f64) {
        self.importance_sampling_weight = weight;
    }
}

impl<T> From<T> for Sample<T> {
    fn from(payload: T) -> Self {
        Self::new(payload)
    }
}

/// A state transition of an environment.
///
/// Buffers do not look into transitions; this type is provided as a ready-made payload.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transition<O, A> {
    /// Observation before the action.
    pub state: O,

    /// Action taken.
    pub action: A,

    /// Reward obtained by the action.
    pub reward: f64,

    /// Observation after the action, `None` at the end of an episode.
    pub next_state: Option<O>,

    /// Whether the episode terminated with this transition.
    pub is_terminated: bool,
}

impl<O, A> Transition<O, A> {
    /// Creates a transition.
    pub fn new(state: O, action: A, reward: f64, next_state: Option<O>, is_terminated: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            is_terminated,
        }
    }
}
