//! Errors in the library.
use crate::SampleId;
use thiserror::Error;

/// Errors raised by replay buffers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    /// The configuration cannot be used to build a buffer.
    #[error("Invalid buffer configuration: {0}")]
    InvalidConfig(String),

    /// The sample was never added to the buffer or has already been evicted.
    #[error("Unknown sample: {0}")]
    UnknownSample(SampleId),

    /// The error signal of a sample cannot be turned into a priority.
    #[error("Non-finite error signal {value} for sample {id}")]
    NonFiniteError {
        /// The sample being updated.
        id: SampleId,
        /// The offending error signal.
        value: f64,
    },
}
