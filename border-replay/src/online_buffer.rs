//! Non-prioritized FIFO buffer.
mod base;
mod config;
pub use base::OnlineBuffer;
pub use config::OnlineBufferConfig;
