//! Event publishing subsystem.
//!
//! # Data Flow
//! ```text
//! Completion callback
//!     → emitter.rs (non-blocking hand-off, one detached task per event)
//!     → writer.rs (shared EventWriter handle)
//!     → batching.rs (bounded queue → batch by size/linger → collector)
//!     → backoff.rs (retry delays for failed batches)
//! ```
//!
//! # Design Decisions
//! - Callers never observe delivery outcome
//! - In-flight emit tasks are capped; excess events are dropped, not queued
//! - Batching, retry and backpressure belong to the writer alone

pub mod backoff;
pub mod batching;
pub mod emitter;
pub mod writer;

pub use batching::BatchingWriter;
pub use emitter::Emitter;
pub use writer::{EventWriter, PublishError};
