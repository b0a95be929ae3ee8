//! Shared writer contract.

use futures_util::future::BoxFuture;
use thiserror::Error;

/// Errors a writer may report to the task that awaited it.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The request to the collector could not be completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("collector rejected batch with status {status}")]
    Rejected { status: u16 },

    /// The writer's queue has shut down.
    #[error("writer queue closed")]
    QueueClosed,

    /// The configured endpoint cannot be turned into a publish URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// A long-lived, shareable client that delivers serialized events.
///
/// Implementations must be safe to call concurrently from many tasks without
/// external locking.
pub trait EventWriter: Send + Sync {
    fn write(&self, message: String) -> BoxFuture<'_, Result<(), PublishError>>;
}
