//! Task error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur while executing a task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The listing generator could not produce a listing.
    #[error("Listing generation failed: {0}")]
    GenerationFailed(String),

    /// The push gateway rejected a notification.
    #[error("Push delivery failed: {0}")]
    PushFailed(String),

    /// The task referenced an entity that no longer exists.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
