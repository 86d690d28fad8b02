//! Error types for the simulation core.

use thiserror::Error;

use crate::ids::EntityId;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
///
/// Steady-state tick logic never produces these; they come from load paths,
/// lookups by id and the deferred effect queue.
#[derive(Debug, Error)]
pub enum SimError {
    /// Persisted state could not be written or read back.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Content data parsing error.
    #[error("Failed to parse content data '{source_name}': {message}")]
    DataParse {
        /// Name of the document that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// A content id that is not registered.
    #[error("Unknown {kind} id: {id}")]
    UnknownContent {
        /// Kind of content (floor, unit type, generator type...).
        kind: &'static str,
        /// The id that failed to resolve.
        id: String,
    },

    /// The deferred effect queue rejected a request.
    #[error("Deferred effect queue is full ({capacity} pending)")]
    EffectQueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// Invalid simulation state.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
}
