//! Stage-level error type.

use thiserror::Error;

use crate::error::StoreError;

/// Errors raised by pipeline stages.
///
/// Item-level generation failures never surface here; they are recorded in
/// the stage output's `errors` list. A stage returns `AgentError` only for
/// conditions that must abort the run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The stage received input it cannot work with.
    #[error("Invalid input for {stage}: {message}")]
    InvalidInput { stage: &'static str, message: String },

    /// The run was cancelled while the stage was in flight.
    #[error("Stage {stage} cancelled")]
    Cancelled { stage: &'static str },

    /// Asset validation rejected the run's media outright.
    #[error("Asset validation failed: {invalid_count} of {total_checked} assets invalid")]
    ValidationRejected {
        invalid_count: u32,
        total_checked: u32,
    },

    /// Publication artifacts could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A report or manifest could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
