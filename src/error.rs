//! Error types for gtmforge operations.
//!
//! Defines the leaf error types shared across subsystems:
//! - Backend invocation failures (transient, network/timeout-class)
//! - Asset store failures (path layout, existence, read-back)
//!
//! Stage, state-machine, and validation errors live next to the code that
//! produces them (`agents::error`, `pipeline::state`, `pipeline::orchestrator`).

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a scored generation backend.
///
/// All variants are treated as transient by the quality-gated retry loop:
/// they are retried up to the loop's budget and become fatal for the unit
/// only after exhaustion.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend call timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend rejected request '{request_id}': {reason}")]
    Rejected { request_id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the asset store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Asset not found at '{0}'")]
    NotFound(PathBuf),

    #[error("Failed to create store layout under '{root}': {source}")]
    LayoutFailed {
        root: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
