//! Scored generation backend interface.
//!
//! Generation backends produce one artifact per call together with a quality
//! score in `[0.0, 1.0]`. They may be slow and may fail transiently; the
//! quality-gated retry loop in [`crate::retry`] owns all retry policy.
//! Implementations must be safe to call repeatedly for the same request
//! (the request carries the refinement iteration, so repeated calls write to
//! distinct locations) and must not assume any prior-call state.

pub mod simulated;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BackendError;

pub use simulated::{QualityProfile, SimulatedBackend};

/// One generation request, self-contained and idempotent-safe.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Stable identifier of the unit being generated (e.g. `img_slide_3`).
    pub id: String,
    /// Slide the unit is associated with, when applicable.
    pub slide_number: Option<u32>,
    /// The generation prompt.
    pub prompt_text: String,
    /// Style and aesthetic guidance appended to the prompt.
    pub style_guidance: String,
    /// Zero-based refinement iteration for this call.
    pub iteration: u32,
    /// Where the backend must write the produced artifact.
    pub output_path: PathBuf,
}

/// One artifact produced by a backend call, with its quality score.
#[derive(Debug, Clone)]
pub struct GenerationSample {
    /// Backend-assigned artifact identifier.
    pub artifact_id: String,
    /// Location the artifact was written to.
    pub location: PathBuf,
    /// Quality score in `[0.0, 1.0]`.
    pub quality_score: f64,
    /// Time the backend spent producing the artifact.
    pub latency: Duration,
    /// Duration of the artifact in seconds, for time-based media.
    pub duration_seconds: Option<u32>,
}

/// Capability interface for a scored generation backend.
///
/// One implementation exists per asset category (image, video, deck).
#[async_trait]
pub trait ScoredBackend: Send + Sync {
    /// Generates one artifact for the request and scores it.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transient failure; the caller decides
    /// whether to retry.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationSample, BackendError>;
}
