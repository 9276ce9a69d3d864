//! Trailer video generation stage.
//!
//! A single expensive generation unit: one retry loop with exponential
//! backoff. The prompt is enriched with the accepted image artifacts so the
//! trailer cuts from the rendered slides. A hard failure of the unit is
//! recorded in the stage output, mirroring the image stage's item-level
//! error handling.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::agents::error::AgentError;
use crate::agents::types::{AssetCategory, GeneratedArtifact, GenerationOutput, PromptSpec};
use crate::backend::{GenerationRequest, GenerationSample, ScoredBackend};
use crate::config::ForgeConfig;
use crate::error::BackendError;
use crate::pipeline::cancel::CancelToken;
use crate::retry::{generate_with_quality_gate, Backoff, RetryError, RetryPolicy};
use crate::storage::AssetStore;

const STAGE: &str = "video_generation";

/// Generates the trailer video through the scored video backend.
pub struct VideoGenAgent {
    backend: Arc<dyn ScoredBackend>,
    store: AssetStore,
    policy: RetryPolicy,
    backend_timeout: std::time::Duration,
}

impl VideoGenAgent {
    pub fn new(backend: Arc<dyn ScoredBackend>, store: AssetStore, config: &ForgeConfig) -> Self {
        Self {
            backend,
            store,
            policy: RetryPolicy {
                quality_threshold: config.video_quality_threshold,
                max_retries: config.video_max_retries,
                backoff: Backoff::Exponential {
                    base: config.video_backoff_base,
                },
            },
            backend_timeout: config.backend_timeout,
        }
    }

    /// Runs the video stage.
    ///
    /// `source_images` are the accepted image artifacts the trailer draws
    /// from; an absent prompt yields a valid empty output.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Cancelled` when the run's cancel signal fires.
    pub async fn run(
        &self,
        prompt: Option<&PromptSpec>,
        source_images: &[GeneratedArtifact],
        cancel: &CancelToken,
    ) -> Result<GenerationOutput, AgentError> {
        let prompt = match prompt {
            Some(prompt) => prompt,
            None => {
                info!("No trailer prompt; skipping video generation");
                return Ok(GenerationOutput::from_results(Vec::new(), Vec::new()));
            }
        };

        info!(sources = source_images.len(), "Starting video generation");

        let source_ids: Vec<&str> = source_images.iter().map(|a| a.id.as_str()).collect();
        let enriched_prompt = if source_ids.is_empty() {
            prompt.prompt_text.clone()
        } else {
            format!(
                "{} Source frames: {}.",
                prompt.prompt_text,
                source_ids.join(", ")
            )
        };

        let result = generate_with_quality_gate(
            |attempt| self.call_backend(prompt, &enriched_prompt, attempt),
            &self.policy,
            cancel,
        )
        .await;

        match result {
            Ok(accepted) => {
                if accepted.below_threshold {
                    warn!(
                        quality_score = accepted.sample.quality_score,
                        "Trailer accepted below quality threshold"
                    );
                }
                let artifact = GeneratedArtifact {
                    id: prompt.id.clone(),
                    slide_number: None,
                    category: AssetCategory::Video,
                    location: accepted.sample.location,
                    quality_score: accepted.sample.quality_score,
                    generation_latency: accepted.sample.latency,
                    refinement_iteration: accepted.iterations,
                    prompt_used: enriched_prompt,
                    duration_seconds: accepted.sample.duration_seconds,
                };
                Ok(GenerationOutput::from_results(vec![artifact], Vec::new()))
            }
            Err(RetryError::Cancelled) => Err(AgentError::Cancelled { stage: STAGE }),
            Err(err @ RetryError::Exhausted { .. }) => {
                error!(error = %err, "Trailer generation failed");
                Ok(GenerationOutput::from_results(
                    Vec::new(),
                    vec![format!("{}: {}", prompt.id, err)],
                ))
            }
        }
    }

    async fn call_backend(
        &self,
        prompt: &PromptSpec,
        enriched_prompt: &str,
        attempt: u32,
    ) -> Result<GenerationSample, BackendError> {
        let request = GenerationRequest {
            id: prompt.id.clone(),
            slide_number: None,
            prompt_text: enriched_prompt.to_string(),
            style_guidance: prompt.style_guidance.clone(),
            iteration: attempt,
            output_path: self.store.video_path(&prompt.id, attempt),
        };
        match tokio::time::timeout(self.backend_timeout, self.backend.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                seconds: self.backend_timeout.as_secs(),
            }),
        }
    }
}
