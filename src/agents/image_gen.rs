//! Image generation stage.
//!
//! Runs one quality-gated retry loop per image prompt. Loops execute
//! concurrently under a semaphore bound; an item's failure is recorded in
//! the stage output and never aborts sibling items. An empty prompt list is
//! a valid run that produces an empty output.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::agents::error::AgentError;
use crate::agents::types::{AssetCategory, GeneratedArtifact, GenerationOutput, PromptSpec};
use crate::backend::{GenerationRequest, GenerationSample, ScoredBackend};
use crate::config::ForgeConfig;
use crate::error::BackendError;
use crate::pipeline::cancel::CancelToken;
use crate::retry::{generate_with_quality_gate, Accepted, Backoff, RetryError, RetryPolicy};
use crate::storage::AssetStore;

const STAGE: &str = "image_generation";

/// Outcome of one per-prompt loop; kept internal to the stage.
enum ItemOutcome {
    Accepted(GeneratedArtifact),
    Failed(String),
    Cancelled,
}

/// Generates one image per prompt through the scored image backend.
pub struct ImageGenAgent {
    backend: Arc<dyn ScoredBackend>,
    store: AssetStore,
    policy: RetryPolicy,
    backend_timeout: std::time::Duration,
    concurrency: usize,
}

impl ImageGenAgent {
    pub fn new(backend: Arc<dyn ScoredBackend>, store: AssetStore, config: &ForgeConfig) -> Self {
        Self {
            backend,
            store,
            policy: RetryPolicy {
                quality_threshold: config.image_quality_threshold,
                max_retries: config.image_max_retries,
                backoff: Backoff::Fixed(config.image_retry_delay),
            },
            backend_timeout: config.backend_timeout,
            concurrency: config.max_concurrent_generations,
        }
    }

    /// Runs the image stage over the compiled prompts.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Cancelled` when the run's cancel signal fires;
    /// item-level failures land in the output's `errors` list instead.
    pub async fn run(
        &self,
        prompts: &[PromptSpec],
        cancel: &CancelToken,
    ) -> Result<GenerationOutput, AgentError> {
        info!(prompts = prompts.len(), "Starting image generation");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let outcomes = join_all(prompts.iter().map(|prompt| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return ItemOutcome::Cancelled,
                };
                self.generate_one(prompt, cancel).await
            }
        }))
        .await;

        let mut artifacts = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Accepted(artifact) => artifacts.push(artifact),
                ItemOutcome::Failed(message) => errors.push(message),
                ItemOutcome::Cancelled => return Err(AgentError::Cancelled { stage: STAGE }),
            }
        }

        let output = GenerationOutput::from_results(artifacts, errors);
        info!(
            accepted = output.artifacts.len(),
            failed = output.errors.len(),
            average_quality = output.average_quality,
            "Image generation finished"
        );
        Ok(output)
    }

    async fn generate_one(&self, prompt: &PromptSpec, cancel: &CancelToken) -> ItemOutcome {
        let slide_number = prompt.slide_number.unwrap_or(0);
        let result = generate_with_quality_gate(
            |attempt| self.call_backend(prompt, slide_number, attempt),
            &self.policy,
            cancel,
        )
        .await;

        match result {
            Ok(accepted) => ItemOutcome::Accepted(self.into_artifact(prompt, accepted)),
            Err(RetryError::Cancelled) => ItemOutcome::Cancelled,
            Err(err @ RetryError::Exhausted { .. }) => {
                error!(prompt_id = %prompt.id, error = %err, "Image prompt failed");
                ItemOutcome::Failed(format!("{}: {}", prompt.id, err))
            }
        }
    }

    async fn call_backend(
        &self,
        prompt: &PromptSpec,
        slide_number: u32,
        attempt: u32,
    ) -> Result<GenerationSample, BackendError> {
        let request = GenerationRequest {
            id: prompt.id.clone(),
            slide_number: prompt.slide_number,
            prompt_text: prompt.prompt_text.clone(),
            style_guidance: prompt.style_guidance.clone(),
            iteration: attempt,
            output_path: self.store.image_path(slide_number, attempt),
        };
        match tokio::time::timeout(self.backend_timeout, self.backend.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                seconds: self.backend_timeout.as_secs(),
            }),
        }
    }

    fn into_artifact(&self, prompt: &PromptSpec, accepted: Accepted) -> GeneratedArtifact {
        if accepted.below_threshold {
            warn!(
                prompt_id = %prompt.id,
                quality_score = accepted.sample.quality_score,
                "Image accepted below quality threshold"
            );
        }
        GeneratedArtifact {
            id: prompt.id.clone(),
            slide_number: prompt.slide_number,
            category: AssetCategory::Image,
            location: accepted.sample.location,
            quality_score: accepted.sample.quality_score,
            generation_latency: accepted.sample.latency,
            refinement_iteration: accepted.iterations,
            prompt_used: prompt.prompt_text.clone(),
            duration_seconds: None,
        }
    }
}
