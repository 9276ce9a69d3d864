//! Deck assembly stage.
//!
//! Lays out one page per narrative slide, attaches the accepted image for
//! each slide, and renders the deck through the scored deck backend under
//! the same quality gate as the other media stages.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::agents::error::AgentError;
use crate::agents::types::{
    AssetCategory, DeckOutput, DeckPage, GeneratedArtifact, PitchNarrative,
};
use crate::backend::{GenerationRequest, GenerationSample, ScoredBackend};
use crate::config::ForgeConfig;
use crate::error::BackendError;
use crate::pipeline::cancel::CancelToken;
use crate::retry::{generate_with_quality_gate, Backoff, RetryError, RetryPolicy};
use crate::storage::AssetStore;

const STAGE: &str = "deck_assembly";
const DECK_ID: &str = "pitch_deck";
const DECK_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Assembles the pitch deck from slide images and the narrative.
pub struct DeckBuilderAgent {
    backend: Arc<dyn ScoredBackend>,
    store: AssetStore,
    policy: RetryPolicy,
    backend_timeout: Duration,
    theme: String,
}

impl DeckBuilderAgent {
    pub fn new(backend: Arc<dyn ScoredBackend>, store: AssetStore, config: &ForgeConfig) -> Self {
        Self {
            backend,
            store,
            policy: RetryPolicy {
                quality_threshold: config.deck_quality_threshold,
                max_retries: config.deck_max_retries,
                backoff: Backoff::Fixed(DECK_RETRY_DELAY),
            },
            backend_timeout: config.backend_timeout,
            theme: config.deck_theme.clone(),
        }
    }

    /// Runs deck assembly.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Cancelled` when the run's cancel signal fires;
    /// a render failure is recorded in the output instead.
    pub async fn run(
        &self,
        narrative: &PitchNarrative,
        images: &[GeneratedArtifact],
        cancel: &CancelToken,
    ) -> Result<DeckOutput, AgentError> {
        let pages: Vec<DeckPage> = narrative
            .slides
            .iter()
            .map(|slide| DeckPage {
                page_number: slide.slide_number,
                title: slide.title.clone(),
                image_id: images
                    .iter()
                    .find(|img| img.slide_number == Some(slide.slide_number))
                    .map(|img| img.id.clone()),
            })
            .collect();

        info!(pages = pages.len(), theme = %self.theme, "Assembling deck");

        let layout_prompt = format!(
            "Assemble a {}-page pitch deck, theme '{}', pages: {}.",
            pages.len(),
            self.theme,
            pages
                .iter()
                .map(|p| p.title.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        );

        let result = generate_with_quality_gate(
            |attempt| self.call_backend(&layout_prompt, attempt),
            &self.policy,
            cancel,
        )
        .await;

        match result {
            Ok(accepted) => {
                if accepted.below_threshold {
                    warn!(
                        quality_score = accepted.sample.quality_score,
                        "Deck accepted below quality threshold"
                    );
                }
                let artifact = GeneratedArtifact {
                    id: DECK_ID.to_string(),
                    slide_number: None,
                    category: AssetCategory::Deck,
                    location: accepted.sample.location,
                    quality_score: accepted.sample.quality_score,
                    generation_latency: accepted.sample.latency,
                    refinement_iteration: accepted.iterations,
                    prompt_used: layout_prompt,
                    duration_seconds: None,
                };
                Ok(DeckOutput {
                    artifact: Some(artifact),
                    pages,
                    theme: self.theme.clone(),
                    creation_complete: true,
                    errors: Vec::new(),
                })
            }
            Err(RetryError::Cancelled) => Err(AgentError::Cancelled { stage: STAGE }),
            Err(err @ RetryError::Exhausted { .. }) => {
                error!(error = %err, "Deck assembly failed");
                Ok(DeckOutput {
                    artifact: None,
                    pages,
                    theme: self.theme.clone(),
                    creation_complete: false,
                    errors: vec![format!("{}: {}", DECK_ID, err)],
                })
            }
        }
    }

    async fn call_backend(
        &self,
        layout_prompt: &str,
        attempt: u32,
    ) -> Result<GenerationSample, BackendError> {
        let request = GenerationRequest {
            id: DECK_ID.to_string(),
            slide_number: None,
            prompt_text: layout_prompt.to_string(),
            style_guidance: format!("Theme: {}", self.theme),
            iteration: attempt,
            output_path: self.store.deck_path(DECK_ID),
        };
        match tokio::time::timeout(self.backend_timeout, self.backend.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                seconds: self.backend_timeout.as_secs(),
            }),
        }
    }
}
