//! Pipeline orchestrator.
//!
//! Sequences the stages in their fixed dependency order, commits each
//! stage's output into `PipelineState`, and converts any stage failure into
//! a terminal `failed` state. There is no pipeline-level retry; retry lives
//! inside the quality-gated loop, scoped to one generation unit. The
//! orchestrator also owns the session registry behind the run-control
//! surface (`start`, `cancel`, `get_state`).

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::agents::comparative::ComparativeAgent;
use crate::agents::deck_builder::DeckBuilderAgent;
use crate::agents::error::AgentError;
use crate::agents::ideation::IdeationAgent;
use crate::agents::image_gen::ImageGenAgent;
use crate::agents::pitch_writer::PitchWriterAgent;
use crate::agents::prompt_forge::PromptForgeAgent;
use crate::agents::publisher::PublisherAgent;
use crate::agents::qa::ContentReviewAgent;
use crate::agents::types::{IdeaRequest, MediaBundle};
use crate::agents::video_gen::VideoGenAgent;
use crate::backend::{QualityProfile, ScoredBackend, SimulatedBackend};
use crate::config::ForgeConfig;
use crate::error::StoreError;
use crate::pipeline::cancel::{cancel_pair, CancelHandle, CancelToken};
use crate::pipeline::state::{PipelineStage, PipelineState, StateError};
use crate::storage::AssetStore;

/// Errors that terminate a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage failed; the run is marked `failed`.
    #[error("Stage failed: {0}")]
    Stage(#[from] AgentError),

    /// The slot or transition contract was violated. Programming error,
    /// never retried.
    #[error("Stage contract violation: {0}")]
    ContractViolation(#[from] StateError),

    /// The run was cancelled from the run-control surface.
    #[error("Pipeline run cancelled")]
    Cancelled,

    /// No session is registered under the given id.
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    /// The asset store could not be prepared.
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct SessionEntry {
    state: PipelineState,
    cancel: CancelHandle,
}

/// Drives pipeline runs and tracks their sessions.
pub struct PipelineOrchestrator {
    config: ForgeConfig,
    store: AssetStore,
    ideation: IdeationAgent,
    comparative: ComparativeAgent,
    pitch_writer: PitchWriterAgent,
    prompt_forge: PromptForgeAgent,
    reviewer: ContentReviewAgent,
    image_gen: ImageGenAgent,
    video_gen: VideoGenAgent,
    deck_builder: DeckBuilderAgent,
    publisher: PublisherAgent,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator with explicit backends per asset category.
    pub fn new(
        config: ForgeConfig,
        image_backend: Arc<dyn ScoredBackend>,
        video_backend: Arc<dyn ScoredBackend>,
        deck_backend: Arc<dyn ScoredBackend>,
    ) -> Self {
        let store = AssetStore::new(config.output_dir.clone());
        Self {
            ideation: IdeationAgent::new(),
            comparative: ComparativeAgent::new(),
            pitch_writer: PitchWriterAgent::new(),
            prompt_forge: PromptForgeAgent::new(config.deck_theme.clone()),
            reviewer: ContentReviewAgent::new(),
            image_gen: ImageGenAgent::new(image_backend, store.clone(), &config),
            video_gen: VideoGenAgent::new(video_backend, store.clone(), &config),
            deck_builder: DeckBuilderAgent::new(deck_backend, store.clone(), &config),
            publisher: PublisherAgent::new(store.clone(), &config),
            store,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates an orchestrator wired to the simulated backends.
    pub fn with_simulated_backends(config: ForgeConfig) -> Self {
        let image = SimulatedBackend::new(
            "image",
            QualityProfile::Uniform {
                min: 0.70,
                max: 0.98,
            },
        );
        let video = SimulatedBackend::new(
            "video",
            QualityProfile::Uniform {
                min: 0.65,
                max: 0.95,
            },
        )
        .with_duration_seconds(30);
        let deck = SimulatedBackend::new(
            "deck",
            QualityProfile::Uniform {
                min: 0.70,
                max: 0.95,
            },
        );
        Self::new(config, Arc::new(image), Arc::new(video), Arc::new(deck))
    }

    /// Starts one pipeline run and drives it to a terminal state.
    ///
    /// Returns the terminal state on success. On failure the session
    /// registry still holds the `failed` state snapshot.
    ///
    /// # Errors
    ///
    /// Returns the error that terminated the run.
    pub async fn start(
        &self,
        request: IdeaRequest,
        session_id: Option<String>,
    ) -> Result<PipelineState, PipelineError> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut state = PipelineState::new(session_id.clone(), request);
        let (handle, token) = cancel_pair();

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                session_id.clone(),
                SessionEntry {
                    state: state.clone(),
                    cancel: handle,
                },
            );
        }

        info!(session_id = %session_id, "Pipeline run started");

        let result = async {
            self.store.ensure_layout()?;
            self.run_stages(&mut state, &token).await
        }
        .await;

        match result {
            Ok(()) => {
                self.commit_snapshot(&state).await;
                info!(session_id = %session_id, "Pipeline run completed");
                Ok(state)
            }
            Err(err) => {
                state.mark_failed();
                self.commit_snapshot(&state).await;
                error!(session_id = %session_id, error = %err, "Pipeline run failed");
                Err(err)
            }
        }
    }

    /// Requests cancellation of a running session.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::SessionNotFound` for unknown ids.
    pub async fn cancel(&self, session_id: &str) -> Result<(), PipelineError> {
        let sessions = self.sessions.read().await;
        let entry = sessions
            .get(session_id)
            .ok_or_else(|| PipelineError::SessionNotFound(session_id.to_string()))?;
        entry.cancel.cancel();
        info!(%session_id, "Cancellation requested");
        Ok(())
    }

    /// Returns the latest committed state snapshot for a session.
    pub async fn get_state(&self, session_id: &str) -> Option<PipelineState> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|entry| entry.state.clone())
    }

    async fn run_stages(
        &self,
        state: &mut PipelineState,
        cancel: &CancelToken,
    ) -> Result<(), PipelineError> {
        self.checkpoint(state, cancel, PipelineStage::Ideation).await?;
        let ideation = self.ideation.run(&state.request)?;
        state.record_ideation(ideation)?;

        self.checkpoint(state, cancel, PipelineStage::ComparativeInsight)
            .await?;
        // Slots were just populated in order; missing ones are contract bugs.
        let ideation = state
            .ideation
            .clone()
            .ok_or(StateError::MissingPrerequisite {
                stage: PipelineStage::ComparativeInsight,
                missing: PipelineStage::Ideation,
            })?;
        let insight = self.comparative.run(&ideation)?;
        state.record_comparative(insight)?;

        self.checkpoint(state, cancel, PipelineStage::PitchWriting)
            .await?;
        let insight = state
            .comparative
            .clone()
            .ok_or(StateError::MissingPrerequisite {
                stage: PipelineStage::PitchWriting,
                missing: PipelineStage::ComparativeInsight,
            })?;
        let narrative = self.pitch_writer.run(&ideation, &insight)?;
        state.record_pitch(narrative)?;

        self.checkpoint(state, cancel, PipelineStage::PromptForge)
            .await?;
        let narrative = state.pitch.clone().ok_or(StateError::MissingPrerequisite {
            stage: PipelineStage::PromptForge,
            missing: PipelineStage::PitchWriting,
        })?;
        let prompts = self.prompt_forge.run(&narrative)?;
        state.record_prompts(prompts)?;

        self.checkpoint(state, cancel, PipelineStage::QaValidation)
            .await?;
        let prompts = state.prompts.clone().ok_or(StateError::MissingPrerequisite {
            stage: PipelineStage::QaValidation,
            missing: PipelineStage::PromptForge,
        })?;
        let review = self.reviewer.run(&prompts)?;
        let review_passed = review.passed;
        state.record_content_review(review)?;
        if !review_passed {
            return Err(PipelineError::Stage(AgentError::InvalidInput {
                stage: "qa_validation",
                message: "content review raised critical findings".to_string(),
            }));
        }

        self.checkpoint(state, cancel, PipelineStage::MediaGeneration)
            .await?;
        let images = self.image_gen.run(&prompts.image_prompts, cancel).await?;
        let video = self
            .video_gen
            .run(prompts.video_prompt.as_ref(), &images.artifacts, cancel)
            .await?;
        let deck = self
            .deck_builder
            .run(&narrative, &images.artifacts, cancel)
            .await?;
        let bundle = MediaBundle {
            images,
            video,
            deck,
        };
        state.record_media(bundle)?;

        self.checkpoint(state, cancel, PipelineStage::Publishing)
            .await?;
        let bundle = state.media.clone().ok_or(StateError::MissingPrerequisite {
            stage: PipelineStage::Publishing,
            missing: PipelineStage::MediaGeneration,
        })?;
        let publish = self.publisher.run(&bundle, cancel).await?;
        state.record_publish(publish)?;

        state.begin_stage(PipelineStage::Completed)?;
        Ok(())
    }

    /// Commits the prior stage's snapshot and enters the next stage,
    /// observing cancellation between stages.
    async fn checkpoint(
        &self,
        state: &mut PipelineState,
        cancel: &CancelToken,
        stage: PipelineStage,
    ) -> Result<(), PipelineError> {
        self.commit_snapshot(state).await;
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        state.begin_stage(stage)?;
        info!(session_id = %state.session_id, stage = %stage, "Entering stage");
        Ok(())
    }

    async fn commit_snapshot(&self, state: &PipelineState) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(&state.session_id) {
            entry.state = state.clone();
        }
    }

    /// The orchestrator's effective configuration.
    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request() -> IdeaRequest {
        IdeaRequest {
            idea: "AI launch planner".to_string(),
            industry: "devtools".to_string(),
            target_market: "founders".to_string(),
            additional_context: None,
        }
    }

    fn fast_config(dir: &tempfile::TempDir) -> ForgeConfig {
        let mut config = ForgeConfig::default();
        config.output_dir = dir.path().to_path_buf();
        config.image_retry_delay = Duration::ZERO;
        config.video_backoff_base = Duration::ZERO;
        config.validation_backoff_base = Duration::ZERO;
        config
    }

    fn orchestrator(dir: &tempfile::TempDir, profile: QualityProfile) -> PipelineOrchestrator {
        let config = fast_config(dir);
        let image = SimulatedBackend::new("image", profile.clone())
            .with_latency(Duration::ZERO);
        let video = SimulatedBackend::new("video", profile.clone())
            .with_latency(Duration::ZERO)
            .with_duration_seconds(30);
        let deck =
            SimulatedBackend::new("deck", profile).with_latency(Duration::ZERO);
        PipelineOrchestrator::new(config, Arc::new(image), Arc::new(video), Arc::new(deck))
    }

    #[tokio::test]
    async fn test_full_run_reaches_completed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let orch = orchestrator(&dir, QualityProfile::Fixed(0.95));

        let state = orch.start(request(), None).await.expect("run");

        assert_eq!(state.current_stage, PipelineStage::Completed);
        assert!(state.completed_at.is_some());
        assert!(state.ideation.is_some());
        assert!(state.media.is_some());
        assert!(state.publish.is_some());
    }

    #[tokio::test]
    async fn test_explicit_session_id_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let orch = orchestrator(&dir, QualityProfile::Fixed(0.95));

        let state = orch
            .start(request(), Some("run-42".to_string()))
            .await
            .expect("run");
        assert_eq!(state.session_id, "run-42");

        let snapshot = orch.get_state("run-42").await.expect("snapshot");
        assert_eq!(snapshot.current_stage, PipelineStage::Completed);
    }

    #[tokio::test]
    async fn test_invalid_request_fails_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let orch = orchestrator(&dir, QualityProfile::Fixed(0.95));

        let mut bad = request();
        bad.idea = String::new();
        let err = orch
            .start(bad, Some("bad-run".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Stage(_)));

        let snapshot = orch.get_state("bad-run").await.expect("snapshot");
        assert_eq!(snapshot.current_stage, PipelineStage::Failed);
        assert!(snapshot.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_cancel_unknown_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let orch = orchestrator(&dir, QualityProfile::Fixed(0.95));

        let err = orch.cancel("nope").await.unwrap_err();
        assert!(matches!(err, PipelineError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_state_unknown_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let orch = orchestrator(&dir, QualityProfile::Fixed(0.95));
        assert!(orch.get_state("nope").await.is_none());
    }
}
