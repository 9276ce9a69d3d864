//! End-to-end pipeline scenarios against the simulated backends.

use std::sync::Arc;
use std::time::Duration;

use gtmforge::agents::image_gen::ImageGenAgent;
use gtmforge::agents::types::{AssetCategory, GeneratedArtifact, IdeaRequest, MediaKind, PromptSpec};
use gtmforge::backend::{QualityProfile, SimulatedBackend};
use gtmforge::manifest;
use gtmforge::pipeline::{CancelToken, PipelineOrchestrator, PipelineStage};
use gtmforge::storage::AssetStore;
use gtmforge::validation::{ValidationEngine, ValidationStatus};
use gtmforge::ForgeConfig;

fn fast_config(dir: &tempfile::TempDir) -> ForgeConfig {
    let mut config = ForgeConfig::default();
    config.output_dir = dir.path().to_path_buf();
    config.image_retry_delay = Duration::ZERO;
    config.video_backoff_base = Duration::ZERO;
    config.validation_backoff_base = Duration::ZERO;
    config
}

fn slide_prompt(n: u32) -> PromptSpec {
    PromptSpec {
        id: format!("img_slide_{}", n),
        slide_number: Some(n),
        kind: MediaKind::Image,
        prompt_text: format!("hero image for slide {}", n),
        style_guidance: "dark steel".to_string(),
    }
}

fn request() -> IdeaRequest {
    IdeaRequest {
        idea: "AI-assisted launch planning for product teams".to_string(),
        industry: "developer tools".to_string(),
        target_market: "seed-stage founders".to_string(),
        additional_context: None,
    }
}

/// Scenario A: one slide, threshold 0.85, first call scores 0.90.
#[tokio::test]
async fn scenario_first_call_above_threshold() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = fast_config(&dir);
    let store = AssetStore::new(dir.path());
    store.ensure_layout().expect("layout");
    let backend =
        SimulatedBackend::new("image", QualityProfile::Fixed(0.90)).with_latency(Duration::ZERO);
    let agent = ImageGenAgent::new(Arc::new(backend), store, &config);

    let output = agent
        .run(&[slide_prompt(1)], &CancelToken::never())
        .await
        .expect("run");

    assert_eq!(output.artifacts.len(), 1);
    assert_eq!(output.artifacts[0].refinement_iteration, 0);
    assert!(output.generation_complete);
    assert!((output.artifacts[0].quality_score - 0.90).abs() < f64::EPSILON);
}

/// Scenario B: scores climb 0.5 -> 0.75 but never reach 0.85; the retry
/// budget (3) is spent and the last artifact is accepted with no error.
#[tokio::test]
async fn scenario_quality_exhaustion_accepts_last() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = fast_config(&dir);
    let store = AssetStore::new(dir.path());
    store.ensure_layout().expect("layout");
    let backend = SimulatedBackend::new(
        "image",
        QualityProfile::Sequence(vec![0.5, 0.6, 0.7, 0.75]),
    )
    .with_latency(Duration::ZERO);
    let agent = ImageGenAgent::new(Arc::new(backend), store, &config);

    let output = agent
        .run(&[slide_prompt(1)], &CancelToken::never())
        .await
        .expect("run");

    assert_eq!(output.artifacts.len(), 1);
    assert_eq!(output.artifacts[0].refinement_iteration, 3);
    assert!((output.artifacts[0].quality_score - 0.75).abs() < f64::EPSILON);
    assert!(output.errors.is_empty());
    assert!(output.generation_complete);
}

/// Scenario C: three images, one missing on disk through every validation
/// retry; the run still passes with warnings and one error finding.
#[tokio::test]
async fn scenario_partial_asset_loss_passes_with_warnings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = fast_config(&dir);
    let store = AssetStore::new(dir.path());
    store.ensure_layout().expect("layout");

    let mut artifacts = Vec::new();
    for n in 1..=3u32 {
        let location = store.image_path(n, 0);
        if n != 2 {
            store.write(&location, &[0u8; 64]).expect("write");
        }
        artifacts.push(GeneratedArtifact {
            id: format!("img_slide_{}", n),
            slide_number: Some(n),
            category: AssetCategory::Image,
            location,
            quality_score: 0.9,
            generation_latency: Duration::from_millis(5),
            refinement_iteration: 0,
            prompt_used: "p".to_string(),
            duration_seconds: None,
        });
    }

    let engine = ValidationEngine::new(store, &config);
    let refs: Vec<&GeneratedArtifact> = artifacts.iter().collect();
    let report = engine
        .validate(&refs, &CancelToken::never())
        .await
        .expect("validate");

    assert_eq!(report.status, ValidationStatus::PassedWithWarnings);
    assert_eq!(report.valid_count, 2);
    assert_eq!(report.invalid_count, 1);
    assert_eq!(report.errors().count(), 1);
    assert_eq!(
        report.errors().next().map(|f| f.asset_id.as_str()),
        Some("img_slide_2")
    );
}

/// Full pipeline run: every slot populates in order, the terminal state is
/// `completed`, and the published manifest covers every accepted artifact.
#[tokio::test]
async fn full_run_populates_slots_monotonically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = fast_config(&dir);
    let image = SimulatedBackend::new("image", QualityProfile::Fixed(0.92))
        .with_latency(Duration::ZERO);
    let video = SimulatedBackend::new("video", QualityProfile::Fixed(0.88))
        .with_latency(Duration::ZERO)
        .with_duration_seconds(30);
    let deck =
        SimulatedBackend::new("deck", QualityProfile::Fixed(0.85)).with_latency(Duration::ZERO);
    let orch =
        PipelineOrchestrator::new(config, Arc::new(image), Arc::new(video), Arc::new(deck));

    let state = orch
        .start(request(), Some("scenario-full".to_string()))
        .await
        .expect("run");

    assert_eq!(state.current_stage, PipelineStage::Completed);
    assert!(state.completed_at.is_some());
    for stage in [
        PipelineStage::Ideation,
        PipelineStage::ComparativeInsight,
        PipelineStage::PitchWriting,
        PipelineStage::PromptForge,
        PipelineStage::QaValidation,
        PipelineStage::MediaGeneration,
        PipelineStage::Publishing,
    ] {
        assert!(state.slot_populated(stage), "slot {} empty", stage);
    }

    let media = state.media.as_ref().expect("media");
    let publish = state.publish.as_ref().expect("publish");
    assert_eq!(publish.status, ValidationStatus::Passed);
    assert_eq!(publish.manifest.len(), media.all_artifacts().len());
    assert!(publish.manifest.contains_key("trailer"));
    assert!(publish.manifest.contains_key("pitch_deck"));

    // The snapshot in the session registry matches the returned state.
    let snapshot = orch.get_state("scenario-full").await.expect("snapshot");
    assert_eq!(snapshot.current_stage, PipelineStage::Completed);
    assert_eq!(
        snapshot.publish.as_ref().map(|p| p.manifest_id.clone()),
        Some(publish.manifest_id.clone())
    );
}

/// A run whose trailer generation hard-fails still completes: the loss
/// surfaces as `passed_with_warnings` at publish time, not a failed run.
#[tokio::test]
async fn full_run_survives_video_loss() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = fast_config(&dir);
    let image = SimulatedBackend::new("image", QualityProfile::Fixed(0.92))
        .with_latency(Duration::ZERO);
    let video = SimulatedBackend::new("video", QualityProfile::Fixed(0.88))
        .with_latency(Duration::ZERO)
        .with_transient_failures("trailer", 20);
    let deck =
        SimulatedBackend::new("deck", QualityProfile::Fixed(0.85)).with_latency(Duration::ZERO);
    let orch =
        PipelineOrchestrator::new(config, Arc::new(image), Arc::new(video), Arc::new(deck));

    let state = orch.start(request(), None).await.expect("run");

    assert_eq!(state.current_stage, PipelineStage::Completed);
    let media = state.media.as_ref().expect("media");
    assert!(!media.video.generation_complete);
    assert!(media.video.artifacts.is_empty());

    let publish = state.publish.as_ref().expect("publish");
    assert_eq!(publish.status, ValidationStatus::Passed);
    assert!(!publish.manifest.contains_key("trailer"));
}

/// Manifest building is order-independent over the same artifacts.
#[test]
fn manifest_is_permutation_invariant() {
    let mk = |id: &str, n: u32| GeneratedArtifact {
        id: id.to_string(),
        slide_number: Some(n),
        category: AssetCategory::Image,
        location: std::path::PathBuf::from(format!("/tmp/{}.png", id)),
        quality_score: 0.9,
        generation_latency: Duration::from_millis(5),
        refinement_iteration: 0,
        prompt_used: "p".to_string(),
        duration_seconds: None,
    };
    let a = mk("a", 1);
    let b = mk("b", 2);
    let c = mk("c", 3);

    let orders = [[&a, &b, &c], [&c, &a, &b], [&b, &c, &a]];
    let first = manifest::from_artifacts(orders[0], None);
    for order in &orders[1..] {
        assert_eq!(manifest::from_artifacts(*order, None), first);
    }
}

/// Cancelling a session before its run starts fails the run promptly.
#[tokio::test]
async fn cancellation_interrupts_a_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = fast_config(&dir);
    // Long image backoff so an in-flight run lingers in a sleep.
    config.image_retry_delay = Duration::from_secs(60);
    let image = SimulatedBackend::new("image", QualityProfile::Fixed(0.1))
        .with_latency(Duration::ZERO);
    let video = SimulatedBackend::new("video", QualityProfile::Fixed(0.88))
        .with_latency(Duration::ZERO);
    let deck =
        SimulatedBackend::new("deck", QualityProfile::Fixed(0.85)).with_latency(Duration::ZERO);
    let orch = Arc::new(PipelineOrchestrator::new(
        config,
        Arc::new(image),
        Arc::new(video),
        Arc::new(deck),
    ));

    let runner = Arc::clone(&orch);
    let run = tokio::spawn(async move {
        runner
            .start(request(), Some("to-cancel".to_string()))
            .await
    });

    // Give the run time to enter the image stage's backoff sleep.
    tokio::time::sleep(Duration::from_millis(100)).await;
    orch.cancel("to-cancel").await.expect("cancel");

    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run must terminate promptly")
        .expect("join");
    assert!(result.is_err());

    let snapshot = orch.get_state("to-cancel").await.expect("snapshot");
    assert_eq!(snapshot.current_stage, PipelineStage::Failed);
    assert!(snapshot.completed_at.is_none());
}
