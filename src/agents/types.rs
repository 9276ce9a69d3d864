//! Stage input/output types.
//!
//! Each pipeline stage declares a typed output; the orchestrator threads
//! these through `PipelineState` slots. All types serialize so state
//! snapshots and manifests can be persisted as JSON.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::manifest::AssetManifest;
use crate::validation::{ValidationReport, ValidationStatus};

/// The originating request for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaRequest {
    /// The startup idea in one or two sentences.
    pub idea: String,
    /// Industry vertical the idea targets.
    pub industry: String,
    /// Primary target market description.
    pub target_market: String,
    /// Optional extra context from the caller.
    pub additional_context: Option<String>,
}

/// One customer segment derived during ideation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub segment_name: String,
    pub description: String,
    pub pain_points: Vec<String>,
    pub buying_triggers: Vec<String>,
}

/// Output of the ideation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeationOutput {
    pub expanded_idea: String,
    pub customer_profile: CustomerProfile,
    pub market_context: String,
    pub value_proposition: String,
    pub differentiators: Vec<String>,
    /// Execution challenges; drives whether the pitch gets a problem slide.
    pub challenges: Vec<String>,
}

/// One comparable company used for benchmarking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkCompany {
    pub name: String,
    /// Similarity to the analyzed idea in `[0.0, 1.0]`.
    pub similarity_score: f64,
    pub gtm_strategy: String,
    pub key_takeaway: String,
}

/// Output of the comparative-insight stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparativeInsight {
    pub benchmarks: Vec<BenchmarkCompany>,
    pub market_positioning: String,
    pub competitive_advantages: Vec<String>,
    pub investor_appeal: Vec<String>,
}

/// One slide of the pitch narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideContent {
    /// One-based slide position.
    pub slide_number: u32,
    pub title: String,
    pub body: String,
    pub talking_points: Vec<String>,
}

/// Output of the pitch-writing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchNarrative {
    pub slides: Vec<SlideContent>,
    pub narrative_arc: String,
    pub estimated_duration_minutes: u32,
}

/// Kind of media a prompt targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// One generation prompt compiled by the prompt-forge stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSpec {
    /// Stable prompt identifier within the run (e.g. `img_slide_3`).
    pub id: String,
    /// Slide this prompt renders, when slide-bound.
    pub slide_number: Option<u32>,
    pub kind: MediaKind,
    pub prompt_text: String,
    pub style_guidance: String,
}

/// Output of the prompt-forge stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptForgeOutput {
    /// One prompt per slide, in slide order.
    pub image_prompts: Vec<PromptSpec>,
    /// The trailer video prompt, when a narrative exists to cut from.
    pub video_prompt: Option<PromptSpec>,
    pub visual_theme: String,
    pub brand_guidelines: String,
}

/// Severity of a content-review finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Critical,
    Warning,
    Info,
}

impl std::fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FindingSeverity::Critical => "critical",
            FindingSeverity::Warning => "warning",
            FindingSeverity::Info => "info",
        };
        write!(f, "{}", s)
    }
}

/// One finding from the pre-media content review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFinding {
    pub severity: FindingSeverity,
    /// Area of the content the finding concerns (e.g. `image_prompts`).
    pub area: String,
    pub message: String,
}

/// Output of the content-review stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentReview {
    pub findings: Vec<ContentFinding>,
    /// True when no critical findings were raised.
    pub passed: bool,
    pub reviewed_at: DateTime<Utc>,
}

impl ContentReview {
    /// Counts findings at a given severity.
    pub fn count(&self, severity: FindingSeverity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

/// Category of a generated asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Image,
    Video,
    Deck,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Image => "image",
            AssetCategory::Video => "video",
            AssetCategory::Deck => "deck",
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One accepted generated asset plus its generation metadata.
///
/// Created by a quality-gated retry loop on loop exit and never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Stable identifier within the run.
    pub id: String,
    /// Slide the artifact renders, when slide-bound.
    pub slide_number: Option<u32>,
    pub category: AssetCategory,
    /// Storage location of the artifact.
    pub location: PathBuf,
    /// Accepted quality score in `[0.0, 1.0]`.
    pub quality_score: f64,
    /// Backend time spent producing the accepted artifact.
    pub generation_latency: Duration,
    /// Retries consumed before acceptance; bounded by the stage budget.
    pub refinement_iteration: u32,
    /// The prompt that produced the artifact.
    pub prompt_used: String,
    /// Media duration in seconds, for time-based assets.
    pub duration_seconds: Option<u32>,
}

/// Output of one generation stage (images or video).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub artifacts: Vec<GeneratedArtifact>,
    /// Sum of accepted artifacts' backend latencies, not wall-clock time.
    pub total_generation_time: Duration,
    /// Arithmetic mean of accepted artifacts' scores; 0.0 when none.
    pub average_quality: f64,
    /// True exactly when no item-level error was recorded.
    pub generation_complete: bool,
    /// Item-level failures; siblings are unaffected by entries here.
    pub errors: Vec<String>,
}

impl GenerationOutput {
    /// Builds stage output from accepted artifacts and item-level errors.
    pub fn from_results(artifacts: Vec<GeneratedArtifact>, errors: Vec<String>) -> Self {
        let total_generation_time = artifacts.iter().map(|a| a.generation_latency).sum();
        let average_quality = if artifacts.is_empty() {
            0.0
        } else {
            artifacts.iter().map(|a| a.quality_score).sum::<f64>() / artifacts.len() as f64
        };
        Self {
            generation_complete: errors.is_empty(),
            artifacts,
            total_generation_time,
            average_quality,
            errors,
        }
    }
}

/// One page of the assembled deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckPage {
    pub page_number: u32,
    pub title: String,
    /// Image artifact rendered on the page, when one was accepted.
    pub image_id: Option<String>,
}

/// Output of the deck-assembly sub-step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckOutput {
    /// The rendered deck, absent when assembly hard-failed.
    pub artifact: Option<GeneratedArtifact>,
    pub pages: Vec<DeckPage>,
    pub theme: String,
    pub creation_complete: bool,
    pub errors: Vec<String>,
}

/// Combined output of the media-generation stage's three sub-steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaBundle {
    pub images: GenerationOutput,
    pub video: GenerationOutput,
    pub deck: DeckOutput,
}

impl MediaBundle {
    /// All accepted artifacts across the three sub-steps.
    pub fn all_artifacts(&self) -> Vec<&GeneratedArtifact> {
        self.images
            .artifacts
            .iter()
            .chain(self.video.artifacts.iter())
            .chain(self.deck.artifact.iter())
            .collect()
    }
}

/// Output of the publishing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutput {
    pub manifest_id: String,
    pub status: ValidationStatus,
    pub report: ValidationReport,
    pub manifest: AssetManifest,
    /// Where the manifest JSON was written.
    pub manifest_location: PathBuf,
    pub published_at: DateTime<Utc>,
}
