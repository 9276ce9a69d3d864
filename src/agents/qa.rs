//! Content-review stage: gates prompt quality before media generation.
//!
//! Review findings never abort the pipeline on their own; only a critical
//! finding fails the review, and the orchestrator decides what a failed
//! review means for the run.

use chrono::Utc;
use tracing::{info, warn};

use crate::agents::error::AgentError;
use crate::agents::types::{ContentFinding, ContentReview, FindingSeverity, PromptForgeOutput};

/// Prompts shorter than this are flagged as likely too thin to render well.
const MIN_PROMPT_CHARS: usize = 50;

/// Reviews compiled prompts for completeness and brand consistency.
#[derive(Debug, Default)]
pub struct ContentReviewAgent;

impl ContentReviewAgent {
    pub fn new() -> Self {
        Self
    }

    /// Runs the content review.
    ///
    /// # Errors
    ///
    /// Infallible today; the `Result` keeps the stage signature uniform.
    pub fn run(&self, prompts: &PromptForgeOutput) -> Result<ContentReview, AgentError> {
        let mut findings = Vec::new();

        if prompts.image_prompts.is_empty() {
            findings.push(ContentFinding {
                severity: FindingSeverity::Critical,
                area: "image_prompts".to_string(),
                message: "no image prompts were compiled; nothing to render".to_string(),
            });
        }

        if prompts.video_prompt.is_none() {
            findings.push(ContentFinding {
                severity: FindingSeverity::Warning,
                area: "video_prompt".to_string(),
                message: "no trailer prompt; the run will ship without video".to_string(),
            });
        }

        for prompt in prompts
            .image_prompts
            .iter()
            .chain(prompts.video_prompt.iter())
        {
            if prompt.prompt_text.chars().count() < MIN_PROMPT_CHARS {
                findings.push(ContentFinding {
                    severity: FindingSeverity::Warning,
                    area: prompt.id.clone(),
                    message: format!(
                        "prompt text is only {} characters; renders tend to drift",
                        prompt.prompt_text.chars().count()
                    ),
                });
            }
        }

        if !prompts.brand_guidelines.contains(&prompts.visual_theme) {
            findings.push(ContentFinding {
                severity: FindingSeverity::Info,
                area: "brand_guidelines".to_string(),
                message: "brand guidelines do not reference the visual theme".to_string(),
            });
        }

        let passed = !findings
            .iter()
            .any(|f| f.severity == FindingSeverity::Critical);

        if passed {
            info!(findings = findings.len(), "Content review passed");
        } else {
            warn!(findings = findings.len(), "Content review failed");
        }

        Ok(ContentReview {
            findings,
            passed,
            reviewed_at: Utc::now(),
        })
    }
}
