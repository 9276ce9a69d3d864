//! Prompt-forge stage: compiles the pitch narrative into media prompts.

use tracing::info;

use crate::agents::error::AgentError;
use crate::agents::types::{MediaKind, PitchNarrative, PromptForgeOutput, PromptSpec};

const STAGE: &str = "prompt_forge";

/// Compiles one image prompt per slide plus a single trailer video prompt.
#[derive(Debug)]
pub struct PromptForgeAgent {
    visual_theme: String,
}

impl PromptForgeAgent {
    /// Creates the agent with the configured visual theme.
    pub fn new(visual_theme: impl Into<String>) -> Self {
        Self {
            visual_theme: visual_theme.into(),
        }
    }

    /// Runs the prompt-forge stage.
    ///
    /// A narrative with zero slides compiles to zero prompts; downstream
    /// stages treat that as a valid empty collection.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::InvalidInput` when the narrative arc is empty.
    pub fn run(&self, narrative: &PitchNarrative) -> Result<PromptForgeOutput, AgentError> {
        if narrative.narrative_arc.trim().is_empty() {
            return Err(AgentError::InvalidInput {
                stage: STAGE,
                message: "narrative arc is empty".to_string(),
            });
        }

        let style_guidance = format!(
            "Theme: {}. Cinematic lighting, high contrast, minimal text, \
             16:9 composition.",
            self.visual_theme
        );

        let image_prompts: Vec<PromptSpec> = narrative
            .slides
            .iter()
            .map(|slide| PromptSpec {
                id: format!("img_slide_{}", slide.slide_number),
                slide_number: Some(slide.slide_number),
                kind: MediaKind::Image,
                prompt_text: format!(
                    "Pitch deck hero image for the slide \"{}\": {}",
                    slide.title, slide.body
                ),
                style_guidance: style_guidance.clone(),
            })
            .collect();

        let video_prompt = if narrative.slides.is_empty() {
            None
        } else {
            let beats: Vec<&str> = narrative
                .slides
                .iter()
                .map(|s| s.title.as_str())
                .collect();
            Some(PromptSpec {
                id: "trailer".to_string(),
                slide_number: None,
                kind: MediaKind::Video,
                prompt_text: format!(
                    "A 30-second product trailer cutting through the beats: {}. \
                     Arc: {}",
                    beats.join(", "),
                    narrative.narrative_arc
                ),
                style_guidance: style_guidance.clone(),
            })
        };

        info!(
            image_prompts = image_prompts.len(),
            has_video_prompt = video_prompt.is_some(),
            "Media prompts compiled"
        );

        Ok(PromptForgeOutput {
            image_prompts,
            video_prompt,
            visual_theme: self.visual_theme.clone(),
            brand_guidelines: format!(
                "Consistent {} palette across all assets; logo bottom-right; \
                 no stock-photo aesthetics.",
                self.visual_theme
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::types::SlideContent;

    fn narrative(slide_count: u32) -> PitchNarrative {
        PitchNarrative {
            slides: (1..=slide_count)
                .map(|n| SlideContent {
                    slide_number: n,
                    title: format!("Slide {}", n),
                    body: "Body text long enough to seed a prompt.".to_string(),
                    talking_points: vec![],
                })
                .collect(),
            narrative_arc: "Tension then resolution.".to_string(),
            estimated_duration_minutes: slide_count * 2,
        }
    }

    #[test]
    fn test_one_image_prompt_per_slide() {
        let agent = PromptForgeAgent::new("dark_steel_tech_blue");
        let output = agent.run(&narrative(5)).expect("run");

        assert_eq!(output.image_prompts.len(), 5);
        assert_eq!(output.image_prompts[2].id, "img_slide_3");
        assert_eq!(output.image_prompts[2].slide_number, Some(3));
        assert!(output.video_prompt.is_some());
    }

    #[test]
    fn test_empty_narrative_compiles_to_no_prompts() {
        let agent = PromptForgeAgent::new("dark_steel_tech_blue");
        let output = agent.run(&narrative(0)).expect("run");

        assert!(output.image_prompts.is_empty());
        assert!(output.video_prompt.is_none());
    }

    #[test]
    fn test_style_guidance_carries_theme() {
        let agent = PromptForgeAgent::new("sunset_orange");
        let output = agent.run(&narrative(1)).expect("run");
        assert!(output.image_prompts[0]
            .style_guidance
            .contains("sunset_orange"));
    }
}
