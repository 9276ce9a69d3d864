//! Pitch-writing stage: turns ideation and benchmarks into a slide narrative.
//!
//! The slide list is dynamic: the problem slide appears only when ideation
//! surfaced challenges, and the why-now slide only when benchmarks exist.

use tracing::info;

use crate::agents::error::AgentError;
use crate::agents::types::{ComparativeInsight, IdeationOutput, PitchNarrative, SlideContent};

const STAGE: &str = "pitch_writing";

/// Minutes of speaking time budgeted per slide.
const MINUTES_PER_SLIDE: u32 = 2;

/// Writes the slide-by-slide pitch narrative.
#[derive(Debug, Default)]
pub struct PitchWriterAgent;

impl PitchWriterAgent {
    pub fn new() -> Self {
        Self
    }

    /// Runs the pitch-writing stage.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::InvalidInput` when ideation produced no
    /// expanded idea to narrate.
    pub fn run(
        &self,
        ideation: &IdeationOutput,
        insight: &ComparativeInsight,
    ) -> Result<PitchNarrative, AgentError> {
        if ideation.expanded_idea.trim().is_empty() {
            return Err(AgentError::InvalidInput {
                stage: STAGE,
                message: "no expanded idea to build a narrative from".to_string(),
            });
        }

        let mut slides = Vec::new();

        if !ideation.challenges.is_empty() {
            slides.push(self.slide(
                slides.len(),
                "The Problem",
                &ideation.customer_profile.pain_points.join(" "),
                ideation.customer_profile.pain_points.clone(),
            ));
        }

        slides.push(self.slide(
            slides.len(),
            "The Solution",
            &ideation.expanded_idea,
            vec![
                ideation.value_proposition.clone(),
                "Live demo of the end-to-end flow".to_string(),
            ],
        ));

        slides.push(self.slide(
            slides.len(),
            "Market Opportunity",
            &ideation.market_context,
            vec![insight.market_positioning.clone()],
        ));

        if !insight.benchmarks.is_empty() {
            let takeaways: Vec<String> = insight
                .benchmarks
                .iter()
                .map(|b| format!("{}: {}", b.name, b.key_takeaway))
                .collect();
            slides.push(self.slide(
                slides.len(),
                "Why Now",
                "Proven GTM motions from adjacent categories apply directly.",
                takeaways,
            ));
        }

        slides.push(self.slide(
            slides.len(),
            "Traction & Roadmap",
            "Early pilots validate the wedge; the roadmap compounds it.",
            insight.competitive_advantages.clone(),
        ));

        slides.push(self.slide(
            slides.len(),
            "Vision & Ask",
            &ideation.value_proposition,
            insight.investor_appeal.clone(),
        ));

        let narrative = PitchNarrative {
            narrative_arc: "Tension, resolution, inevitability: the problem is \
                            felt today, the solution exists now, and the market \
                            timing rewards moving first."
                .to_string(),
            estimated_duration_minutes: slides.len() as u32 * MINUTES_PER_SLIDE,
            slides,
        };

        info!(
            slides = narrative.slides.len(),
            minutes = narrative.estimated_duration_minutes,
            "Pitch narrative written"
        );
        Ok(narrative)
    }

    fn slide(
        &self,
        index: usize,
        title: &str,
        body: &str,
        talking_points: Vec<String>,
    ) -> SlideContent {
        SlideContent {
            slide_number: index as u32 + 1,
            title: title.to_string(),
            body: body.to_string(),
            talking_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::comparative::ComparativeAgent;
    use crate::agents::ideation::IdeationAgent;
    use crate::agents::types::IdeaRequest;

    fn inputs() -> (IdeationOutput, ComparativeInsight) {
        let ideation = IdeationAgent::new()
            .run(&IdeaRequest {
                idea: "AI launch planner".to_string(),
                industry: "devtools".to_string(),
                target_market: "founders".to_string(),
                additional_context: None,
            })
            .expect("ideation");
        let insight = ComparativeAgent::new().run(&ideation).expect("insight");
        (ideation, insight)
    }

    #[test]
    fn test_slide_numbers_are_sequential() {
        let (ideation, insight) = inputs();
        let narrative = PitchWriterAgent::new()
            .run(&ideation, &insight)
            .expect("run");

        for (i, slide) in narrative.slides.iter().enumerate() {
            assert_eq!(slide.slide_number, i as u32 + 1);
        }
        assert_eq!(
            narrative.estimated_duration_minutes,
            narrative.slides.len() as u32 * MINUTES_PER_SLIDE
        );
    }

    #[test]
    fn test_problem_slide_requires_challenges() {
        let (mut ideation, insight) = inputs();
        ideation.challenges.clear();

        let narrative = PitchWriterAgent::new()
            .run(&ideation, &insight)
            .expect("run");
        assert!(narrative.slides.iter().all(|s| s.title != "The Problem"));
    }

    #[test]
    fn test_why_now_requires_benchmarks() {
        let (ideation, mut insight) = inputs();
        insight.benchmarks.clear();

        let narrative = PitchWriterAgent::new()
            .run(&ideation, &insight)
            .expect("run");
        assert!(narrative.slides.iter().all(|s| s.title != "Why Now"));
    }
}
