//! Ideation stage: expands a raw startup idea into structured GTM context.

use tracing::info;

use crate::agents::error::AgentError;
use crate::agents::types::{CustomerProfile, IdeaRequest, IdeationOutput};

const STAGE: &str = "ideation";

/// Expands the originating idea into customer, market, and positioning
/// context for the downstream stages.
#[derive(Debug, Default)]
pub struct IdeationAgent;

impl IdeationAgent {
    pub fn new() -> Self {
        Self
    }

    /// Runs the ideation stage.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::InvalidInput` when the idea text is empty.
    pub fn run(&self, request: &IdeaRequest) -> Result<IdeationOutput, AgentError> {
        if request.idea.trim().is_empty() {
            return Err(AgentError::InvalidInput {
                stage: STAGE,
                message: "idea text is empty".to_string(),
            });
        }

        info!(industry = %request.industry, "Expanding idea into GTM context");

        let expanded_idea = format!(
            "{} — positioned as a category-defining {} product for {}.",
            request.idea.trim(),
            request.industry,
            request.target_market
        );

        let customer_profile = CustomerProfile {
            segment_name: format!("Early-adopter {} teams", request.target_market),
            description: format!(
                "Teams in {} who feel the problem acutely and have budget \
                 authority to adopt new {} tooling.",
                request.target_market, request.industry
            ),
            pain_points: vec![
                "Existing workflows are manual and error-prone".to_string(),
                format!("No integrated solution exists for {}", request.industry),
                "Switching costs of incumbent tools are high".to_string(),
            ],
            buying_triggers: vec![
                "A visible failure of the current process".to_string(),
                "Budget cycle opening for new tooling".to_string(),
            ],
        };

        let mut challenges = vec![
            format!("Educating {} on a new category", request.target_market),
            "Building trust against entrenched incumbents".to_string(),
        ];
        if let Some(context) = &request.additional_context {
            if !context.trim().is_empty() {
                challenges.push(format!("Context-specific constraint: {}", context.trim()));
            }
        }

        Ok(IdeationOutput {
            expanded_idea,
            market_context: format!(
                "The {} market is consolidating around platforms; {} remain \
                 underserved by point solutions.",
                request.industry, request.target_market
            ),
            value_proposition: format!(
                "The fastest path from intent to outcome for {} in {}.",
                request.target_market, request.industry
            ),
            differentiators: vec![
                "End-to-end workflow in one product".to_string(),
                "Quality gates on every generated output".to_string(),
                format!("Purpose-built for {}", request.target_market),
            ],
            challenges,
            customer_profile,
        })
    }
}
