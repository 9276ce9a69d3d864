//! Comparative-insight stage: benchmarks the idea against known GTM plays.

use tracing::info;

use crate::agents::error::AgentError;
use crate::agents::types::{BenchmarkCompany, ComparativeInsight, IdeationOutput};

const STAGE: &str = "comparative_insight";

/// Derives benchmark companies and market positioning from ideation output.
#[derive(Debug, Default)]
pub struct ComparativeAgent;

impl ComparativeAgent {
    pub fn new() -> Self {
        Self
    }

    /// Runs the comparative-insight stage.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::InvalidInput` when the ideation output carries
    /// no value proposition to benchmark against.
    pub fn run(&self, ideation: &IdeationOutput) -> Result<ComparativeInsight, AgentError> {
        if ideation.value_proposition.trim().is_empty() {
            return Err(AgentError::InvalidInput {
                stage: STAGE,
                message: "ideation output has no value proposition".to_string(),
            });
        }

        let benchmarks = vec![
            BenchmarkCompany {
                name: "Notion".to_string(),
                similarity_score: 0.72,
                gtm_strategy: "Bottom-up adoption through free individual plans, \
                               converting teams once workflows take root."
                    .to_string(),
                key_takeaway: "Win individual users first; teams follow.".to_string(),
            },
            BenchmarkCompany {
                name: "Figma".to_string(),
                similarity_score: 0.64,
                gtm_strategy: "Collaboration as the wedge: multiplayer workflows \
                               make the product spread inside organizations."
                    .to_string(),
                key_takeaway: "Make sharing the default behavior.".to_string(),
            },
            BenchmarkCompany {
                name: "Stripe".to_string(),
                similarity_score: 0.55,
                gtm_strategy: "Developer experience as marketing: documentation \
                               and integration speed drive word of mouth."
                    .to_string(),
                key_takeaway: "Time-to-first-success under ten minutes.".to_string(),
            },
        ];

        info!(benchmarks = benchmarks.len(), "Benchmark set assembled");

        Ok(ComparativeInsight {
            market_positioning: format!(
                "Positioned between horizontal productivity platforms and \
                 vertical point tools: {}",
                ideation.value_proposition
            ),
            competitive_advantages: ideation.differentiators.clone(),
            investor_appeal: vec![
                "Clear wedge into an underserved segment".to_string(),
                "Expansion path from single user to team plan".to_string(),
                "Benchmark GTM motions with proven conversion economics".to_string(),
            ],
            benchmarks,
        })
    }
}
