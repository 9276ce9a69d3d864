//! CLI command implementations.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::agents::types::IdeaRequest;
use crate::config::ForgeConfig;
use crate::pipeline::PipelineOrchestrator;

/// Arguments for the `run` command.
#[derive(Args)]
pub struct RunArgs {
    /// The startup idea in one or two sentences.
    #[arg(long)]
    pub idea: String,

    /// Industry vertical the idea targets.
    #[arg(long, default_value = "software")]
    pub industry: String,

    /// Primary target market description.
    #[arg(long, default_value = "early adopters")]
    pub target_market: String,

    /// Optional extra context for ideation.
    #[arg(long)]
    pub context: Option<String>,

    /// Output directory for generated assets (overrides FORGE_OUTPUT_DIR).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Session identifier; generated when omitted.
    #[arg(long)]
    pub session_id: Option<String>,
}

/// Runs one full pipeline invocation against the simulated backends.
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = ForgeConfig::from_env().context("Failed to load configuration")?;
    if let Some(output) = args.output {
        config.output_dir = output;
    }

    let orchestrator = PipelineOrchestrator::with_simulated_backends(config);
    let request = IdeaRequest {
        idea: args.idea,
        industry: args.industry,
        target_market: args.target_market,
        additional_context: args.context,
    };

    let state = orchestrator
        .start(request, args.session_id)
        .await
        .context("Pipeline run failed")?;

    println!("Session:  {}", state.session_id);
    println!("Stage:    {}", state.current_stage);
    if let Some(publish) = &state.publish {
        println!("Status:   {}", publish.status);
        println!("Assets:   {}", publish.manifest.len());
        println!("Manifest: {}", publish.manifest_location.display());
    }

    Ok(())
}
