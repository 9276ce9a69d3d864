//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// GTM asset generation pipeline.
#[derive(Parser)]
#[command(name = "gtmforge", version, about = "Generate GTM launch assets from a startup idea")]
pub struct Cli {
    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline for one idea.
    Run(commands::RunArgs),
}
