//! gtmforge: a multi-stage GTM asset generation pipeline.
//!
//! A startup idea flows through a fixed stage sequence (ideation,
//! benchmarking, pitch writing, prompt compilation, content review, media
//! generation, publishing). Generation stages drive quality-variable
//! backends through a shared quality-gated retry loop; accepted assets are
//! validated per asset with bounded retry and published as an id-keyed
//! manifest.

pub mod agents;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod retry;
pub mod storage;
pub mod validation;

pub use config::{ConfigError, ForgeConfig};
pub use error::{BackendError, StoreError};
pub use pipeline::{PipelineError, PipelineOrchestrator, PipelineStage, PipelineState};
