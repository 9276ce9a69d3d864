//! Pipeline stages.
//!
//! Stages are grouped in execution order: content stages (ideation through
//! content review) produce templated business content from typed inputs,
//! media stages drive scored generation backends through the quality-gated
//! retry loop, and the publisher validates and ships the result.

pub mod error;
pub mod types;

pub mod comparative;
pub mod deck_builder;
pub mod ideation;
pub mod image_gen;
pub mod pitch_writer;
pub mod prompt_forge;
pub mod publisher;
pub mod qa;
pub mod video_gen;

pub use error::AgentError;
