//! Pipeline state machine and orchestration.

pub mod cancel;
pub mod orchestrator;
pub mod state;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use orchestrator::{PipelineError, PipelineOrchestrator};
pub use state::{PipelineStage, PipelineState, StateError};
