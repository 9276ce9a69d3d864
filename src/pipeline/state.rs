//! Pipeline run state.
//!
//! `PipelineState` is the single source of truth threaded stage to stage:
//! one output slot per stage, populated exactly once and in order. The
//! orchestrator is the only writer; stages read prior outputs and return a
//! new value. Slot discipline is enforced here so a violation surfaces as a
//! contract error instead of silent state corruption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::types::{
    ComparativeInsight, ContentReview, IdeaRequest, IdeationOutput, MediaBundle, PitchNarrative,
    PromptForgeOutput, PublishOutput,
};

/// Violations of the slot and transition contract.
///
/// These indicate programming errors, never environmental ones, and are
/// never retried.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Stage slot '{stage}' is already populated")]
    SlotAlreadyPopulated { stage: PipelineStage },

    #[error("Entering stage '{stage}' requires output from '{missing}'")]
    MissingPrerequisite {
        stage: PipelineStage,
        missing: PipelineStage,
    },

    #[error("Pipeline is terminal at '{stage}'; state is immutable")]
    Terminal { stage: PipelineStage },
}

/// The fixed pipeline stage order, plus the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Initialized,
    Ideation,
    ComparativeInsight,
    PitchWriting,
    PromptForge,
    QaValidation,
    MediaGeneration,
    Publishing,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Initialized => "initialized",
            PipelineStage::Ideation => "ideation",
            PipelineStage::ComparativeInsight => "comparative_insight",
            PipelineStage::PitchWriting => "pitch_writing",
            PipelineStage::PromptForge => "prompt_forge",
            PipelineStage::QaValidation => "qa_validation",
            PipelineStage::MediaGeneration => "media_generation",
            PipelineStage::Publishing => "publishing",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        }
    }

    /// Returns whether the stage is one of the two terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Completed | PipelineStage::Failed)
    }

    /// The stage that follows in the fixed order; terminal stages have none.
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Initialized => Some(PipelineStage::Ideation),
            PipelineStage::Ideation => Some(PipelineStage::ComparativeInsight),
            PipelineStage::ComparativeInsight => Some(PipelineStage::PitchWriting),
            PipelineStage::PitchWriting => Some(PipelineStage::PromptForge),
            PipelineStage::PromptForge => Some(PipelineStage::QaValidation),
            PipelineStage::QaValidation => Some(PipelineStage::MediaGeneration),
            PipelineStage::MediaGeneration => Some(PipelineStage::Publishing),
            PipelineStage::Publishing => Some(PipelineStage::Completed),
            PipelineStage::Completed | PipelineStage::Failed => None,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One pipeline run's full state record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub session_id: String,
    pub request: IdeaRequest,
    pub current_stage: PipelineStage,
    pub started_at: DateTime<Utc>,
    /// Stamped exactly once, only on terminal success.
    pub completed_at: Option<DateTime<Utc>>,

    pub ideation: Option<IdeationOutput>,
    pub comparative: Option<ComparativeInsight>,
    pub pitch: Option<PitchNarrative>,
    pub prompts: Option<PromptForgeOutput>,
    pub content_review: Option<ContentReview>,
    pub media: Option<MediaBundle>,
    pub publish: Option<PublishOutput>,
}

macro_rules! record_slot {
    ($fn_name:ident, $slot:ident, $stage:expr, $prereq:expr, $ty:ty) => {
        /// Commits the stage output into its slot, exactly once and in order.
        ///
        /// # Errors
        ///
        /// Returns `StateError` when the slot is already populated, the
        /// prerequisite slot is empty, or the run is terminal.
        pub fn $fn_name(&mut self, output: $ty) -> Result<(), StateError> {
            self.check_writable($stage, $prereq)?;
            if self.$slot.is_some() {
                return Err(StateError::SlotAlreadyPopulated { stage: $stage });
            }
            self.$slot = Some(output);
            Ok(())
        }
    };
}

impl PipelineState {
    /// Creates the state record at run start.
    pub fn new(session_id: impl Into<String>, request: IdeaRequest) -> Self {
        Self {
            session_id: session_id.into(),
            request,
            current_stage: PipelineStage::Initialized,
            started_at: Utc::now(),
            completed_at: None,
            ideation: None,
            comparative: None,
            pitch: None,
            prompts: None,
            content_review: None,
            media: None,
            publish: None,
        }
    }

    record_slot!(
        record_ideation,
        ideation,
        PipelineStage::Ideation,
        None,
        IdeationOutput
    );
    record_slot!(
        record_comparative,
        comparative,
        PipelineStage::ComparativeInsight,
        Some(PipelineStage::Ideation),
        ComparativeInsight
    );
    record_slot!(
        record_pitch,
        pitch,
        PipelineStage::PitchWriting,
        Some(PipelineStage::ComparativeInsight),
        PitchNarrative
    );
    record_slot!(
        record_prompts,
        prompts,
        PipelineStage::PromptForge,
        Some(PipelineStage::PitchWriting),
        PromptForgeOutput
    );
    record_slot!(
        record_content_review,
        content_review,
        PipelineStage::QaValidation,
        Some(PipelineStage::PromptForge),
        ContentReview
    );
    record_slot!(
        record_media,
        media,
        PipelineStage::MediaGeneration,
        Some(PipelineStage::QaValidation),
        MediaBundle
    );
    record_slot!(
        record_publish,
        publish,
        PipelineStage::Publishing,
        Some(PipelineStage::MediaGeneration),
        PublishOutput
    );

    /// Advances `current_stage`; entering a stage requires the preceding
    /// stage's slot to be populated.
    ///
    /// # Errors
    ///
    /// Returns `StateError` when the prerequisite slot is empty or the run
    /// is already terminal.
    pub fn begin_stage(&mut self, stage: PipelineStage) -> Result<(), StateError> {
        let prereq = match stage {
            PipelineStage::Ideation | PipelineStage::Initialized => None,
            PipelineStage::ComparativeInsight => Some(PipelineStage::Ideation),
            PipelineStage::PitchWriting => Some(PipelineStage::ComparativeInsight),
            PipelineStage::PromptForge => Some(PipelineStage::PitchWriting),
            PipelineStage::QaValidation => Some(PipelineStage::PromptForge),
            PipelineStage::MediaGeneration => Some(PipelineStage::QaValidation),
            PipelineStage::Publishing => Some(PipelineStage::MediaGeneration),
            PipelineStage::Completed => Some(PipelineStage::Publishing),
            PipelineStage::Failed => None,
        };
        self.check_writable(stage, prereq)?;
        self.current_stage = stage;
        if stage == PipelineStage::Completed {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Marks the run failed. Valid from any non-terminal stage.
    pub fn mark_failed(&mut self) {
        if !self.current_stage.is_terminal() {
            self.current_stage = PipelineStage::Failed;
        }
    }

    /// Returns whether a given stage's output slot is populated.
    pub fn slot_populated(&self, stage: PipelineStage) -> bool {
        match stage {
            PipelineStage::Ideation => self.ideation.is_some(),
            PipelineStage::ComparativeInsight => self.comparative.is_some(),
            PipelineStage::PitchWriting => self.pitch.is_some(),
            PipelineStage::PromptForge => self.prompts.is_some(),
            PipelineStage::QaValidation => self.content_review.is_some(),
            PipelineStage::MediaGeneration => self.media.is_some(),
            PipelineStage::Publishing => self.publish.is_some(),
            _ => false,
        }
    }

    fn check_writable(
        &self,
        stage: PipelineStage,
        prereq: Option<PipelineStage>,
    ) -> Result<(), StateError> {
        if self.current_stage.is_terminal() {
            return Err(StateError::Terminal {
                stage: self.current_stage,
            });
        }
        if let Some(missing) = prereq {
            if !self.slot_populated(missing) {
                return Err(StateError::MissingPrerequisite { stage, missing });
            }
        }
        Ok(())
    }
}
