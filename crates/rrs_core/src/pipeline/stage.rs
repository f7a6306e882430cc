//! Pipeline stage trait definition.

use serde::{Deserialize, Serialize};

use super::context::{RunContext, RunState};
use super::errors::StageResult;

/// Identity of a pipeline stage, used for the per-run selection map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Query and download raw radar files.
    Download,
    /// Transpose radar data in time/space into the polling tree.
    Transpose,
    /// Fast placefiles (reports, surface obs, probability products).
    FastPlacefiles,
    /// Secondary-model environment placefiles.
    ModelPlacefiles,
    /// Hodograph-style renders.
    Hodographs,
    /// Always-on metadata stage (event pages).
    Metadata,
}

/// Result of executing a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Stage completed successfully.
    Completed,
    /// Stage determined it had nothing to do (not an error).
    Skipped(String),
}

/// Trait for pipeline stages.
///
/// The runner calls `validate_input` before `execute`; cancellation is
/// checked at stage boundaries and surfaces from `execute` as the
/// `StageError::Cancelled` sentinel when a collaborator terminates on
/// the cancellation signal.
pub trait PipelineStage: Send + Sync {
    /// Stage name for logging and error context.
    fn name(&self) -> &str;

    /// Which selection-map entry governs this stage.
    fn kind(&self) -> StageKind;

    /// Validate preconditions before execution.
    fn validate_input(&self, _ctx: &RunContext) -> StageResult<()> {
        Ok(())
    }

    /// Execute the stage's work, recording results in `state`.
    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutcome>;
}
