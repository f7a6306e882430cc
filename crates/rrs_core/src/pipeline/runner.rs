//! Pipeline coordinator: runs stages in order on a single control
//! thread.
//!
//! State machine: not-started → running → {completed | cancelled}.
//! Stages execute strictly in a fixed dependency order; a disabled
//! stage is skipped without breaking the chain; the metadata stage
//! always runs. The durable status marker is rewritten after every
//! transition. A collaborator terminating on the cancellation signal
//! halts remaining stages and marks the run cancelled; any other stage
//! failure is logged and currently collapses to the same status.

use crate::models::{session::sweep_dir, RunStatus};
use crate::transform;

use super::archive;
use super::context::{RunContext, RunState};
use super::errors::{PipelineError, PipelineResult};
use super::stage::{PipelineStage, StageOutcome};
use super::stages;
use super::status::{CompletionMarker, StatusMarker};

/// Result of a coordinator run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Stages that completed successfully, in order.
    pub stages_completed: Vec<String>,
    /// Stages skipped (disabled or nothing to do).
    pub stages_skipped: Vec<String>,
    /// Placefiles shifted during finalization.
    pub shifted_artifacts: usize,
    /// Raw radar files archived into the first bundle.
    pub archived_raw: usize,
    /// Placefiles archived into the second bundle.
    pub archived_placefiles: usize,
}

/// Coordinator that runs a sequence of stages.
pub struct Coordinator {
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Coordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage (builder pattern).
    pub fn with_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The standard pipeline in dependency order.
    pub fn standard() -> Self {
        Self::new()
            .with_stage(stages::DownloadStage::new())
            .with_stage(stages::TransposeStage::new())
            .with_stage(stages::FastPlacefilesStage::new())
            .with_stage(stages::MetadataStage::new())
            .with_stage(stages::ModelPlacefilesStage::new())
            .with_stage(stages::HodographsStage::new())
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run the pipeline with the given context and state.
    pub fn run(&self, ctx: &RunContext, state: &mut RunState) -> PipelineResult<RunReport> {
        let session = ctx.session.as_str();
        let marker = StatusMarker::new(ctx.paths.status_file());
        let completion = CompletionMarker::new(ctx.paths.completion_marker());

        if !ctx.selection.is_complete() {
            return Err(PipelineError::validation_failed(
                session,
                format!(
                    "selected {} of {} requested sites",
                    ctx.selection.sites.len(),
                    ctx.selection.requested
                ),
            ));
        }

        self.prepare_workspace(ctx, &completion)?;
        self.mark(ctx, &marker, RunStatus::Startup)?;

        let mut report = RunReport::default();
        let total = self.stages.len();

        for (i, stage) in self.stages.iter().enumerate() {
            if ctx.token.is_cancelled() {
                ctx.logger
                    .warn(&format!("run cancelled before stage '{}'", stage.name()));
                self.mark(ctx, &marker, RunStatus::Cancelled)?;
                return Err(PipelineError::cancelled(session));
            }

            if !ctx.stage_enabled(stage.kind()) {
                ctx.logger
                    .info(&format!("{} disabled for this run, skipping", stage.name()));
                report.stages_skipped.push(stage.name().to_string());
                continue;
            }

            ctx.logger.phase(stage.name());
            let percent = ((i as f64 / total as f64) * 100.0) as u32;
            ctx.report_progress(stage.name(), percent, &format!("Starting {}", stage.name()));

            if let Err(e) = stage.validate_input(ctx) {
                ctx.logger.error(&format!("input validation failed: {}", e));
                self.mark(ctx, &marker, RunStatus::Cancelled)?;
                return Err(PipelineError::stage_failed(session, stage.name(), e));
            }

            match stage.execute(ctx, state) {
                Ok(StageOutcome::Completed) => {
                    ctx.logger.success(&format!("{} completed", stage.name()));
                    report.stages_completed.push(stage.name().to_string());
                    self.mark(ctx, &marker, RunStatus::Running)?;
                }
                Ok(StageOutcome::Skipped(reason)) => {
                    ctx.logger
                        .info(&format!("{} skipped: {}", stage.name(), reason));
                    report.stages_skipped.push(stage.name().to_string());
                }
                Err(e) if e.is_cancellation() => {
                    ctx.logger
                        .warn(&format!("{} cancelled: {}", stage.name(), e));
                    self.mark(ctx, &marker, RunStatus::Cancelled)?;
                    return Err(PipelineError::cancelled(session));
                }
                Err(e) => {
                    // Non-cancellation failures currently collapse to
                    // the same cancelled status; the log keeps them
                    // distinguishable.
                    ctx.logger.error(&format!("{} failed: {}", stage.name(), e));
                    ctx.logger.show_tail(stage.name());
                    self.mark(ctx, &marker, RunStatus::Cancelled)?;
                    return Err(PipelineError::stage_failed(session, stage.name(), e));
                }
            }
        }

        self.finalize(ctx, &marker, &completion, &mut report)?;
        ctx.report_progress("Complete", 100, "Pipeline finished");
        ctx.logger.success("pipeline completed");
        Ok(report)
    }

    /// Clean out prior-run artifacts and create the directory tree.
    fn prepare_workspace(
        &self,
        ctx: &RunContext,
        completion: &CompletionMarker,
    ) -> PipelineResult<()> {
        let session = ctx.session.as_str();
        completion
            .clear()
            .map_err(|e| PipelineError::setup_failed(session, format!("clearing marker: {}", e)))?;

        for dir in ctx.paths.run_dirs() {
            sweep_dir(&dir).map_err(|e| {
                PipelineError::setup_failed(session, format!("sweeping {}: {}", dir.display(), e))
            })?;
        }
        if let Err(e) = std::fs::remove_file(ctx.paths.inventory_file()) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(PipelineError::setup_failed(
                    session,
                    format!("removing inventory: {}", e),
                ));
            }
        }
        ctx.paths
            .ensure_dirs()
            .map_err(|e| PipelineError::setup_failed(session, format!("creating dirs: {}", e)))?;
        Ok(())
    }

    /// Shift placefiles, archive the two bundles, write the completion
    /// markers.
    fn finalize(
        &self,
        ctx: &RunContext,
        marker: &StatusMarker,
        completion: &CompletionMarker,
        report: &mut RunReport,
    ) -> PipelineResult<()> {
        let session = ctx.session.as_str();

        let spec = ctx.shift_spec();
        report.shifted_artifacts =
            transform::shift_placefiles(&ctx.paths.placefiles_dir(), &spec);
        ctx.logger.info(&format!(
            "shifted {} placefiles by {} seconds",
            report.shifted_artifacts, spec.shift_seconds
        ));

        report.archived_raw =
            archive::bundle_raw_radar(&ctx.paths.radar_dir(), &ctx.paths.radar_bundle())
                .map_err(|e| {
                    self.mark_best_effort(marker, RunStatus::Cancelled);
                    PipelineError::stage_failed(session, "Archive", e)
                })?;
        report.archived_placefiles = archive::bundle_original_placefiles(
            &ctx.paths.placefiles_dir(),
            &ctx.paths.placefile_bundle(),
        )
        .map_err(|e| {
            self.mark_best_effort(marker, RunStatus::Cancelled);
            PipelineError::stage_failed(session, "Archive", e)
        })?;

        completion
            .set()
            .map_err(|e| PipelineError::setup_failed(session, format!("completion marker: {}", e)))?;
        self.mark(ctx, marker, RunStatus::Completed)
    }

    fn mark(
        &self,
        ctx: &RunContext,
        marker: &StatusMarker,
        status: RunStatus,
    ) -> PipelineResult<()> {
        marker.write(status).map_err(|e| {
            PipelineError::setup_failed(
                ctx.session.as_str(),
                format!("writing status marker: {}", e),
            )
        })
    }

    fn mark_best_effort(&self, marker: &StatusMarker, status: RunStatus) {
        if let Err(e) = marker.write(status) {
            tracing::error!("failed to write status marker: {}", e);
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
