//! Metadata stage - event reference pages.
//!
//! Always executes regardless of the per-run stage selection. The
//! collaborator writes the events page and reference text file that
//! describe the replayed event in playback time.

use crate::pipeline::context::{MetadataOutput, RunContext, RunState};
use crate::pipeline::errors::StageResult;
use crate::pipeline::invoke::{require_success, run_collaborator, StageCommand};
use crate::pipeline::stage::{PipelineStage, StageKind, StageOutcome};

pub struct MetadataStage;

impl MetadataStage {
    pub fn new() -> Self {
        Self
    }

    fn events_command(&self, ctx: &RunContext) -> StageCommand {
        StageCommand::new(&ctx.settings.executables.event_times)
            .arg(ctx.times.shift_seconds.to_string())
            .arg(ctx.paths.data_dir.display().to_string())
            .arg(ctx.paths.radar_dir().display().to_string())
            .arg(ctx.paths.events_page().display().to_string())
            .arg(ctx.paths.events_file().display().to_string())
            .arg(ctx.session.as_str())
    }
}

impl Default for MetadataStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for MetadataStage {
    fn name(&self) -> &str {
        "Metadata"
    }

    fn kind(&self) -> StageKind {
        StageKind::Metadata
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutcome> {
        let cmd = self.events_command(ctx);
        let output = run_collaborator(&cmd, &ctx.token, &ctx.logger)?;
        require_success(&cmd, &output)?;

        state.metadata = Some(MetadataOutput {
            events_page: ctx.paths.events_page(),
        });
        Ok(StageOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testutil;
    use tempfile::tempdir;

    #[test]
    fn events_args_lead_with_the_shift() {
        let dir = tempdir().unwrap();
        let ctx = testutil::single_site_context(&dir);
        let stage = MetadataStage::new();

        let display = stage.events_command(&ctx).display();
        let parts: Vec<&str> = display.split_whitespace().collect();
        assert!(parts[0].ends_with("event_times"));
        assert_eq!(parts[1], &ctx.times.shift_seconds.to_string());
        assert_eq!(*parts.last().unwrap(), "tsession");
    }

    #[test]
    fn metadata_stage_is_always_enabled() {
        let dir = tempdir().unwrap();
        let mut ctx = testutil::single_site_context(&dir);
        ctx.settings.stages = crate::config::StageSettings::none();
        assert!(ctx.stage_enabled(StageKind::Metadata));
        assert!(!ctx.stage_enabled(StageKind::Download));
    }
}
