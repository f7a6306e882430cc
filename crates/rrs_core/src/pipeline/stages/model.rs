//! Model placefile stage - secondary-model environment placefiles.

use crate::pipeline::context::{ModelOutput, RunContext, RunState};
use crate::pipeline::errors::StageResult;
use crate::pipeline::invoke::{require_success, run_collaborator, StageCommand};
use crate::pipeline::stage::{PipelineStage, StageKind, StageOutcome};

pub struct ModelPlacefilesStage;

impl ModelPlacefilesStage {
    pub fn new() -> Self {
        Self
    }

    fn model_command(&self, ctx: &RunContext) -> StageCommand {
        StageCommand::new(&ctx.settings.executables.model_placefile)
            .arg(ctx.times.event_start_str())
            .arg(ctx.times.event_duration.to_string())
            .arg(ctx.paths.data_dir.display().to_string())
            .arg(ctx.paths.placefiles_dir().display().to_string())
            .arg(ctx.session.as_str())
    }
}

impl Default for ModelPlacefilesStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for ModelPlacefilesStage {
    fn name(&self) -> &str {
        "ModelPlacefiles"
    }

    fn kind(&self) -> StageKind {
        StageKind::ModelPlacefiles
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutcome> {
        let cmd = self.model_command(ctx);
        let output = run_collaborator(&cmd, &ctx.token, &ctx.logger)?;
        require_success(&cmd, &output)?;

        state.model = Some(ModelOutput {
            summary: output.stdout.trim().to_string(),
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
    fn model_args_follow_the_fixed_order() {
        let dir = tempdir().unwrap();
        let ctx = testutil::single_site_context(&dir);
        let stage = ModelPlacefilesStage::new();

        let display = stage.model_command(&ctx).display();
        let parts: Vec<&str> = display.split_whitespace().collect();
        assert!(parts[0].ends_with("model_placefile"));
        assert_eq!(parts[1], "2023-06-07");
        assert_eq!(parts[2], "21:45");
        assert_eq!(parts[3], "30");
        assert_eq!(*parts.last().unwrap(), "tsession");
    }
}
