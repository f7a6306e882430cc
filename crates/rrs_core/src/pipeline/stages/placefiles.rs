//! Fast-placefile stage - quick-turnaround placefile generators.
//!
//! Four collaborator invocations in a fixed order: storm reports,
//! surface observations, probability-product download, probability
//! placefile. All are anchored to the first selected site's
//! coordinates.

use crate::pipeline::context::{PlacefilesOutput, RunContext, RunState};
use crate::pipeline::errors::StageResult;
use crate::pipeline::invoke::{require_success, run_collaborator, StageCommand};
use crate::pipeline::stage::{PipelineStage, StageKind, StageOutcome};

pub struct FastPlacefilesStage;

impl FastPlacefilesStage {
    pub fn new() -> Self {
        Self
    }

    /// Generator invocations in execution order.
    fn generator_commands(&self, ctx: &RunContext) -> Option<Vec<(&'static str, StageCommand)>> {
        let anchor = ctx.anchor_coords()?;
        let lat = anchor.lat.to_string();
        let lon = anchor.lon.to_string();
        let exes = &ctx.settings.executables;

        Some(vec![
            (
                "storm reports",
                StageCommand::new(&exes.reports_placefile)
                    .arg(&lat)
                    .arg(&lon)
                    .arg(ctx.times.event_start_str())
                    .arg(ctx.times.event_duration.to_string())
                    .arg(ctx.paths.data_dir.display().to_string())
                    .arg(ctx.paths.placefiles_dir().display().to_string())
                    .arg(ctx.session.as_str()),
            ),
            (
                "surface observations",
                StageCommand::new(&exes.obs_placefile)
                    .arg(&lat)
                    .arg(&lon)
                    .arg(ctx.times.event_start_str())
                    .arg(ctx.times.event_duration.to_string())
                    .arg(ctx.paths.placefiles_dir().display().to_string())
                    .arg(ctx.session.as_str()),
            ),
            (
                "probability download",
                StageCommand::new(&exes.probsevere_fetch)
                    .arg(ctx.times.event_start_str())
                    .arg(ctx.times.event_duration.to_string())
                    .arg(ctx.paths.probsevere_dir().display().to_string())
                    .arg(ctx.session.as_str()),
            ),
            (
                "probability placefile",
                StageCommand::new(&exes.probsevere_placefile)
                    .arg(&lat)
                    .arg(&lon)
                    .arg(ctx.paths.probsevere_dir().display().to_string())
                    .arg(ctx.paths.placefiles_dir().display().to_string())
                    .arg(ctx.session.as_str()),
            ),
        ])
    }
}

impl Default for FastPlacefilesStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for FastPlacefilesStage {
    fn name(&self) -> &str {
        "FastPlacefiles"
    }

    fn kind(&self) -> StageKind {
        StageKind::FastPlacefiles
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutcome> {
        let commands = match self.generator_commands(ctx) {
            Some(commands) => commands,
            None => {
                return Ok(StageOutcome::Skipped(
                    "no site coordinates to anchor placefiles".to_string(),
                ))
            }
        };

        let mut generators = Vec::new();
        for (label, cmd) in commands {
            ctx.logger.info(&format!("generating {}", label));
            let output = run_collaborator(&cmd, &ctx.token, &ctx.logger)?;
            require_success(&cmd, &output)?;
            generators.push(label.to_string());
        }

        state.placefiles = Some(PlacefilesOutput { generators });
        Ok(StageOutcome::Completed)
    }
}
