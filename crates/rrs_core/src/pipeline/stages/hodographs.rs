//! Hodograph stage - wind-profile renders per site.
//!
//! One render collaborator invocation per selected site, passing the
//! site's paired ground-observation stations. Two renders are expected
//! per radar file, which is what the monitor's render ratio assumes.
//! The hodograph page is regenerated once all sites are rendered.

use crate::artifacts::hodo_page;
use crate::models::SiteMeta;
use crate::pipeline::context::{HodographsOutput, RunContext, RunState};
use crate::pipeline::errors::{StageError, StageResult};
use crate::pipeline::invoke::{require_success, run_collaborator, StageCommand};
use crate::pipeline::stage::{PipelineStage, StageKind, StageOutcome};

pub struct HodographsStage;

impl HodographsStage {
    pub fn new() -> Self {
        Self
    }

    fn render_command(&self, ctx: &RunContext, meta: &SiteMeta) -> StageCommand {
        StageCommand::new(&ctx.settings.executables.hodo_render)
            .arg(&meta.code)
            .arg(ctx.destination_site(&meta.code))
            .arg(&meta.asos_one)
            .arg(&meta.asos_two)
            .arg(ctx.times.shift_seconds.to_string())
            .arg(ctx.paths.radar_dir().display().to_string())
            .arg(ctx.paths.hodographs_dir().display().to_string())
            .arg(ctx.session.as_str())
    }
}

impl Default for HodographsStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for HodographsStage {
    fn name(&self) -> &str {
        "Hodographs"
    }

    fn kind(&self) -> StageKind {
        StageKind::Hodographs
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutcome> {
        if ctx.sites.is_empty() {
            return Ok(StageOutcome::Skipped("no sites selected".to_string()));
        }

        let mut rendered_sites = Vec::new();
        for meta in ctx.sites.values() {
            let cmd = self.render_command(ctx, meta);
            let output = run_collaborator(&cmd, &ctx.token, &ctx.logger)?;
            require_success(&cmd, &output)?;
            rendered_sites.push(meta.code.clone());
        }

        let page_images = hodo_page::write_hodo_page(
            &ctx.paths.hodographs_dir(),
            &ctx.paths.hodograph_page(),
            None,
        )
        .map_err(|e| StageError::io_error("writing hodograph page", e))?;

        state.hodographs = Some(HodographsOutput {
            rendered_sites,
            page_images,
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
    fn render_args_carry_paired_stations_and_shift() {
        let dir = tempdir().unwrap();
        let ctx = testutil::single_site_context(&dir);
        let stage = HodographsStage::new();
        let meta = ctx.sites.get("KTLX").unwrap().clone();

        let display = stage.render_command(&ctx, &meta).display();
        let parts: Vec<&str> = display.split_whitespace().collect();
        assert_eq!(parts[1], "KTLX");
        assert_eq!(parts[2], "KTLX");
        assert_eq!(parts[3], "KOKC");
        assert_eq!(parts[4], "KOUN");
        assert_eq!(parts[5], &ctx.times.shift_seconds.to_string());
        assert_eq!(*parts.last().unwrap(), "tsession");
    }

    #[test]
    fn destination_reflects_transpose_target() {
        let dir = tempdir().unwrap();
        let ctx = testutil::context_with(&dir, &["KTLX"], Some("KGRR"));
        let stage = HodographsStage::new();
        let meta = ctx.sites.get("KTLX").unwrap().clone();

        let display = stage.render_command(&ctx, &meta).display();
        let parts: Vec<&str> = display.split_whitespace().collect();
        assert_eq!(parts[2], "KGRR");
    }
}
