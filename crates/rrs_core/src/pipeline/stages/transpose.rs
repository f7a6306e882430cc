//! Transpose stage - moves radar data in time/space for polling.
//!
//! One munge collaborator invocation per selected site exports shifted
//! radar files into the destination site's polling directory. After
//! each site an initial `dir.list` is written so display clients have
//! data to poll while the later stages run. Intermediate files left in
//! the download directories are removed at the end.

use std::path::Path;

use crate::artifacts::{dir_list, POLLING_FILE_RE};
use crate::pipeline::context::{RunContext, RunState, TransposeOutput};
use crate::pipeline::errors::StageResult;
use crate::pipeline::invoke::{require_success, run_collaborator, StageCommand};
use crate::pipeline::stage::{PipelineStage, StageKind, StageOutcome};

pub struct TransposeStage;

impl TransposeStage {
    pub fn new() -> Self {
        Self
    }

    /// Munge command for one site.
    fn munge_command(&self, ctx: &RunContext, site: &str, destination: &str) -> StageCommand {
        StageCommand::new(&ctx.settings.executables.radar_munge)
            .arg(site)
            .arg(ctx.times.playback_start_str())
            .arg(ctx.times.event_duration.to_string())
            .arg(ctx.times.shift_seconds.to_string())
            .arg(ctx.paths.radar_dir().display().to_string())
            .arg(ctx.paths.polling_dir().display().to_string())
            .arg(destination)
            .arg(ctx.session.as_str())
    }

    /// Remove uncompressed/munged leftovers from the download dirs;
    /// the exported polling copies are the ones that matter now.
    fn remove_intermediate_files(&self, radar_dir: &Path) {
        let mut pending = vec![radar_dir.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            let in_downloads = dir.file_name().and_then(|n| n.to_str()) == Some("downloads");
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !in_downloads {
                    continue;
                }
                let name = match path.file_name().and_then(|n| n.to_str()) {
                    Some(name) => name,
                    None => continue,
                };
                if POLLING_FILE_RE.is_match(name) || name.contains(".uncompressed") {
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
    }
}

impl Default for TransposeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for TransposeStage {
    fn name(&self) -> &str {
        "Transpose"
    }

    fn kind(&self) -> StageKind {
        StageKind::Transpose
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutcome> {
        if ctx.sites.is_empty() {
            return Ok(StageOutcome::Skipped("no sites selected".to_string()));
        }

        let mut polling_sites: Vec<String> = Vec::new();
        for site in ctx.sites.keys() {
            let destination = ctx.destination_site(site);
            let cmd = self.munge_command(ctx, site, &destination);
            let output = run_collaborator(&cmd, &ctx.token, &ctx.logger)?;
            require_success(&cmd, &output)?;

            let site_dir = ctx.paths.site_polling_dir(&destination);
            match dir_list::write_dir_list(&site_dir, None) {
                Ok(count) => ctx
                    .logger
                    .info(&format!("{}: initial dir.list with {} files", destination, count)),
                Err(e) => ctx
                    .logger
                    .warn(&format!("could not write dir.list for {}: {}", destination, e)),
            }
            if !polling_sites.contains(&destination) {
                polling_sites.push(destination);
            }
        }

        self.remove_intermediate_files(&ctx.paths.radar_dir());
        state.transpose = Some(TransposeOutput { polling_sites });
        Ok(StageOutcome::Completed)
    }
}
