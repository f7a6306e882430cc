//! Download stage - pre-flight inventory plus raw radar downloads.
//!
//! Runs each site's fetch collaborator twice: first in inventory mode
//! ("false") to learn which files exist, then in download mode
//! ("true"). The merged inventory is the denominator for download
//! progress and is persisted to `radarinfo.json`, reset on every run.
//! The stage also seeds the polling tree with the client config file
//! and regenerates the links page.

use std::collections::BTreeMap;

use crate::artifacts::links_page;
use crate::pipeline::context::{DownloadOutput, RunContext, RunState};
use crate::pipeline::errors::{StageError, StageResult};
use crate::pipeline::invoke::{require_success, run_collaborator, StageCommand};
use crate::pipeline::stage::{PipelineStage, StageKind, StageOutcome};

pub struct DownloadStage;

impl DownloadStage {
    pub fn new() -> Self {
        Self
    }

    /// Fetch command for one site; `download` selects inventory vs.
    /// download mode.
    fn fetch_command(&self, ctx: &RunContext, site: &str, download: bool) -> StageCommand {
        StageCommand::new(&ctx.settings.executables.nexrad_fetch)
            .arg(site)
            .arg(ctx.times.event_start_str())
            .arg(ctx.times.event_duration.to_string())
            .arg(if download { "true" } else { "false" })
            .arg(ctx.paths.radar_dir().display().to_string())
            .arg(ctx.session.as_str())
    }

    /// Copy the poller config into the polling tree. The poller can't
    /// fetch anything without it, but a missing source file shouldn't
    /// kill the run.
    fn seed_polling_config(&self, ctx: &RunContext) {
        let source = ctx.paths.polling_config_source();
        let dest = ctx.paths.polling_config();
        if let Err(e) = std::fs::copy(&source, &dest) {
            ctx.logger.warn(&format!(
                "could not copy {} to {}: {}",
                source.display(),
                dest.display(),
                e
            ));
        }
    }

    fn write_links_page(&self, ctx: &RunContext) -> StageResult<()> {
        let link_base = format!("{}/{}", ctx.settings.paths.link_base, ctx.session);
        let sites: Vec<String> = match &ctx.transpose {
            Some(meta) => vec![meta.code.clone()],
            None => ctx.sites.keys().cloned().collect(),
        };
        links_page::write_links_page(&ctx.paths.links_page(), &link_base, &sites)
            .map_err(|e| StageError::io_error("writing links page", e))
    }

    /// Run the inventory pass and merge the JSON payloads.
    fn query_inventory(&self, ctx: &RunContext) -> StageResult<BTreeMap<String, String>> {
        let mut expected = BTreeMap::new();
        for site in ctx.sites.keys() {
            let cmd = self.fetch_command(ctx, site, false);
            let output = run_collaborator(&cmd, &ctx.token, &ctx.logger)?;
            require_success(&cmd, &output)?;

            let inventory: BTreeMap<String, String> =
                serde_json::from_str(output.stdout.trim()).map_err(|e| {
                    StageError::parse_error(
                        format!("{} inventory", site),
                        e.to_string(),
                    )
                })?;
            ctx.logger.info(&format!(
                "{}: {} files available",
                site,
                inventory.len()
            ));
            expected.extend(inventory);
        }
        Ok(expected)
    }
}

impl Default for DownloadStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStage for DownloadStage {
    fn name(&self) -> &str {
        "Download"
    }

    fn kind(&self) -> StageKind {
        StageKind::Download
    }

    fn validate_input(&self, ctx: &RunContext) -> StageResult<()> {
        if ctx.settings.executables.nexrad_fetch.trim().is_empty() {
            return Err(StageError::invalid_input(
                "no fetch collaborator configured",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutcome> {
        self.seed_polling_config(ctx);
        self.write_links_page(ctx)?;

        if ctx.sites.is_empty() {
            return Ok(StageOutcome::Skipped("no sites selected".to_string()));
        }

        let expected = self.query_inventory(ctx)?;
        let json = serde_json::to_string(&expected)
            .map_err(|e| StageError::parse_error("inventory", e.to_string()))?;
        std::fs::write(ctx.paths.inventory_file(), json)
            .map_err(|e| StageError::io_error("writing inventory", e))?;
        state.download = Some(DownloadOutput {
            expected_files: expected,
        });

        for site in ctx.sites.keys() {
            let cmd = self.fetch_command(ctx, site, true);
            let output = run_collaborator(&cmd, &ctx.token, &ctx.logger)?;
            require_success(&cmd, &output)?;
        }

        Ok(StageOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testutil;
    use tempfile::tempdir;

    #[test]
    fn fetch_args_follow_the_fixed_order() {
        let dir = tempdir().unwrap();
        let ctx = testutil::single_site_context(&dir);
        let stage = DownloadStage::new();

        let cmd = stage.fetch_command(&ctx, "KTLX", true);
        let display = cmd.display();
        let parts: Vec<&str> = display.split_whitespace().collect();
        // program, site, date, time, duration, mode, radar dir, tag
        assert!(parts[0].ends_with("nexrad_fetch"));
        assert_eq!(parts[1], "KTLX");
        assert_eq!(parts[2], "2023-06-07");
        assert_eq!(parts[3], "21:45");
        assert_eq!(parts[4], "30");
        assert_eq!(parts[5], "true");
        assert_eq!(*parts.last().unwrap(), "tsession");
    }

    #[test]
    fn missing_executable_fails_validation() {
        let dir = tempdir().unwrap();
        let mut ctx = testutil::single_site_context(&dir);
        ctx.settings.executables.nexrad_fetch = "  ".into();
        assert!(DownloadStage::new().validate_input(&ctx).is_err());
    }

    #[cfg(unix)]
    mod collaborator {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        fn install_script(dir: &Path, name: &str, body: &str) -> String {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path.display().to_string()
        }

        #[test]
        fn inventory_is_persisted_and_recorded() {
            let dir = tempdir().unwrap();
            let mut ctx = testutil::single_site_context(&dir);
            ctx.settings.executables.nexrad_fetch = install_script(
                dir.path(),
                "nexrad_fetch",
                r#"echo '{"KTLX20230607_214500_V06": "s3://bucket/a"}'"#,
            );

            let stage = DownloadStage::new();
            let mut state = RunState::new(&ctx.session);
            let outcome = stage.execute(&ctx, &mut state).unwrap();

            assert_eq!(outcome, StageOutcome::Completed);
            assert_eq!(state.expected_file_count(), 1);
            let saved = std::fs::read_to_string(ctx.paths.inventory_file()).unwrap();
            assert!(saved.contains("KTLX20230607_214500_V06"));
            assert!(ctx.paths.links_page().exists());
        }

        #[test]
        fn signal_derived_exit_code_is_cancellation() {
            let dir = tempdir().unwrap();
            let mut ctx = testutil::single_site_context(&dir);
            ctx.settings.executables.nexrad_fetch =
                install_script(dir.path(), "nexrad_fetch", "exit 15");

            let stage = DownloadStage::new();
            let mut state = RunState::new(&ctx.session);
            let err = stage.execute(&ctx, &mut state).unwrap_err();
            assert!(err.is_cancellation());
        }

        #[test]
        fn ordinary_failure_is_a_command_failure() {
            let dir = tempdir().unwrap();
            let mut ctx = testutil::single_site_context(&dir);
            ctx.settings.executables.nexrad_fetch =
                install_script(dir.path(), "nexrad_fetch", "echo 'bucket offline' >&2; exit 3");

            let stage = DownloadStage::new();
            let mut state = RunState::new(&ctx.session);
            let err = stage.execute(&ctx, &mut state).unwrap_err();
            assert!(matches!(err, StageError::CommandFailed { exit_code: 3, .. }));
        }
    }
}
