//! Pipeline coordinator for producing simulation artifacts.
//!
//! A run executes ordered, selectable stages as external collaborator
//! invocations on a single control thread, propagating cooperative
//! cancellation and persisting a durable run-status marker across
//! every transition.
//!
//! ```text
//! Coordinator
//!     ├── Stage: Download        (optional)
//!     ├── Stage: Transpose       (optional)
//!     ├── Stage: FastPlacefiles  (optional)
//!     ├── Stage: Metadata        (always)
//!     ├── Stage: ModelPlacefiles (optional)
//!     └── Stage: Hodographs      (optional)
//! ```

mod archive;
mod cancel;
mod context;
mod errors;
mod invoke;
mod runner;
mod stage;
pub mod stages;
mod status;

pub use archive::{bundle_original_placefiles, bundle_raw_radar};
pub use cancel::CancelToken;
pub use context::{
    DownloadOutput, HodographsOutput, MetadataOutput, ModelOutput, PlacefilesOutput,
    ProgressCallback, RunContext, RunState, TransposeOutput,
};
pub use errors::{PipelineError, PipelineResult, StageError, StageResult};
pub use invoke::{run_collaborator, StageCommand, StageOutput};
pub use runner::{Coordinator, RunReport};
pub use stage::{PipelineStage, StageKind, StageOutcome};
pub use status::{CompletionMarker, StatusMarker};

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use chrono::TimeZone;
    use tempfile::TempDir;

    use crate::clock::SimulationTimes;
    use crate::config::Settings;
    use crate::logging::{LogConfig, SessionLogger};
    use crate::models::{RadarSelection, SessionId, SessionPaths, SiteCatalog, SiteMeta};

    use super::RunContext;

    pub(crate) fn test_catalog() -> SiteCatalog {
        SiteCatalog::from_sites(vec![
            SiteMeta {
                code: "KGRR".into(),
                lat: 42.8939,
                lon: -85.5449,
                asos_one: "KGRR".into(),
                asos_two: "KAZO".into(),
            },
            SiteMeta {
                code: "KTLX".into(),
                lat: 35.3331,
                lon: -97.2778,
                asos_one: "KOKC".into(),
                asos_two: "KOUN".into(),
            },
        ])
    }

    /// A context with one selected site (KTLX) and no transpose target.
    pub(crate) fn single_site_context(dir: &TempDir) -> RunContext {
        context_with(dir, &["KTLX"], None)
    }

    pub(crate) fn context_with(
        dir: &TempDir,
        sites: &[&str],
        transpose: Option<&str>,
    ) -> RunContext {
        let session = SessionId::new("tsession");
        let paths = SessionPaths::new(dir.path(), &session);
        paths.ensure_dirs().unwrap();
        let times = SimulationTimes::compute_at(
            chrono::Utc.with_ymd_and_hms(2023, 6, 7, 21, 45, 0).unwrap(),
            30,
            chrono::Utc.with_ymd_and_hms(2024, 3, 5, 14, 37, 0).unwrap(),
        );
        let mut selection = RadarSelection::new(sites.len());
        for site in sites {
            selection.push_site(site);
        }
        selection.set_transpose(transpose);
        let logger = Arc::new(
            SessionLogger::new(
                session.as_str(),
                dir.path().join("logs"),
                LogConfig::default(),
                None,
            )
            .unwrap(),
        );
        RunContext::new(
            session,
            paths,
            Settings::default(),
            times,
            selection,
            &test_catalog(),
            logger,
        )
    }
}
