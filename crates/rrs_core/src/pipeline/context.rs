//! Run context and accumulated run state.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::SimulationTimes;
use crate::config::Settings;
use crate::logging::SessionLogger;
use crate::models::{RadarSelection, SessionId, SessionPaths, SiteCatalog, SiteMeta};
use crate::transform::geodesy::LatLon;
use crate::transform::ShiftSpec;

use super::cancel::CancelToken;
use super::stage::StageKind;

/// Progress callback type: (stage_name, percent_complete, message).
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline stages.
///
/// The session-scoped state record: everything a stage needs to run,
/// with no process-wide singletons. Mutable results go in `RunState`.
pub struct RunContext {
    /// Session identifier; doubles as the run-correlation tag.
    pub session: SessionId,
    /// Session directory layout.
    pub paths: SessionPaths,
    /// Application settings.
    pub settings: Settings,
    /// Timing derived for this run.
    pub times: SimulationTimes,
    /// The user's radar selection.
    pub selection: RadarSelection,
    /// Resolved metadata for the selected sites (unknown codes already
    /// dropped).
    pub sites: BTreeMap<String, SiteMeta>,
    /// Resolved transpose-target metadata, when set and known.
    pub transpose: Option<SiteMeta>,
    /// Per-session logger.
    pub logger: Arc<SessionLogger>,
    /// Cancellation token threaded into every stage invocation.
    pub token: CancelToken,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl RunContext {
    /// Build a context, resolving the selection against the catalog.
    pub fn new(
        session: SessionId,
        paths: SessionPaths,
        settings: Settings,
        times: SimulationTimes,
        selection: RadarSelection,
        catalog: &SiteCatalog,
        logger: Arc<SessionLogger>,
    ) -> Self {
        let sites = selection.site_table(catalog);
        let transpose = selection.transpose_meta(catalog);
        Self {
            session,
            paths,
            settings,
            times,
            selection,
            sites,
            transpose,
            logger,
            token: CancelToken::new(),
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback, if one is set.
    pub fn report_progress(&self, stage: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(stage, percent, message);
        }
    }

    /// Whether the given stage runs this time.
    ///
    /// The metadata stage always executes regardless of selection.
    pub fn stage_enabled(&self, kind: StageKind) -> bool {
        let stages = &self.settings.stages;
        match kind {
            StageKind::Download => stages.download,
            StageKind::Transpose => stages.transpose,
            StageKind::FastPlacefiles => stages.fast_placefiles,
            StageKind::ModelPlacefiles => stages.model_placefiles,
            StageKind::Hodographs => stages.hodographs,
            StageKind::Metadata => true,
        }
    }

    /// Destination site for a source site: the transpose target when
    /// one is set, the site itself otherwise.
    pub fn destination_site(&self, site: &str) -> String {
        self.transpose
            .as_ref()
            .map(|t| t.code.clone())
            .unwrap_or_else(|| site.to_uppercase())
    }

    /// Shift parameters for this run's placefiles.
    ///
    /// Spatial relocation applies only when a transpose target is set
    /// and the original site's coordinates are known.
    pub fn shift_spec(&self) -> ShiftSpec {
        let origin = self
            .sites
            .values()
            .next()
            .map(|m| LatLon::new(m.lat, m.lon));
        let destination = self.transpose.as_ref().map(|m| LatLon::new(m.lat, m.lon));
        ShiftSpec {
            shift_seconds: self.times.shift_seconds,
            origin,
            destination,
        }
    }

    /// Coordinates anchoring the run (the first selected site).
    pub fn anchor_coords(&self) -> Option<LatLon> {
        self.sites.values().next().map(|m| LatLon::new(m.lat, m.lon))
    }
}

/// Mutable run state that accumulates results from pipeline stages.
///
/// This is the write-once manifest: each stage records its output in
/// its own section and never overwrites another's.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Session the run belongs to.
    pub session: String,
    /// When the run started (RFC 3339).
    pub started_at: Option<String>,
    /// Download stage results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadOutput>,
    /// Transpose stage results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transpose: Option<TransposeOutput>,
    /// Fast-placefile stage results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placefiles: Option<PlacefilesOutput>,
    /// Model placefile stage results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelOutput>,
    /// Hodograph render stage results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hodographs: Option<HodographsOutput>,
    /// Metadata stage results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataOutput>,
}

impl RunState {
    /// Create a new run state for a session.
    pub fn new(session: &SessionId) -> Self {
        Self {
            session: session.as_str().to_string(),
            started_at: Some(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Whether the pre-flight inventory has been recorded.
    pub fn has_inventory(&self) -> bool {
        self.download.is_some()
    }

    /// Expected raw file count from the pre-flight inventory.
    pub fn expected_file_count(&self) -> usize {
        self.download
            .as_ref()
            .map(|d| d.expected_files.len())
            .unwrap_or(0)
    }
}

/// Output from the download stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadOutput {
    /// Pre-flight inventory: expected filename -> source location.
    pub expected_files: BTreeMap<String, String>,
}

/// Output from the transpose stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransposeOutput {
    /// Destination sites whose polling trees were initialized.
    pub polling_sites: Vec<String>,
}

/// Output from the fast-placefile stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacefilesOutput {
    /// Generator tasks that ran, in order.
    pub generators: Vec<String>,
}

/// Output from the model placefile stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Result line reported by the collaborator.
    pub summary: String,
}

/// Output from the hodograph render stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HodographsOutput {
    /// Sites rendered.
    pub rendered_sites: Vec<String>,
    /// Images listed on the regenerated page.
    pub page_images: usize,
}

/// Output from the metadata stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataOutput {
    /// Events page written by the collaborator.
    pub events_page: PathBuf,
}
