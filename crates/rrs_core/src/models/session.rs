//! Session identity and well-known filesystem layout.
//!
//! Every simulation session owns an isolated directory tree so multiple
//! sessions can run side by side. All path knowledge lives here; the
//! rest of the crate asks `SessionPaths` instead of joining strings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Unique session identifier.
///
/// Doubles as the run-correlation tag: it is appended to every external
/// stage invocation so the monitor can attribute processes to this run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All directories and well-known files for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPaths {
    /// Application base directory.
    pub base_dir: PathBuf,
    /// Per-session scratch data (radar downloads, model data, logs).
    pub data_dir: PathBuf,
    /// Per-session served assets (polling tree, placefiles, pages).
    pub assets_dir: PathBuf,
}

impl SessionPaths {
    /// Build the layout for a session rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, session: &SessionId) -> Self {
        let base_dir = base_dir.into();
        let data_dir = base_dir.join("data").join(session.as_str());
        let assets_dir = base_dir.join("assets").join(session.as_str());
        Self {
            base_dir,
            data_dir,
            assets_dir,
        }
    }

    /// Radar data root (per-site download subdirectories live below it).
    pub fn radar_dir(&self) -> PathBuf {
        self.data_dir.join("radar")
    }

    /// Download directory for one site's raw files.
    pub fn site_download_dir(&self, site: &str) -> PathBuf {
        self.radar_dir().join(site.to_uppercase()).join("downloads")
    }

    /// Root of the tree polled by display clients.
    pub fn polling_dir(&self) -> PathBuf {
        self.assets_dir.join("polling")
    }

    /// Polling directory for one site.
    pub fn site_polling_dir(&self, site: &str) -> PathBuf {
        self.polling_dir().join(site.to_uppercase())
    }

    /// Directory holding canonical and shifted placefiles.
    pub fn placefiles_dir(&self) -> PathBuf {
        self.assets_dir.join("placefiles")
    }

    /// Directory holding rendered hodograph images.
    pub fn hodographs_dir(&self) -> PathBuf {
        self.assets_dir.join("hodographs")
    }

    /// Directory holding downloaded model data.
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("model_data")
    }

    /// Directory holding downloaded probability products.
    pub fn probsevere_dir(&self) -> PathBuf {
        self.data_dir.join("probsevere")
    }

    /// Directory for user-retrievable bundles.
    pub fn user_downloads_dir(&self) -> PathBuf {
        self.assets_dir.join("downloads")
    }

    /// Directory for session log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Durable run-status marker file.
    pub fn status_file(&self) -> PathBuf {
        self.data_dir.join("script_status.txt")
    }

    /// Completion marker file; presence means the prior run finished.
    pub fn completion_marker(&self) -> PathBuf {
        self.data_dir.join("run_complete")
    }

    /// Pre-flight inventory of expected radar files.
    pub fn inventory_file(&self) -> PathBuf {
        self.radar_dir().join("radarinfo.json")
    }

    /// Bundle of original (raw) radar files.
    pub fn radar_bundle(&self) -> PathBuf {
        self.user_downloads_dir().join("original_radar_files.zip")
    }

    /// Bundle of original (unshifted) placefiles.
    pub fn placefile_bundle(&self) -> PathBuf {
        self.user_downloads_dir().join("original_placefiles.zip")
    }

    /// Rendered hodograph page.
    pub fn hodograph_page(&self) -> PathBuf {
        self.assets_dir.join("hodographs.html")
    }

    /// Links page for polling and download endpoints.
    pub fn links_page(&self) -> PathBuf {
        self.assets_dir.join("links.html")
    }

    /// Events summary page written by the metadata stage.
    pub fn events_page(&self) -> PathBuf {
        self.assets_dir.join("events.html")
    }

    /// Events reference text file written by the metadata stage.
    pub fn events_file(&self) -> PathBuf {
        self.data_dir.join("events.txt")
    }

    /// Poller configuration file inside the polling tree.
    pub fn polling_config(&self) -> PathBuf {
        self.polling_dir().join("grlevel2.cfg")
    }

    /// Source poller configuration file at the application base.
    pub fn polling_config_source(&self) -> PathBuf {
        self.base_dir.join("grlevel2.cfg")
    }

    /// Directories that must exist before a run starts.
    pub fn run_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.radar_dir(),
            self.polling_dir(),
            self.placefiles_dir(),
            self.hodographs_dir(),
            self.model_dir(),
            self.probsevere_dir(),
            self.user_downloads_dir(),
            self.log_dir(),
        ]
    }

    /// Create every run directory.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in self.run_dirs() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Filenames preserved by the pre-run cleanup sweep.
pub(crate) fn is_protected_file(name: &str) -> bool {
    matches!(name, "grlevel2.cfg" | "events.txt")
}

/// Remove prior-run files below `dir`, keeping protected filenames.
///
/// Empty subdirectories are removed bottom-up. Missing directories are
/// fine; concurrent deletion is tolerated.
pub(crate) fn sweep_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else {
            let keep = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(is_protected_file)
                .unwrap_or(false);
            if !keep {
                let _ = std::fs::remove_file(&path);
            }
        }
    }
    for sub in subdirs {
        sweep_dir(&sub)?;
        let _ = std::fs::remove_dir(&sub);
    }
    Ok(())
}
