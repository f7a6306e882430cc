//! Progress estimation from filesystem outputs.
//!
//! Ratios are computed against the pre-flight inventory written before
//! any downloads begin. Scans tolerate concurrently written files:
//! partial files simply undercount until their writer finishes.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::artifacts::{POLLING_FILE_RE, RAW_FILE_RE};
use crate::config::Settings;
use crate::models::{SessionId, SessionPaths};
use crate::pipeline::StatusMarker;

use super::processes::{scan_stage_processes, StageProcess};

/// Auxiliary artifacts reported as a literal found/expected pair.
const EXPECTED_SURFACE_PLACEFILES: &[&str] = &[
    "storm_reports.txt",
    "surface_observations.txt",
    "probsevere.txt",
];

/// A literal "(found/expected)" pair, not a percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FoundExpected {
    pub found: usize,
    pub expected: usize,
}

impl std::fmt::Display for FoundExpected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} files found", self.found, self.expected)
    }
}

/// One progress sample.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    /// When the sample was taken.
    pub sampled_at: DateTime<Utc>,
    /// Stage processes currently running for this run.
    pub active_stages: Vec<StageProcess>,
    /// Download completion, percent.
    pub download_percent: f64,
    /// Transform completion, percent.
    pub transform_percent: f64,
    /// Surface placefile availability.
    pub surface_placefiles: FoundExpected,
    /// Rendered-image completion, percent (two renders per input).
    pub render_percent: f64,
    /// Model files present.
    pub model_files: Vec<String>,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            sampled_at: Utc::now(),
            active_stages: Vec::new(),
            download_percent: 0.0,
            transform_percent: 0.0,
            surface_placefiles: FoundExpected::default(),
            render_percent: 0.0,
            model_files: Vec::new(),
        }
    }
}

/// Session-scoped progress monitor.
pub struct ProgressMonitor {
    paths: SessionPaths,
    tag: SessionId,
    allow_list: Vec<String>,
    last: Mutex<ProgressSnapshot>,
}

impl ProgressMonitor {
    /// Build a monitor for one session.
    ///
    /// The process allow-list is derived from the configured stage
    /// executables.
    pub fn new(paths: SessionPaths, tag: SessionId, settings: &Settings) -> Self {
        let exes = &settings.executables;
        let allow_list = [
            &exes.nexrad_fetch,
            &exes.radar_munge,
            &exes.reports_placefile,
            &exes.obs_placefile,
            &exes.probsevere_fetch,
            &exes.probsevere_placefile,
            &exes.model_placefile,
            &exes.event_times,
            &exes.hodo_render,
        ]
        .iter()
        .map(|path| {
            path.rsplit('/')
                .next()
                .unwrap_or(path.as_str())
                .to_string()
        })
        .collect();

        Self {
            paths,
            tag,
            allow_list,
            last: Mutex::new(ProgressSnapshot::default()),
        }
    }

    /// Take a progress sample.
    ///
    /// When the durable status marker says the run is inactive, the
    /// last cached snapshot is returned without re-scanning.
    pub fn sample(&self) -> ProgressSnapshot {
        let active = StatusMarker::new(self.paths.status_file())
            .read()
            .map(|status| status.is_active())
            .unwrap_or(false);
        if !active {
            return self.last.lock().clone();
        }

        let snapshot = self.scan();
        *self.last.lock() = snapshot.clone();
        snapshot
    }

    fn scan(&self) -> ProgressSnapshot {
        let expected = self.expected_file_count();

        let downloaded = count_files(&self.paths.radar_dir(), |name| RAW_FILE_RE.is_match(name));
        let transformed =
            count_files(&self.paths.polling_dir(), |name| POLLING_FILE_RE.is_match(name));
        let rendered = count_files(&self.paths.hodographs_dir(), |name| name.ends_with(".png"));

        let placefiles_dir = self.paths.placefiles_dir();
        let found = EXPECTED_SURFACE_PLACEFILES
            .iter()
            .filter(|name| placefiles_dir.join(name).is_file())
            .count();

        let mut model_files: Vec<String> = Vec::new();
        if let Ok(entries) = std::fs::read_dir(self.paths.model_dir()) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    model_files.push(name.to_string());
                }
            }
        }
        model_files.sort();

        ProgressSnapshot {
            sampled_at: Utc::now(),
            active_stages: scan_stage_processes(self.tag.as_str(), &self.allow_list),
            download_percent: percent(downloaded, expected),
            transform_percent: percent(transformed, expected),
            surface_placefiles: FoundExpected {
                found,
                expected: EXPECTED_SURFACE_PLACEFILES.len(),
            },
            render_percent: percent(rendered, 2 * expected),
            model_files,
        }
    }

    /// Expected-file count from the pre-flight inventory; zero when
    /// the inventory is missing or unreadable.
    fn expected_file_count(&self) -> usize {
        std::fs::read_to_string(self.paths.inventory_file())
            .ok()
            .and_then(|content| {
                serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&content).ok()
            })
            .map(|map| map.len())
            .unwrap_or(0)
    }
}

/// Percentage with a zero-denominator guard, capped at 100.
fn percent(count: usize, expected: usize) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    (100.0 * count as f64 / expected as f64).min(100.0)
}

/// Recursively count files whose name passes the filter. Unreadable
/// entries are skipped, never fatal.
fn count_files(root: &Path, filter: impl Fn(&str) -> bool + Copy) -> usize {
    let mut count = 0;
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if filter(name) {
                    count += 1;
                }
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStatus;
    use tempfile::{tempdir, TempDir};

    fn setup(dir: &TempDir) -> (ProgressMonitor, SessionPaths) {
        let session = SessionId::new("mon-test");
        let paths = SessionPaths::new(dir.path(), &session);
        paths.ensure_dirs().unwrap();
        let monitor = ProgressMonitor::new(paths.clone(), session, &Settings::default());
        (monitor, paths)
    }

    fn write_inventory(paths: &SessionPaths, names: &[&str]) {
        let map: std::collections::BTreeMap<&str, &str> =
            names.iter().map(|n| (*n, "s3://bucket/x")).collect();
        std::fs::write(
            paths.inventory_file(),
            serde_json::to_string(&map).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn zero_expected_files_is_zero_percent() {
        // Scenario E: no divide-by-zero.
        let dir = tempdir().unwrap();
        let (monitor, paths) = setup(&dir);
        StatusMarker::new(paths.status_file())
            .write(RunStatus::Running)
            .unwrap();

        let snapshot = monitor.sample();
        assert_eq!(snapshot.download_percent, 0.0);
        assert_eq!(snapshot.transform_percent, 0.0);
        assert_eq!(snapshot.render_percent, 0.0);
    }

    #[test]
    fn ratios_follow_the_inventory_denominator() {
        let dir = tempdir().unwrap();
        let (monitor, paths) = setup(&dir);
        StatusMarker::new(paths.status_file())
            .write(RunStatus::Running)
            .unwrap();
        write_inventory(
            &paths,
            &[
                "KTLX20230607_214500_V06",
                "KTLX20230607_215000_V06",
                "KTLX20230607_215500_V06",
                "KTLX20230607_220000_V06",
            ],
        );

        let downloads = paths.site_download_dir("KTLX");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::write(downloads.join("KTLX20230607_214500_V06"), b"raw").unwrap();
        std::fs::write(downloads.join("KTLX20230607_215000_V06"), b"raw").unwrap();

        let polling = paths.site_polling_dir("KTLX");
        std::fs::create_dir_all(&polling).unwrap();
        std::fs::write(polling.join("KTLX20230607_214500"), b"out").unwrap();

        std::fs::write(
            paths.hodographs_dir().join("KTLX_hodo_20230607_214500.png"),
            b"png",
        )
        .unwrap();
        std::fs::write(
            paths.hodographs_dir().join("KTLX_storm_20230607_214500.png"),
            b"png",
        )
        .unwrap();

        std::fs::write(paths.placefiles_dir().join("probsevere.txt"), b"pf").unwrap();

        let snapshot = monitor.sample();
        assert_eq!(snapshot.download_percent, 50.0);
        assert_eq!(snapshot.transform_percent, 25.0);
        // 2 renders of 2*4 expected.
        assert_eq!(snapshot.render_percent, 25.0);
        assert_eq!(snapshot.surface_placefiles.found, 1);
        assert_eq!(snapshot.surface_placefiles.expected, 3);
        assert_eq!(
            snapshot.surface_placefiles.to_string(),
            "1/3 files found"
        );
    }

    #[test]
    fn inactive_run_returns_cached_snapshot_without_rescan() {
        let dir = tempdir().unwrap();
        let (monitor, paths) = setup(&dir);
        let marker = StatusMarker::new(paths.status_file());
        marker.write(RunStatus::Running).unwrap();
        write_inventory(&paths, &["KTLX20230607_214500_V06"]);

        let downloads = paths.site_download_dir("KTLX");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::write(downloads.join("KTLX20230607_214500_V06"), b"raw").unwrap();

        let active_snapshot = monitor.sample();
        assert_eq!(active_snapshot.download_percent, 100.0);

        // Run ends; new files must not change the sampled value.
        marker.write(RunStatus::Completed).unwrap();
        std::fs::remove_file(downloads.join("KTLX20230607_214500_V06")).unwrap();

        let cached = monitor.sample();
        assert_eq!(cached.download_percent, 100.0);
        assert_eq!(cached.sampled_at, active_snapshot.sampled_at);
    }

    #[test]
    fn missing_marker_means_inactive() {
        let dir = tempdir().unwrap();
        let (monitor, _paths) = setup(&dir);
        let snapshot = monitor.sample();
        assert_eq!(snapshot.download_percent, 0.0);
    }

    #[test]
    fn percent_caps_at_one_hundred() {
        assert_eq!(percent(5, 2), 100.0);
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
