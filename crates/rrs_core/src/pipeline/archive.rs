//! Completion bundles.
//!
//! On full completion the originally downloaded raw radar files and the
//! original (unshifted) placefiles are archived into two independent
//! retrievable zip bundles at well-known paths. Consumers treat a size
//! above a minimal empty-archive threshold as "ready".

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::artifacts::RAW_FILE_RE;

use super::errors::{StageError, StageResult};

/// Bundle every raw radar file below `radar_dir` into `bundle_path`.
///
/// Returns the number of files archived.
pub fn bundle_raw_radar(radar_dir: &Path, bundle_path: &Path) -> StageResult<usize> {
    let files = collect_files(radar_dir, |name| RAW_FILE_RE.is_match(name))
        .map_err(|e| StageError::io_error("scanning radar files", e))?;
    write_bundle(bundle_path, &files)
}

/// Bundle every canonical placefile in `placefiles_dir` into
/// `bundle_path`, excluding derived (`shifted`/`updated`) outputs.
pub fn bundle_original_placefiles(
    placefiles_dir: &Path,
    bundle_path: &Path,
) -> StageResult<usize> {
    let files = collect_files(placefiles_dir, |name| {
        name.ends_with(".txt") && !name.contains("shifted") && !name.contains("updated")
    })
    .map_err(|e| StageError::io_error("scanning placefiles", e))?;
    write_bundle(bundle_path, &files)
}

/// Recursively collect files whose name passes the filter.
fn collect_files(
    root: &Path,
    filter: impl Fn(&str) -> bool + Copy,
) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !root.is_dir() {
        return Ok(found);
    }
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if filter(name) {
                    found.push(path);
                }
            }
        }
    }
    found.sort();
    Ok(found)
}

fn write_bundle(bundle_path: &Path, files: &[PathBuf]) -> StageResult<usize> {
    if let Some(parent) = bundle_path.parent() {
        fs::create_dir_all(parent).map_err(|e| StageError::io_error("creating bundle dir", e))?;
    }
    let file = File::create(bundle_path)
        .map_err(|e| StageError::io_error("creating bundle", e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let mut archived = 0;
    for path in files {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        zip.start_file(name, options)?;
        let mut source = File::open(path)
            .map_err(|e| StageError::io_error(format!("opening {}", path.display()), e))?;
        io::copy(&mut source, &mut zip)
            .map_err(|e| StageError::io_error(format!("archiving {}", path.display()), e))?;
        archived += 1;
    }
    zip.finish()?;

    tracing::info!(
        "archived {} files into {}",
        archived,
        bundle_path.display()
    );
    Ok(archived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn raw_bundle_only_includes_raw_files() {
        let dir = tempdir().unwrap();
        let downloads = dir.path().join("KTLX").join("downloads");
        fs::create_dir_all(&downloads).unwrap();
        fs::write(downloads.join("KTLX20230607_214500_V06"), b"raw").unwrap();
        fs::write(downloads.join("KTLX20230607_215000.gz"), b"gz").unwrap();
        fs::write(downloads.join("KTLX20230607_214500"), b"munged").unwrap();
        fs::write(downloads.join("notes.uncompressed"), b"tmp").unwrap();

        let bundle = dir.path().join("bundles").join("original_radar_files.zip");
        let count = bundle_raw_radar(dir.path(), &bundle).unwrap();
        assert_eq!(count, 2);
        assert!(bundle.exists());
        // More than an empty archive.
        assert!(fs::metadata(&bundle).unwrap().len() > 22);
    }

    #[test]
    fn placefile_bundle_excludes_derived_outputs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("warnings.txt"), b"canonical").unwrap();
        fs::write(dir.path().join("warnings_shifted.txt"), b"derived").unwrap();
        fs::write(dir.path().join("obs_updated.txt"), b"derived").unwrap();

        let bundle = dir.path().join("original_placefiles.zip");
        let count = bundle_original_placefiles(dir.path(), &bundle).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn missing_source_dir_yields_empty_bundle() {
        let dir = tempdir().unwrap();
        let bundle = dir.path().join("empty.zip");
        let count = bundle_raw_radar(&dir.path().join("nope"), &bundle).unwrap();
        assert_eq!(count, 0);
        assert!(bundle.exists());
    }
}
