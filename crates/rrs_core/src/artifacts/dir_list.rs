//! Polling list (`dir.list`) generation.
//!
//! Display clients poll a per-site `dir.list` naming the radar files
//! they may fetch. During playback the list is regenerated on every
//! tick so only files at or before the virtual clock are visible.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::{timestamp_from_name, POLLING_FILE_RE};

/// Name of the polling list file inside each site directory.
pub const DIR_LIST_NAME: &str = "dir.list";

/// Regenerate a site's `dir.list`.
///
/// With `clock == None` every polling file is listed (used right after
/// the transpose stage so clients have data while later stages run).
/// With a clock, only files stamped at or before it are listed.
///
/// The list is written atomically so a concurrent poll never sees a
/// torn file. Returns the number of files listed.
pub fn write_dir_list(
    site_dir: &Path,
    clock: Option<DateTime<Utc>>,
) -> std::io::Result<usize> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(site_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(n) => n,
            None => continue,
        };
        if !POLLING_FILE_RE.is_match(name) {
            continue;
        }
        if let Some(limit) = clock {
            match timestamp_from_name(name) {
                Some(ts) if ts <= limit => {}
                _ => continue,
            }
        }
        // A file still being written just undercounts its size; the
        // next regeneration picks up the final value.
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        entries.push((name.to_string(), size));
    }
    entries.sort();

    let list_path = site_dir.join(DIR_LIST_NAME);
    let tmp_path = site_dir.join(format!("{}.tmp", DIR_LIST_NAME));
    {
        let mut file = fs::File::create(&tmp_path)?;
        for (name, size) in &entries {
            writeln!(file, "{} {}", size, name)?;
        }
    }
    fs::rename(&tmp_path, &list_path)?;

    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, bytes: &[u8]) {
        fs::write(dir.join(name), bytes).unwrap();
    }

    #[test]
    fn lists_all_files_when_uninitialized() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "KGRR20230607_214500", b"aaaa");
        touch(dir.path(), "KGRR20230607_215000", b"bb");
        touch(dir.path(), "grlevel2.cfg", b"cfg");

        let count = write_dir_list(dir.path(), None).unwrap();
        assert_eq!(count, 2);

        let list = fs::read_to_string(dir.path().join(DIR_LIST_NAME)).unwrap();
        assert!(list.contains("4 KGRR20230607_214500"));
        assert!(list.contains("2 KGRR20230607_215000"));
        assert!(!list.contains("grlevel2.cfg"));
    }

    #[test]
    fn clock_filters_future_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "KGRR20230607_214500", b"a");
        touch(dir.path(), "KGRR20230607_220000", b"b");

        let clock = Utc.with_ymd_and_hms(2023, 6, 7, 21, 50, 0).unwrap();
        let count = write_dir_list(dir.path(), Some(clock)).unwrap();
        assert_eq!(count, 1);

        let list = fs::read_to_string(dir.path().join(DIR_LIST_NAME)).unwrap();
        assert!(list.contains("KGRR20230607_214500"));
        assert!(!list.contains("KGRR20230607_220000"));
    }

    #[test]
    fn regeneration_replaces_previous_list() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "KGRR20230607_214500", b"a");
        write_dir_list(dir.path(), None).unwrap();
        touch(dir.path(), "KGRR20230607_215000", b"b");
        write_dir_list(dir.path(), None).unwrap();

        let list = fs::read_to_string(dir.path().join(DIR_LIST_NAME)).unwrap();
        assert_eq!(list.lines().count(), 2);
        assert!(!dir.path().join("dir.list.tmp").exists());
    }
}
