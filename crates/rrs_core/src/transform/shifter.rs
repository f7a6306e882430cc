//! Placefile shifting driver.
//!
//! Applies the temporal shift and optional spatial relocation to every
//! canonical placefile in a directory, writing `<name>_shifted.txt`
//! alongside each source. Failures are isolated per artifact: a file
//! that cannot be processed gets a single diagnostic line instead of
//! partial output, and the remaining files are unaffected.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::geodesy::{self, LatLon};
use super::timecodes;

/// First decimal-degree `lat, lon` pair on a line.
static LAT_LON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}\.\d+), ?(-?\d{1,3}\.\d+)").unwrap());

/// Parameters for one shifting pass.
///
/// Spatial relocation only happens when both the origin and the
/// destination site coordinates are known.
#[derive(Debug, Clone, Copy)]
pub struct ShiftSpec {
    /// Signed temporal shift in whole seconds.
    pub shift_seconds: i64,
    /// Coordinates of the original site.
    pub origin: Option<LatLon>,
    /// Coordinates of the transpose-target site.
    pub destination: Option<LatLon>,
}

impl ShiftSpec {
    /// Temporal-only spec.
    pub fn time_only(shift_seconds: i64) -> Self {
        Self {
            shift_seconds,
            origin: None,
            destination: None,
        }
    }

    /// The origin/destination pair, when relocation applies.
    pub fn relocation(&self) -> Option<(LatLon, LatLon)> {
        match (self.origin, self.destination) {
            (Some(origin), Some(destination)) => Some((origin, destination)),
            _ => None,
        }
    }
}

/// Shift a single line in time and, when configured, space.
pub fn shift_line(line: &str, spec: &ShiftSpec) -> String {
    let mut out = timecodes::shift_timestamps(line, spec.shift_seconds)
        .unwrap_or_else(|| line.to_string());

    if let Some((origin, destination)) = spec.relocation() {
        if let Some(caps) = LAT_LON_RE.captures(&out) {
            let range = caps.get(0).map(|m| m.range());
            let lat = caps[1].parse::<f64>();
            let lon = caps[2].parse::<f64>();
            if let (Some(range), Ok(lat), Ok(lon)) = (range, lat, lon) {
                let moved = geodesy::relocate(LatLon::new(lat, lon), origin, destination);
                // Full floating-point precision, no rounding.
                let replacement = format!("{}, {}", moved.lat, moved.lon);
                out.replace_range(range, &replacement);
            }
        }
    }

    out
}

/// Shift a whole artifact, pure with respect to the input lines.
pub fn shift_lines<'a, I>(lines: I, spec: &ShiftSpec) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().map(|line| shift_line(line, spec)).collect()
}

/// Derived-artifact path for a canonical placefile.
pub fn shifted_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    source.with_file_name(format!("{}_shifted.txt", stem))
}

fn is_derived(name: &str) -> bool {
    name.contains("shifted") || name.contains("updated")
}

/// Regenerate the derived form of every canonical placefile in `dir`.
///
/// Returns the number of artifacts processed. A per-artifact failure
/// truncates that artifact's output to a single diagnostic line and
/// moves on.
pub fn shift_placefiles(dir: &Path, spec: &ShiftSpec) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot scan placefile dir {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut processed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if !name.ends_with(".txt") || is_derived(name) {
            continue;
        }

        let out_path = shifted_path(&path);
        match shift_one(&path, &out_path, spec) {
            Ok(()) => processed += 1,
            Err(e) => {
                tracing::error!("failed to shift {}: {}", path.display(), e);
                let diagnostic = format!("Errors shifting this placefile: {}", e);
                if let Err(e) = std::fs::write(&out_path, diagnostic) {
                    tracing::error!(
                        "failed to write diagnostic for {}: {}",
                        out_path.display(),
                        e
                    );
                }
                processed += 1;
            }
        }
    }
    processed
}

fn shift_one(source: &Path, out_path: &Path, spec: &ShiftSpec) -> std::io::Result<()> {
    let content = std::fs::read_to_string(source)?;
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        out.push_str(&shift_line(line, spec));
        out.push('\n');
    }
    std::fs::write(out_path, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const KTLX: LatLon = LatLon {
        lat: 35.3331,
        lon: -97.2778,
    };
    const KGRR: LatLon = LatLon {
        lat: 42.8939,
        lon: -85.5449,
    };

    fn relocating_spec(shift: i64) -> ShiftSpec {
        ShiftSpec {
            shift_seconds: shift,
            origin: Some(KTLX),
            destination: Some(KGRR),
        }
    }

    #[test]
    fn line_without_coordinates_only_shifts_time() {
        let spec = relocating_spec(7200);
        let out = shift_line("Valid: 21:45Z Wed Jun 07 2023", &spec);
        assert_eq!(out, "Valid: 23:45Z Wed Jun 07 2023");
    }

    #[test]
    fn coordinates_are_relocated_in_place() {
        let spec = relocating_spec(0);
        let out = shift_line("Object: 35.5021, -97.0133", &spec);
        assert!(out.starts_with("Object: "));
        assert_ne!(out, "Object: 35.5021, -97.0133");
        // The new pair parses back and sits near the destination site.
        let caps = LAT_LON_RE.captures(&out).unwrap();
        let lat: f64 = caps[1].parse().unwrap();
        assert!((lat - KGRR.lat).abs() < 2.0);
    }

    #[test]
    fn no_relocation_without_both_sites() {
        let spec = ShiftSpec {
            shift_seconds: 0,
            origin: Some(KTLX),
            destination: None,
        };
        let line = "Object: 35.5021, -97.0133";
        assert_eq!(shift_line(line, &spec), line);
    }

    #[test]
    fn shifting_is_idempotent_over_the_canonical_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("warnings.txt");
        std::fs::write(
            &source,
            "Title: test\nValid: 21:45Z Wed Jun 07 2023\nObject: 35.5021, -97.0133\n",
        )
        .unwrap();

        let spec = relocating_spec(7200);
        shift_placefiles(dir.path(), &spec);
        let first = std::fs::read_to_string(shifted_path(&source)).unwrap();
        shift_placefiles(dir.path(), &spec);
        let second = std::fs::read_to_string(shifted_path(&source)).unwrap();

        assert_eq!(first, second);
        // Canonical source untouched.
        let canonical = std::fs::read_to_string(&source).unwrap();
        assert!(canonical.contains("21:45Z"));
    }

    #[test]
    fn derived_files_are_not_reprocessed() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Valid: 21:45Z Wed Jun 07 2023\n").unwrap();
        std::fs::write(dir.path().join("a_shifted.txt"), "old\n").unwrap();
        std::fs::write(dir.path().join("b_updated.txt"), "old\n").unwrap();

        let count = shift_placefiles(dir.path(), &ShiftSpec::time_only(60));
        assert_eq!(count, 1);
        // No a_shifted_shifted.txt was produced.
        assert!(!dir.path().join("a_shifted_shifted.txt").exists());
    }

    #[test]
    fn unreadable_artifact_gets_diagnostic_and_others_survive() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "Valid: 21:45Z Wed Jun 07 2023\n").unwrap();
        // A directory with a .txt name forces a read error for that entry.
        std::fs::create_dir(dir.path().join("bad.txt")).unwrap();

        shift_placefiles(dir.path(), &ShiftSpec::time_only(7200));

        let shifted = std::fs::read_to_string(shifted_path(&good)).unwrap();
        assert!(shifted.contains("23:45Z"));
        let diagnostic =
            std::fs::read_to_string(dir.path().join("bad_shifted.txt")).unwrap();
        assert!(diagnostic.starts_with("Errors shifting this placefile:"));
    }

    #[test]
    fn shift_lines_is_pure() {
        let lines = vec!["Valid: 21:45Z Wed Jun 07 2023", "plain text"];
        let out = shift_lines(lines.clone(), &ShiftSpec::time_only(7200));
        assert_eq!(out[0], "Valid: 23:45Z Wed Jun 07 2023");
        assert_eq!(out[1], "plain text");
        assert_eq!(lines[0], "Valid: 21:45Z Wed Jun 07 2023");
    }
}
