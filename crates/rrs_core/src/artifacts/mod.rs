//! Derived artifacts shared by the pipeline and the playback engine:
//! polling lists, generated pages, and radar filename handling.

pub mod dir_list;
pub mod hodo_page;
pub mod links_page;

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Transposed radar file ready for polling, e.g. `KGRR20230607_214500`.
pub static POLLING_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.{4}\d{8}_\d{6}$").unwrap());

/// Raw downloaded radar file, e.g. `KTLX20230607_214500_V06` or a
/// gzipped archive-era file.
pub static RAW_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.{4}\d{8}_\d{6}(_V\d{2}|\.gz)$").unwrap());

/// Embedded `YYYYMMDD_HHMMSS` timestamp in any artifact filename.
static NAME_TS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{8}_\d{6}").unwrap());

/// Parse the timestamp embedded in an artifact filename.
///
/// Returns `None` when the name carries no well-formed timestamp.
pub fn timestamp_from_name(name: &str) -> Option<DateTime<Utc>> {
    let raw = NAME_TS_RE.find(name)?.as_str();
    let naive = NaiveDateTime::parse_from_str(raw, "%Y%m%d_%H%M%S").ok()?;
    Some(naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn polling_filename_matches() {
        assert!(POLLING_FILE_RE.is_match("KGRR20230607_214500"));
        assert!(!POLLING_FILE_RE.is_match("KGRR20230607_214500_V06"));
        assert!(!POLLING_FILE_RE.is_match("dir.list"));
    }

    #[test]
    fn raw_filename_matches() {
        assert!(RAW_FILE_RE.is_match("KTLX20230607_214500_V06"));
        assert!(RAW_FILE_RE.is_match("KTLX20230607_214500.gz"));
        assert!(!RAW_FILE_RE.is_match("KTLX20230607_214500"));
        assert!(!RAW_FILE_RE.is_match("KTLX20230607_214500.uncompressed"));
    }

    #[test]
    fn timestamp_parses_from_name() {
        let ts = timestamp_from_name("KGRR20230607_214500").unwrap();
        assert_eq!(ts.hour(), 21);
        assert_eq!(ts.minute(), 45);
        assert!(timestamp_from_name("grlevel2.cfg").is_none());
        assert!(timestamp_from_name("KGRR_hodo_20230607_215000.png").is_some());
    }
}
