//! Timestamp rewriting for placefile lines.
//!
//! Three textual encodings are recognized, matched independently per
//! line, with only the timestamp substring replaced:
//!
//! 1. `Valid: HH:MMZ Dow Mon DD YYYY`
//! 2. `TimeRange:` followed by a pair of ISO-8601 timestamps
//! 3. any other `Time` marker followed by a single ISO-8601 timestamp
//!
//! A line with no recognizable (or parseable) timestamp is left alone;
//! malformed timestamps never fail the whole artifact.

use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Format of the `Valid:` header timestamp.
pub const VALID_FORMAT: &str = "%H:%MZ %a %b %d %Y";

/// Format of ISO-8601 timestamps in `TimeRange:`/`Time:` lines.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static ISO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z").unwrap()
});

/// Shift every recognized timestamp in `line` by `shift_seconds`.
///
/// Returns `None` when the line was not modified.
pub fn shift_timestamps(line: &str, shift_seconds: i64) -> Option<String> {
    let mut current = line.to_string();
    let mut touched = false;

    if current.contains("Valid:") {
        if let Some(next) = shift_valid(&current, shift_seconds) {
            current = next;
            touched = true;
        }
    }

    if current.contains("TimeRange") {
        if let Some(next) = shift_time_range(&current, shift_seconds) {
            current = next;
            touched = true;
        }
    } else if current.contains("Time") {
        if let Some(next) = shift_single(&current, shift_seconds) {
            current = next;
            touched = true;
        }
    }

    touched.then_some(current)
}

/// Shift the `Valid: HH:MMZ Dow Mon DD YYYY` header timestamp.
pub fn shift_valid(line: &str, shift_seconds: i64) -> Option<String> {
    let idx = line.find("Valid:")?;
    let raw = line[idx + "Valid:".len()..].trim();
    let parsed = NaiveDateTime::parse_from_str(raw, VALID_FORMAT).ok()?;
    let shifted = (parsed + Duration::seconds(shift_seconds))
        .format(VALID_FORMAT)
        .to_string();
    Some(line.replacen(raw, &shifted, 1))
}

/// Shift both timestamps of a `<start> <end>` ISO pair.
pub fn shift_time_range(line: &str, shift_seconds: i64) -> Option<String> {
    let matches: Vec<_> = ISO_RE.find_iter(line).take(2).collect();
    if matches.len() < 2 {
        return None;
    }
    let start = shift_iso(matches[0].as_str(), shift_seconds)?;
    let end = shift_iso(matches[1].as_str(), shift_seconds)?;
    let old = format!("{} {}", matches[0].as_str(), matches[1].as_str());
    let new = format!("{} {}", start, end);
    Some(line.replacen(&old, &new, 1))
}

/// Shift the first (single) ISO timestamp on the line.
pub fn shift_single(line: &str, shift_seconds: i64) -> Option<String> {
    let found = ISO_RE.find(line)?;
    let shifted = shift_iso(found.as_str(), shift_seconds)?;
    Some(line.replacen(found.as_str(), &shifted, 1))
}

fn shift_iso(raw: &str, shift_seconds: i64) -> Option<String> {
    let parsed = NaiveDateTime::parse_from_str(raw, ISO_FORMAT).ok()?;
    Some(
        (parsed + Duration::seconds(shift_seconds))
            .format(ISO_FORMAT)
            .to_string(),
    )
}
