//! OS process-table scanning.
//!
//! Retains processes whose command line matches a known stage-name
//! allow-list and carries the active run's correlation tag, deduped by
//! stage name (a stage may fork children).

use serde::Serialize;

/// One running stage process.
#[derive(Debug, Clone, Serialize)]
pub struct StageProcess {
    /// Stage executable name from the allow-list.
    pub stage: String,
    /// Process id.
    pub pid: i32,
    /// Seconds since the process started.
    pub runtime_secs: u64,
}

/// Match a command line against the tag and allow-list.
///
/// Returns the allow-list entry the command line matches, if any.
fn match_stage(args: &[String], tag: &str, allow_list: &[String]) -> Option<String> {
    if !args.iter().any(|a| a.contains(tag)) {
        return None;
    }
    for entry in allow_list {
        let hit = args
            .iter()
            .any(|a| a.rsplit('/').next().unwrap_or(a).contains(entry.as_str()));
        if hit {
            return Some(entry.clone());
        }
    }
    None
}

/// Enumerate stage processes belonging to the run with `tag`.
#[cfg(target_os = "linux")]
pub fn scan_stage_processes(tag: &str, allow_list: &[String]) -> Vec<StageProcess> {
    use std::collections::HashSet;

    let entries = match std::fs::read_dir("/proc") {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let now_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let boot = boot_time_secs();
    let ticks = clock_ticks_per_sec();

    let mut seen: HashSet<String> = HashSet::new();
    let mut found = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let pid: i32 = match name.to_str().and_then(|n| n.parse().ok()) {
            Some(pid) => pid,
            None => continue,
        };

        // The process may exit mid-scan; any read error just skips it.
        let cmdline = match std::fs::read(format!("/proc/{}/cmdline", pid)) {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };
        let args: Vec<String> = cmdline
            .split(|b| *b == 0)
            .filter(|part| !part.is_empty())
            .map(|part| String::from_utf8_lossy(part).to_string())
            .collect();

        let stage = match match_stage(&args, tag, allow_list) {
            Some(stage) => stage,
            None => continue,
        };
        if !seen.insert(stage.clone()) {
            continue;
        }

        let runtime_secs = process_start_epoch(pid, boot, ticks)
            .map(|start| now_epoch.saturating_sub(start))
            .unwrap_or(0);
        found.push(StageProcess {
            stage,
            pid,
            runtime_secs,
        });
    }
    found
}

/// Non-Linux hosts report no stage processes; filesystem ratios still
/// work.
#[cfg(not(target_os = "linux"))]
pub fn scan_stage_processes(_tag: &str, _allow_list: &[String]) -> Vec<StageProcess> {
    Vec::new()
}

#[cfg(target_os = "linux")]
fn process_start_epoch(pid: i32, boot: Option<u64>, ticks: i64) -> Option<u64> {
    let boot = boot?;
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    let start_ticks = parse_starttime_ticks(&stat)?;
    Some(boot + start_ticks / ticks.max(1) as u64)
}

/// Kernel boot time from `/proc/stat`.
#[cfg(target_os = "linux")]
fn boot_time_secs() -> Option<u64> {
    let stat = std::fs::read_to_string("/proc/stat").ok()?;
    stat.lines()
        .find_map(|line| line.strip_prefix("btime "))
        .and_then(|rest| rest.trim().parse().ok())
}

#[cfg(target_os = "linux")]
fn clock_ticks_per_sec() -> i64 {
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks
    } else {
        100
    }
}

/// Field 22 of `/proc/<pid>/stat`: process start time in clock ticks
/// since boot. The comm field may itself contain spaces, so fields are
/// counted after its closing paren.
#[allow(dead_code)]
fn parse_starttime_ticks(stat: &str) -> Option<u64> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    after_comm.split_whitespace().nth(19)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_require_both_tag_and_allow_list() {
        let allow = vec!["nexrad_fetch".to_string(), "radar_munge".to_string()];

        let matched = match_stage(
            &args(&["scripts/nexrad_fetch", "KTLX", "abc123"]),
            "abc123",
            &allow,
        );
        assert_eq!(matched.as_deref(), Some("nexrad_fetch"));

        // Wrong tag: some other session's process.
        assert!(match_stage(
            &args(&["scripts/nexrad_fetch", "KTLX", "zzz999"]),
            "abc123",
            &allow
        )
        .is_none());

        // Tag present but not a known stage.
        assert!(match_stage(&args(&["vim", "abc123.txt"]), "abc123", &allow).is_none());
    }

    #[test]
    fn interpreter_wrapped_invocations_match() {
        let allow = vec!["hodo_render".to_string()];
        let matched = match_stage(
            &args(&["python3", "-m", "scripts.hodo_render", "KTLX", "abc123"]),
            "abc123",
            &allow,
        );
        assert_eq!(matched.as_deref(), Some("hodo_render"));
    }

    #[test]
    fn starttime_parses_past_comm_with_spaces() {
        // pid 42, comm "(radar munge) extra)" keeps the rfind honest.
        let mut fields = vec!["R"];
        let tail: Vec<String> = (4..=21).map(|i| i.to_string()).collect();
        fields.extend(tail.iter().map(|s| s.as_str()));
        fields.push("777"); // field 22: starttime
        fields.push("23");
        let stat = format!("42 (radar munge) {}", fields.join(" "));
        assert_eq!(parse_starttime_ticks(&stat), Some(777));
    }

    #[test]
    fn malformed_stat_yields_none() {
        assert!(parse_starttime_ticks("garbage").is_none());
        assert!(parse_starttime_ticks("1 (x) R 1 2").is_none());
    }
}
