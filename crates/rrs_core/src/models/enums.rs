//! Core enums used throughout the application.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a simulation run.
///
/// Persisted as a single lowercase word in the durable status marker so
/// that the state survives a process restart. `Launched` is set by the
/// playback engine once replay begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run accepted, stages not yet executing.
    Startup,
    /// Stages executing.
    Running,
    /// Run halted, either by user request or a stage failure.
    Cancelled,
    /// All stages finished and bundles archived.
    Completed,
    /// Playback has been started against the run's artifacts.
    Launched,
}

impl RunStatus {
    /// Whether the run is actively producing artifacts.
    ///
    /// The monitor only re-scans while this is true.
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Startup | RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Startup => "startup",
            RunStatus::Running => "running",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Completed => "completed",
            RunStatus::Launched => "launched",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "startup" => Ok(RunStatus::Startup),
            "running" => Ok(RunStatus::Running),
            "cancelled" => Ok(RunStatus::Cancelled),
            "completed" => Ok(RunStatus::Completed),
            "launched" => Ok(RunStatus::Launched),
            other => Err(format!("unknown run status: {:?}", other)),
        }
    }
}

/// State of the playback clock machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No playback spec has been launched.
    #[default]
    Idle,
    /// Clock advances on each tick.
    Running,
    /// Clock frozen; resume keeps the current value.
    Paused,
    /// Clock reached the end of the playback window.
    Complete,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Running => "running",
            PlaybackState::Paused => "paused",
            PlaybackState::Complete => "complete",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_round_trips_through_marker_text() {
        for status in [
            RunStatus::Startup,
            RunStatus::Running,
            RunStatus::Cancelled,
            RunStatus::Completed,
            RunStatus::Launched,
        ] {
            let text = status.to_string();
            assert_eq!(text.parse::<RunStatus>().unwrap(), status);
        }
    }

    #[test]
    fn run_status_rejects_unknown_text() {
        assert!("finished".parse::<RunStatus>().is_err());
    }

    #[test]
    fn active_states() {
        assert!(RunStatus::Startup.is_active());
        assert!(RunStatus::Running.is_active());
        assert!(!RunStatus::Cancelled.is_active());
        assert!(!RunStatus::Completed.is_active());
        assert!(!RunStatus::Launched.is_active());
    }

    #[test]
    fn run_status_serializes_lowercase() {
        let json = serde_json::to_string(&RunStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
