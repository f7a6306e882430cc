//! Simulation clock: derives the playback window and time shift.
//!
//! The playback window is anchored to "now" so display clients polling
//! a live-data protocol see the replay as current data. All arithmetic
//! is done at second granularity in UTC; display strings use minute
//! precision.

use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Minute-precision display format used across pages and stage args.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Offset of the initial playback clock from the window start.
const INITIAL_CLOCK_OFFSET_SECS: i64 = 600;

/// Spacing of selectable playback checkpoints.
const CHECKPOINT_STEP_SECS: i64 = 300;

/// Derived timing for one simulation run.
///
/// Invariants: `shift_seconds == playback_start - event_start` and
/// `playback_start <= playback_clock <= playback_end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationTimes {
    /// Historical start of the event being replayed.
    pub event_start: DateTime<Utc>,
    /// Event duration in minutes.
    pub event_duration: i64,
    /// Start of the playback window.
    pub playback_start: DateTime<Utc>,
    /// End of the playback window ("now" floored to 15 minutes).
    pub playback_end: DateTime<Utc>,
    /// Initial virtual "current time" for the replay.
    pub playback_clock: DateTime<Utc>,
    /// Whole-second shift from event time to playback time. Negative
    /// when the playback window precedes the event.
    pub shift_seconds: i64,
}

impl SimulationTimes {
    /// Compute the window for an event starting now.
    pub fn compute(event_start: DateTime<Utc>, event_duration: i64) -> Self {
        Self::compute_at(event_start, event_duration, Utc::now())
    }

    /// Compute the window against an explicit wall clock (for tests).
    pub fn compute_at(
        event_start: DateTime<Utc>,
        event_duration: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let now = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let playback_end = now - Duration::minutes((now.minute() % 15) as i64);
        let playback_start = playback_end - Duration::minutes(event_duration);

        // Clamp keeps the ordering invariant for sub-10-minute windows.
        let playback_clock =
            (playback_start + Duration::seconds(INITIAL_CLOCK_OFFSET_SECS)).min(playback_end);

        let shift = playback_start.signed_duration_since(event_start);
        Self {
            event_start,
            event_duration,
            playback_start,
            playback_end,
            playback_clock,
            shift_seconds: shift.num_seconds(),
        }
    }

    /// Selectable checkpoints at 5-minute increments spanning
    /// `[playback_start, playback_start + duration]`.
    pub fn checkpoints(&self) -> Vec<DateTime<Utc>> {
        let steps = (self.event_duration * 60) / CHECKPOINT_STEP_SECS;
        (0..=steps)
            .map(|t| self.playback_start + Duration::seconds(t * CHECKPOINT_STEP_SECS))
            .collect()
    }

    /// Minute-precision display string for any instant.
    pub fn display(instant: DateTime<Utc>) -> String {
        instant.format(DISPLAY_FORMAT).to_string()
    }

    /// Display string for the event start.
    pub fn event_start_str(&self) -> String {
        Self::display(self.event_start)
    }

    /// Display string for the playback window start.
    pub fn playback_start_str(&self) -> String {
        Self::display(self.playback_start)
    }

    /// Display string for the playback window end.
    pub fn playback_end_str(&self) -> String {
        Self::display(self.playback_end)
    }

    /// Display string for the initial playback clock.
    pub fn playback_clock_str(&self) -> String {
        Self::display(self.playback_clock)
    }

    /// Whether an instant falls inside the playback window.
    pub fn in_window(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.playback_start && instant <= self.playback_end
    }
}

/// Floor an instant to the nearest 15-minute boundary.
///
/// Exposed for tests that verify the window anchor directly.
pub fn floor_to_quarter_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(Duration::minutes(15))
        .unwrap_or(instant)
}
