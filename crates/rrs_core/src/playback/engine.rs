//! Playback clock state machine.
//!
//! idle → running ⇄ paused → complete, with direct time-jumps to any
//! checkpoint that leave the run/pause state alone. Every tick or jump
//! that lands the clock inside the playback window refreshes the
//! derived artifacts: shifted placefiles, the hodograph page, and the
//! polling lists.

use chrono::{DateTime, Duration, Utc};

use crate::artifacts::{dir_list, hodo_page};
use crate::models::{PlaybackState, RunStatus};
use crate::pipeline::StatusMarker;
use crate::transform;

use super::spec::PlaybackSpec;

/// Result of a tick or jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Clock value after the operation.
    pub clock: DateTime<Utc>,
    /// Engine state after the operation.
    pub state: PlaybackState,
    /// Whether artifacts were refreshed.
    pub refreshed: bool,
}

/// The playback engine for one session.
pub struct PlaybackEngine {
    spec: PlaybackSpec,
    clock: DateTime<Utc>,
    state: PlaybackState,
    speed: f64,
    tick_seconds: i64,
}

impl PlaybackEngine {
    /// Launch playback against a spec snapshot.
    ///
    /// Sets the durable marker to `launched`, starts the clock at the
    /// spec's initial value, and performs the first refresh.
    pub fn launch(spec: PlaybackSpec, tick_seconds: u64, speed: f64) -> Self {
        let marker = StatusMarker::new(spec.paths.status_file());
        if let Err(e) = marker.write(RunStatus::Launched) {
            tracing::error!("could not write launched marker: {}", e);
        }

        let mut engine = Self {
            clock: spec.times.playback_clock,
            spec,
            state: PlaybackState::Running,
            speed,
            tick_seconds: tick_seconds as i64,
        };
        engine.refresh();
        engine
    }

    /// Current virtual time.
    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    /// Current engine state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current speed multiplier.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The launch-time spec snapshot.
    pub fn spec(&self) -> &PlaybackSpec {
        &self.spec
    }

    /// Advance the clock by one tick interval times the speed
    /// multiplier. No-op unless running.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != PlaybackState::Running {
            return self.outcome(false);
        }

        let step = (self.tick_seconds as f64 * self.speed).round() as i64;
        self.clock += Duration::seconds(step);

        if self.clock >= self.spec.times.playback_end {
            self.clock = self.spec.times.playback_end;
            self.state = PlaybackState::Complete;
        }
        let refreshed = self.refresh();
        self.outcome(refreshed)
    }

    /// Pause a running clock. Resuming keeps the current value.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Running {
            self.state = PlaybackState::Paused;
        }
    }

    /// Resume a paused clock.
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Running;
        }
    }

    /// Jump directly to a checkpoint without changing the run/pause
    /// state.
    pub fn jump(&mut self, checkpoint: DateTime<Utc>) -> TickOutcome {
        let times = &self.spec.times;
        self.clock = checkpoint
            .max(times.playback_start)
            .min(times.playback_end);
        let refreshed = self.refresh();
        self.outcome(refreshed)
    }

    /// Change the speed multiplier. Never resumes a paused engine.
    pub fn set_speed(&mut self, speed: f64) {
        if speed > 0.0 && speed.is_finite() {
            self.speed = speed;
        } else {
            tracing::warn!("ignoring invalid speed multiplier {}", speed);
        }
    }

    /// Regenerate derived artifacts for the current clock.
    ///
    /// Only refreshes while the clock is inside the playback window.
    /// Individual artifact failures are logged and do not stop
    /// playback.
    fn refresh(&self) -> bool {
        if !self.spec.times.in_window(self.clock) {
            return false;
        }

        let shift = self.spec.shift_spec();
        transform::shift_placefiles(&self.spec.paths.placefiles_dir(), &shift);

        if let Err(e) = hodo_page::write_hodo_page(
            &self.spec.paths.hodographs_dir(),
            &self.spec.paths.hodograph_page(),
            Some(self.clock),
        ) {
            tracing::warn!("hodograph page refresh failed: {}", e);
        }

        for site in self.spec.polling_sites() {
            let site_dir = self.spec.paths.site_polling_dir(&site);
            if let Err(e) = dir_list::write_dir_list(&site_dir, Some(self.clock)) {
                tracing::warn!("dir.list refresh failed for {}: {}", site, e);
            }
        }
        true
    }

    fn outcome(&self, refreshed: bool) -> TickOutcome {
        TickOutcome {
            clock: self.clock,
            state: self.state,
            refreshed,
        }
    }
}
