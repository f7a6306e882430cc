//! Immutable playback specification.
//!
//! Captured once at launch so later ticks never depend on externally
//! mutating state.

use serde::{Deserialize, Serialize};

use crate::clock::SimulationTimes;
use crate::models::{SessionId, SessionPaths, SiteMeta};
use crate::pipeline::RunContext;
use crate::transform::geodesy::LatLon;
use crate::transform::ShiftSpec;

/// Snapshot of everything a playback session needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSpec {
    /// Owning session.
    pub session: SessionId,
    /// Session directory layout.
    pub paths: SessionPaths,
    /// Timing for the run being replayed.
    pub times: SimulationTimes,
    /// Selected sites, sorted by code.
    pub sites: Vec<SiteMeta>,
    /// Transpose-target site, when one was chosen.
    pub transpose: Option<SiteMeta>,
}

impl PlaybackSpec {
    /// Snapshot the run context at launch time.
    pub fn from_context(ctx: &RunContext) -> Self {
        Self {
            session: ctx.session.clone(),
            paths: ctx.paths.clone(),
            times: ctx.times.clone(),
            sites: ctx.sites.values().cloned().collect(),
            transpose: ctx.transpose.clone(),
        }
    }

    /// Shift parameters for refreshing derived placefiles.
    pub fn shift_spec(&self) -> ShiftSpec {
        let origin = self.sites.first().map(|m| LatLon::new(m.lat, m.lon));
        let destination = self.transpose.as_ref().map(|m| LatLon::new(m.lat, m.lon));
        ShiftSpec {
            shift_seconds: self.times.shift_seconds,
            origin,
            destination,
        }
    }

    /// Sites whose polling lists are regenerated on refresh: the
    /// transpose target alone, or every originally selected site.
    pub fn polling_sites(&self) -> Vec<String> {
        match &self.transpose {
            Some(meta) => vec![meta.code.clone()],
            None => self.sites.iter().map(|m| m.code.clone()).collect(),
        }
    }
}
