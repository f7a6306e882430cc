//! Run progress monitoring.
//!
//! Estimates per-stage completion from the OS process table and the
//! session's filesystem outputs, without introspecting collaborator
//! internals. Sampling is cheap enough for a short fixed polling
//! interval and short-circuits to the last cached snapshot once the
//! run is inactive.

mod processes;
mod progress;

pub use processes::{scan_stage_processes, StageProcess};
pub use progress::{FoundExpected, ProgressMonitor, ProgressSnapshot};
