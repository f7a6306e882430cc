//! Durable run markers.
//!
//! The status marker is the sole cross-process-restart synchronization
//! point: a single line of text, overwritten atomically on every state
//! transition, reconstructible after an unexpected restart. The
//! completion marker signals by presence that a prior run's stages
//! fully completed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::RunStatus;

/// Durable single-line status marker.
#[derive(Debug, Clone)]
pub struct StatusMarker {
    path: PathBuf,
}

impl StatusMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the marker atomically (write temp file, then rename).
    pub fn write(&self, status: RunStatus) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            writeln!(file, "{}", status)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        tracing::debug!("status marker -> {}", status);
        Ok(())
    }

    /// Read the current status, if a well-formed marker exists.
    pub fn read(&self) -> Option<RunStatus> {
        let content = fs::read_to_string(&self.path).ok()?;
        content.lines().next()?.parse().ok()
    }
}

/// Completion marker file: presence means the prior run finished.
#[derive(Debug, Clone)]
pub struct CompletionMarker {
    path: PathBuf,
}

impl CompletionMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Whether a prior run completed all of its stages.
    pub fn is_set(&self) -> bool {
        self.path.exists()
    }

    /// Record completion.
    pub fn set(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, b"")
    }

    /// Clear the marker at the start of a new run.
    pub fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
