//! Error types for the pipeline coordinator.
//!
//! Errors carry context that chains through layers:
//! Session → Stage → Operation → Detail

use std::io;

use thiserror::Error;

/// Top-level pipeline error with session context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage failed during execution.
    #[error("session '{session}' failed at stage '{stage}': {source}")]
    StageFailed {
        session: String,
        stage: String,
        #[source]
        source: StageError,
    },

    /// Input validation failed before the pipeline started.
    #[error("session '{session}' failed validation: {message}")]
    ValidationFailed { session: String, message: String },

    /// The run was cancelled.
    #[error("session '{session}' was cancelled")]
    Cancelled { session: String },

    /// Failed to set up the run (create directories, write markers).
    #[error("session '{session}' setup failed: {message}")]
    SetupFailed { session: String, message: String },
}

impl PipelineError {
    pub fn stage_failed(
        session: impl Into<String>,
        stage: impl Into<String>,
        source: StageError,
    ) -> Self {
        Self::StageFailed {
            session: session.into(),
            stage: stage.into(),
            source,
        }
    }

    pub fn validation_failed(session: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            session: session.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(session: impl Into<String>) -> Self {
        Self::Cancelled {
            session: session.into(),
        }
    }

    pub fn setup_failed(session: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            session: session.into(),
            message: message.into(),
        }
    }
}

/// Error from a pipeline stage with operation context.
#[derive(Error, Debug)]
pub enum StageError {
    /// Input validation failed.
    #[error("input validation failed: {0}")]
    InvalidInput(String),

    /// The collaborator terminated on the cooperative-cancellation
    /// signal.
    #[error("{program} terminated by cancellation signal")]
    Cancelled { program: String },

    /// An external collaborator failed.
    #[error("{program} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        program: String,
        exit_code: i32,
        message: String,
    },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Parsing error (inventory payloads, timestamps).
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// Archiving error.
    #[error("failed to write bundle: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Generic stage error with message.
    #[error("{0}")]
    Other(String),
}

impl StageError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn cancelled(program: impl Into<String>) -> Self {
        Self::Cancelled {
            program: program.into(),
        }
    }

    pub fn command_failed(
        program: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            program: program.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn parse_error(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this error is the cooperative-cancellation sentinel.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, StageError::Cancelled { .. })
    }
}

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
