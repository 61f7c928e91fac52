// Path: crates/types/src/error.rs
//! Core error types for the deployment driver.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Every failure the driver can report. None of them are recovered locally.
#[derive(Debug, Error)]
pub enum DriverError {
    /// An external command wrote to its error stream. Fatal regardless of exit status.
    #[error("Command `{command}` failed: {stderr}")]
    CommandFailure {
        /// The rendered command line.
        command: String,
        /// The captured standard-error text.
        stderr: String,
    },
    /// A command succeeded but its output did not have the expected shape.
    #[error("Could not find {expected} in output: {output:?}")]
    ParseFailure {
        /// What the parser was looking for.
        expected: String,
        /// The output that was inspected.
        output: String,
    },
    /// A step of the exercise sequence failed; the remaining steps were skipped.
    #[error("Exercise sequence aborted at step {step} (`{function}`)")]
    SequenceAbort {
        /// One-based index of the failing step.
        step: usize,
        /// The remote function the step invoked.
        function: String,
        /// The failure that aborted the step.
        #[source]
        source: Box<DriverError>,
    },
    /// The external process could not be started at all.
    #[error("Failed to spawn `{command}`")]
    Spawn {
        /// The rendered command line.
        command: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// Local filesystem failure (e.g. while resetting deployment metadata).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A step would move a proposal through a transition the protocol forbids.
    #[error("Invalid proposal transition: {0}")]
    InvalidTransition(String),
    /// The driver configuration is unreadable or invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// The run was interrupted (Ctrl-C) while an instance was live.
    #[error("Interrupted while instance {instance} was live")]
    Interrupted {
        /// The instance that was torn down because of the interrupt.
        instance: String,
    },
    /// Destroying the deployment failed after the scope itself succeeded.
    #[error("Failed to tear down instance {instance}")]
    Teardown {
        /// The instance that could not be deleted.
        instance: String,
        /// The failure reported by the delete command.
        #[source]
        source: Box<DriverError>,
    },
}

impl DriverError {
    /// Unwraps `SequenceAbort` and `Teardown` layers down to the originating failure.
    pub fn root(&self) -> &DriverError {
        match self {
            Self::SequenceAbort { source, .. } | Self::Teardown { source, .. } => source.root(),
            other => other,
        }
    }
}

impl ErrorCode for DriverError {
    fn code(&self) -> &'static str {
        match self {
            Self::CommandFailure { .. } => "DRIVER_COMMAND_FAILURE",
            Self::ParseFailure { .. } => "DRIVER_PARSE_FAILURE",
            Self::SequenceAbort { .. } => "DRIVER_SEQUENCE_ABORT",
            Self::Spawn { .. } => "DRIVER_SPAWN_FAILURE",
            Self::Io(_) => "DRIVER_IO",
            Self::InvalidTransition(_) => "DRIVER_INVALID_TRANSITION",
            Self::Config(_) => "DRIVER_CONFIG",
            Self::Interrupted { .. } => "DRIVER_INTERRUPTED",
            Self::Teardown { .. } => "DRIVER_TEARDOWN_FAILURE",
        }
    }
}
