// ============================================================================
// tvstream-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for tvstream-core
//
// This module defines the error taxonomy of the library. Build-time errors
// (bad descriptors, unsupported codec/hardware combinations) carry enough
// structure to be actionable; runtime errors describe what happened to the
// external transcoder process and which output never became ready.
//
// KEY COMPONENTS:
// - CoreError: Main error enum with variants for the different failure modes
// - CoreResult: Type alias for Result<T, CoreError>
// - Helper functions for creating process-related errors
//
// AI-ASSISTANT-INFO: Error handling system for the pipeline compiler and sessions

// ---- Standard library imports ----
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

// ---- External crate imports ----
use thiserror::Error;

/// Errors produced by tvstream-core.
#[derive(Error, Debug)]
pub enum CoreError {
    // ---- I/O and process errors ----
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to execute {cmd}: {source}")]
    CommandStart { cmd: String, source: io::Error },

    #[error("Failed to wait for {cmd}: {source}")]
    CommandWait { cmd: String, source: io::Error },

    #[error("Command {cmd} failed with status {status}. Stderr: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    // ---- Build-time errors ----
    #[error("No {codec} encoder available for hardware acceleration mode '{mode}'")]
    NoEncoder { codec: String, mode: String },

    #[error("Invalid resolution '{0}': expected WIDTHxHEIGHT with non-zero dimensions")]
    InvalidResolution(String),

    #[error("Invalid pixel format: {0}")]
    InvalidPixelFormat(String),

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Pipeline has no video encoder step")]
    MissingEncoder,

    #[error("Invalid media descriptor: {0}")]
    InvalidDescriptor(String),

    // ---- Readiness errors ----
    #[error("Output {} was not ready after {attempts} attempts", path.display())]
    ReadinessTimeout { path: PathBuf, attempts: u32 },

    #[error("Transcoder exited (code {code:?}) before {} was ready: {stderr}", path.display())]
    ExitedBeforeReady {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    // ---- Session errors ----
    #[error("Transcoder exited unexpectedly (code {code:?}): {stderr}")]
    ProcessExited { code: Option<i32>, stderr: String },

    #[error("Session for channel {0} has been stopped")]
    SessionStopped(String),

    // ---- Probe errors ----
    #[error("ffprobe output parsing error: {0}")]
    FfprobeParse(String),

    #[error("JSON parsing error: {0}")]
    JsonParseError(String),

    // ---- General errors ----
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for tvstream-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// ---- Helper functions ----

/// Creates a `CommandStart` error for a process that could not be spawned.
pub fn command_start_error(cmd: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandStart {
        cmd: cmd.into(),
        source,
    }
}

/// Creates a `CommandWait` error for a process whose status could not be read.
pub fn command_wait_error(cmd: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandWait {
        cmd: cmd.into(),
        source,
    }
}

/// Creates a `CommandFailed` error for a process that exited unsuccessfully.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_encoder_message_names_codec_and_mode() {
        let err = CoreError::NoEncoder {
            codec: "av1".to_string(),
            mode: "qsv".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("av1"), "message should name the codec: {message}");
        assert!(message.contains("qsv"), "message should name the mode: {message}");
    }

    #[test]
    fn test_readiness_errors_are_distinguishable() {
        let timeout = CoreError::ReadinessTimeout {
            path: PathBuf::from("/tmp/stream.m3u8"),
            attempts: 11,
        };
        let exited = CoreError::ExitedBeforeReady {
            path: PathBuf::from("/tmp/stream.m3u8"),
            code: Some(1),
            stderr: "boom".to_string(),
        };
        assert!(timeout.to_string().contains("11 attempts"));
        assert!(exited.to_string().contains("boom"));
    }

    #[test]
    fn test_command_start_error_helper() {
        let err = command_start_error("ffmpeg", io::Error::new(io::ErrorKind::NotFound, "missing"));
        match err {
            CoreError::CommandStart { cmd, .. } => assert_eq!(cmd, "ffmpeg"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
