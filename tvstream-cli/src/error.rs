// ============================================================================
// tvstream-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Context for Core Errors
//
// Commands return core errors directly. File loading and argument handling
// wrap them in `OperationFailed` with a message naming what was being done.
//
// KEY COMPONENTS:
// - CliResult: Result alias shared by all commands
// - CliErrorContext: context for `Result` and `Option` values
// - suggestion: a next step printed under the error
// - cli_error!: ad-hoc operation errors
//
// AI-ASSISTANT-INFO: CLI error handling utilities

use std::fmt;

use tvstream_core::{CoreError, CoreResult};

/// Result type used by every CLI command.
pub type CliResult<T> = CoreResult<T>;

fn wrap(context: impl fmt::Display, err: impl Into<CoreError>) -> CoreError {
    CoreError::OperationFailed(format!("{context}: {}", err.into()))
}

/// Adds a human-readable context to errors before they reach the terminal.
pub trait CliErrorContext<T> {
    fn cli_context<C: fmt::Display>(self, context: C) -> CliResult<T>;

    /// Lazy variant of `cli_context`.
    fn cli_with_context<C: fmt::Display, F: FnOnce() -> C>(self, f: F) -> CliResult<T>;
}

impl<T, E: Into<CoreError>> CliErrorContext<T> for Result<T, E> {
    fn cli_context<C: fmt::Display>(self, context: C) -> CliResult<T> {
        self.map_err(|e| wrap(context, e))
    }

    fn cli_with_context<C: fmt::Display, F: FnOnce() -> C>(self, f: F) -> CliResult<T> {
        self.map_err(|e| wrap(f(), e))
    }
}

impl<T> CliErrorContext<T> for Option<T> {
    fn cli_context<C: fmt::Display>(self, context: C) -> CliResult<T> {
        self.ok_or_else(|| CoreError::OperationFailed(context.to_string()))
    }

    fn cli_with_context<C: fmt::Display, F: FnOnce() -> C>(self, f: F) -> CliResult<T> {
        self.ok_or_else(|| CoreError::OperationFailed(f().to_string()))
    }
}

/// What the user can try next, for errors with an obvious remedy.
pub fn suggestion(err: &CoreError) -> Option<&'static str> {
    match err {
        CoreError::CommandStart { .. } => Some("Check that ffmpeg is installed or set TVSTREAM_FFMPEG_PATH"),
        CoreError::NoEncoder { .. } => Some("Try --hwaccel none to use software encoding"),
        CoreError::Config(_) => Some("Check the config file and TVSTREAM_* environment variables"),
        CoreError::JsonParseError(_) | CoreError::MissingField { .. } => {
            Some("Generate a valid item descriptor with `tvstream probe <FILE>`")
        }
        CoreError::ReadinessTimeout { .. } | CoreError::ExitedBeforeReady { .. } => {
            Some("Run with --verbose to see the transcoder's output")
        }
        _ => None,
    }
}

/// Creates an `OperationFailed` error from a format string.
#[macro_export]
macro_rules! cli_error {
    ($($arg:tt)*) => {
        ::tvstream_core::CoreError::OperationFailed(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_context_wraps_core_errors() {
        let result: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.cli_context("Failed to read item").unwrap_err();
        match err {
            CoreError::OperationFailed(message) => {
                assert!(message.starts_with("Failed to read item: "), "{message}");
                assert!(message.contains("gone"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_option_becomes_error() {
        let missing: Option<u32> = None;
        let err = missing.cli_with_context(|| format!("channel {} has no session", 7)).unwrap_err();
        assert_eq!(err.to_string(), "Operation failed: channel 7 has no session");
        assert!(Some(3).cli_context("unused").is_ok());
    }

    #[test]
    fn test_suggestions_for_actionable_errors() {
        let spawn = tvstream_core::error::command_start_error("ffmpeg", io::Error::from(io::ErrorKind::NotFound));
        assert!(suggestion(&spawn).unwrap().contains("TVSTREAM_FFMPEG_PATH"));

        let no_encoder = CoreError::NoEncoder {
            codec: "av1".to_string(),
            mode: "qsv".to_string(),
        };
        assert!(suggestion(&no_encoder).unwrap().contains("--hwaccel"));
        assert!(suggestion(&CoreError::SessionStopped("1".to_string())).is_none());
    }

    #[test]
    fn test_cli_error_macro() {
        let err = crate::cli_error!("bad {}", "input");
        assert_eq!(err.to_string(), "Operation failed: bad input");
    }
}
