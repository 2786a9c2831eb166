// ============================================================================
// tvstream-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console or File Logging for the CLI
//
// Console logging goes through env_logger on stderr so stdout stays free for
// compiled arguments and stream bytes. With `--log-dir`, the core's log4rs
// file backend is used instead and the console only carries terminal output.
//
// RUST_LOG still overrides the level chosen from `--verbose`:
// - RUST_LOG=info (default): normal operation logs
// - RUST_LOG=debug: transcoder commands and session transitions
// - RUST_LOG=trace: per-line transcoder stderr
//
// AI-ASSISTANT-INFO: Logging initialization and helpers for the CLI

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{Level, LevelFilter};
use owo_colors::OwoColorize;
use tvstream_core::file_logging::setup_file_logging;

use crate::error::CliResult;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("tvstream_play_{}.log", tvstream_cli::logging::get_timestamp());
/// assert!(log_filename.ends_with(".log"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Level used when RUST_LOG is not set.
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose { LevelFilter::Debug } else { LevelFilter::Info }
}

/// Path of the log file for one invocation of `command`.
pub fn log_file_path(log_dir: &Path, command: &str) -> PathBuf {
    log_dir.join(format!("tvstream_{}_{}.log", command, get_timestamp()))
}

/// Initializes logging for this process.
///
/// Returns the log file path when file logging was selected.
pub fn init(verbose: bool, log_dir: Option<&Path>, command: &str) -> CliResult<Option<PathBuf>> {
    let level = level_for(verbose);

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let path = log_file_path(dir, command);
        setup_file_logging(&path, level)?;
        return Ok(Some(path));
    }

    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "ERROR".red().bold().to_string(),
                Level::Warn => "WARN ".yellow().bold().to_string(),
                Level::Info => "INFO ".green().to_string(),
                Level::Debug => "DEBUG".blue().to_string(),
                Level::Trace => "TRACE".dimmed().to_string(),
            };
            writeln!(
                buf,
                "{} {} {}",
                chrono::Local::now().format("%H:%M:%S"),
                level,
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env();

    // A logger may already be installed when the CLI is driven from tests.
    let _ = builder.try_init();
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let stamp = get_timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_verbose_selects_debug() {
        assert_eq!(level_for(true), LevelFilter::Debug);
        assert_eq!(level_for(false), LevelFilter::Info);
    }

    #[test]
    fn test_log_file_named_after_command() {
        let path = log_file_path(Path::new("/var/log/tvstream"), "play");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tvstream_play_"), "{name}");
        assert!(name.ends_with(".log"), "{name}");
        assert_eq!(path.parent(), Some(Path::new("/var/log/tvstream")));
    }
}
