use crate::error::{CoreError, CoreResult};
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

pub const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Builds the log4rs configuration for a single file appender.
pub fn file_logging_config(log_file: &Path, log_level: LevelFilter) -> CoreResult<Config> {
    // Create log directory if it doesn't exist
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_file)?;

    Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(Root::builder().appender("file").build(log_level))
        .map_err(|e| CoreError::Config(format!("invalid logging configuration: {e}")))
}

/// Installs file logging as the global logger.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> CoreResult<()> {
    let config = file_logging_config(log_file, log_level)?;
    log4rs::init_config(config)
        .map_err(|e| CoreError::Config(format!("logger already initialized: {e}")))?;
    Ok(())
}
