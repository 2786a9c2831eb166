//! Optional file logging backend built on log4rs.

pub mod setup;

pub use setup::{file_logging_config, setup_file_logging, LOG_PATTERN};
