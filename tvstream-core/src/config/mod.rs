//! Configuration structures and constants for the tvstream-core library.
//!
//! This module provides the configuration for pipeline compilation and
//! session supervision: where the transcoder lives, which hardware backend
//! to prefer, filter defaults and the timing of readiness polling, idle
//! teardown and reconnect throttling.

mod builder;
pub mod utils;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::pipeline::HardwareAccelerationMode;
use utils::{get_env_opt_string, get_env_path, get_env_string, get_env_u32, get_env_u64};

pub use builder::CoreConfigBuilder;

// Default constants

/// Default transcoder binary, resolved through `PATH`.
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Default parent directory for segmented session output.
pub const DEFAULT_STREAM_OUTPUT_DIR: &str = "./streams";

/// Default transcoder `-loglevel`.
pub const DEFAULT_FFMPEG_LOG_LEVEL: &str = "error";

/// Default software scaler flags.
pub const DEFAULT_SCALING_ALGORITHM: &str = "fast_bilinear";

/// Default software deinterlace filter.
pub const DEFAULT_DEINTERLACE_FILTER: &str = "yadif=1";

/// Default HLS segment length in seconds.
pub const DEFAULT_HLS_TIME_SECS: u32 = 3;

/// Default number of segments kept in the HLS playlist.
pub const DEFAULT_HLS_LIST_SIZE: u32 = 8;

/// Grace period between the last consumer detaching and process teardown.
pub const DEFAULT_IDLE_GRACE_MS: u64 = 5_000;

/// Number of retries after the first readiness check.
pub const DEFAULT_READINESS_ATTEMPTS: u32 = 10;

/// Multiplicative backoff between readiness checks.
pub const DEFAULT_READINESS_FACTOR: f64 = 1.2;

/// Delay before the first readiness retry.
pub const DEFAULT_READINESS_MIN_DELAY_MS: u64 = 1_000;

/// Window inside which a repeated reconnect to the same item is throttled.
pub const DEFAULT_THROTTLE_WINDOW_MS: u64 = 5_000;

/// Maximum number of tracked reconnect tokens.
pub const DEFAULT_THROTTLE_CAPACITY: usize = 256;

// Environment variable names

pub const ENV_FFMPEG_PATH: &str = "TVSTREAM_FFMPEG_PATH";
pub const ENV_STREAM_DIR: &str = "TVSTREAM_STREAM_DIR";
pub const ENV_HWACCEL: &str = "TVSTREAM_HWACCEL";
pub const ENV_VAAPI_DEVICE: &str = "TVSTREAM_VAAPI_DEVICE";
pub const ENV_VAAPI_DRIVER: &str = "TVSTREAM_VAAPI_DRIVER";
pub const ENV_THREADS: &str = "TVSTREAM_THREADS";
pub const ENV_FFMPEG_LOG_LEVEL: &str = "TVSTREAM_FFMPEG_LOG_LEVEL";
pub const ENV_IDLE_GRACE_MS: &str = "TVSTREAM_IDLE_GRACE_MS";

/// Main configuration structure for the tvstream-core library.
///
/// All fields have defaults, so a config file only needs to name the values
/// it changes. The builder provides a fluent way to create instances in code.
///
/// # Examples
///
/// ```rust
/// use tvstream_core::config::CoreConfigBuilder;
/// use tvstream_core::pipeline::HardwareAccelerationMode;
///
/// let config = CoreConfigBuilder::new()
///     .ffmpeg_path("/usr/bin/ffmpeg")
///     .hardware_acceleration(HardwareAccelerationMode::Vaapi)
///     .vaapi_device("/dev/dri/renderD128")
///     .thread_count(4)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Transcoder binary
    pub ffmpeg_path: PathBuf,

    /// Parent directory of per-channel segment directories
    pub stream_output_dir: PathBuf,

    /// Preferred hardware backend; unsupported codecs fall back to software
    pub hardware_acceleration: HardwareAccelerationMode,

    /// VAAPI render node, required in VAAPI mode
    pub vaapi_device: Option<String>,

    /// Value for `LIBVA_DRIVER_NAME`
    pub vaapi_driver: Option<String>,

    /// Encoder thread count; `None` leaves it to the transcoder
    pub thread_count: Option<u32>,

    /// Transcoder `-loglevel`
    pub log_level: String,

    pub scaling_algorithm: String,
    pub deinterlace_filter: String,
    pub hls_time_secs: u32,
    pub hls_list_size: u32,

    pub idle_grace_ms: u64,

    /// Readiness retries after the first check
    pub readiness_attempts: u32,
    pub readiness_factor: f64,
    pub readiness_min_delay_ms: u64,

    pub throttle_window_ms: u64,
    pub throttle_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            stream_output_dir: PathBuf::from(DEFAULT_STREAM_OUTPUT_DIR),
            hardware_acceleration: HardwareAccelerationMode::None,
            vaapi_device: None,
            vaapi_driver: None,
            thread_count: None,
            log_level: DEFAULT_FFMPEG_LOG_LEVEL.to_string(),
            scaling_algorithm: DEFAULT_SCALING_ALGORITHM.to_string(),
            deinterlace_filter: DEFAULT_DEINTERLACE_FILTER.to_string(),
            hls_time_secs: DEFAULT_HLS_TIME_SECS,
            hls_list_size: DEFAULT_HLS_LIST_SIZE,
            idle_grace_ms: DEFAULT_IDLE_GRACE_MS,
            readiness_attempts: DEFAULT_READINESS_ATTEMPTS,
            readiness_factor: DEFAULT_READINESS_FACTOR,
            readiness_min_delay_ms: DEFAULT_READINESS_MIN_DELAY_MS,
            throttle_window_ms: DEFAULT_THROTTLE_WINDOW_MS,
            throttle_capacity: DEFAULT_THROTTLE_CAPACITY,
        }
    }
}

impl CoreConfig {
    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            CoreError::JsonParseError(format!("{}: {}", path.display(), e))
        })
    }

    /// Applies `TVSTREAM_*` environment overrides on top of this config.
    ///
    /// Unparseable numeric values are ignored. An unknown hardware mode is
    /// reported as a configuration error rather than silently ignored.
    pub fn with_env_overrides(mut self) -> CoreResult<Self> {
        self.ffmpeg_path = get_env_path(ENV_FFMPEG_PATH, self.ffmpeg_path);
        self.stream_output_dir = get_env_path(ENV_STREAM_DIR, self.stream_output_dir);

        if let Some(mode) = get_env_opt_string(ENV_HWACCEL, None) {
            self.hardware_acceleration = mode
                .parse()
                .map_err(|e| CoreError::Config(format!("{ENV_HWACCEL}: {e}")))?;
        }

        self.vaapi_device = get_env_opt_string(ENV_VAAPI_DEVICE, self.vaapi_device);
        self.vaapi_driver = get_env_opt_string(ENV_VAAPI_DRIVER, self.vaapi_driver);

        let threads = get_env_u32(ENV_THREADS, self.thread_count.unwrap_or(0));
        self.thread_count = (threads > 0).then_some(threads);

        self.log_level = get_env_string(ENV_FFMPEG_LOG_LEVEL, self.log_level);
        self.idle_grace_ms = get_env_u64(ENV_IDLE_GRACE_MS, self.idle_grace_ms);

        Ok(self)
    }

    /// Checks the invariants the rest of the library relies on.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(CoreError::Config("ffmpeg_path must not be empty".to_string()));
        }
        if self.readiness_attempts == 0 {
            return Err(CoreError::Config(
                "readiness_attempts must be at least 1".to_string(),
            ));
        }
        if !(self.readiness_factor >= 1.0) {
            return Err(CoreError::Config(format!(
                "readiness_factor must be >= 1.0, got {}",
                self.readiness_factor
            )));
        }
        if self.hardware_acceleration == HardwareAccelerationMode::Vaapi
            && self.vaapi_device.is_none()
        {
            return Err(CoreError::Config(
                "vaapi hardware acceleration requires vaapi_device".to_string(),
            ));
        }
        if self.throttle_capacity == 0 {
            return Err(CoreError::Config(
                "throttle_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn idle_grace(&self) -> Duration {
        Duration::from_millis(self.idle_grace_ms)
    }

    pub fn readiness_min_delay(&self) -> Duration {
        Duration::from_millis(self.readiness_min_delay_ms)
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.scaling_algorithm, "fast_bilinear");
        assert_eq!(config.deinterlace_filter, "yadif=1");
        assert_eq!(config.readiness_attempts, 10);
        assert_eq!(config.idle_grace(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_file_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "hardware_acceleration": "qsv", "hls_list_size": 12 }}"#
        )
        .unwrap();

        let config = CoreConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.hardware_acceleration, HardwareAccelerationMode::Qsv);
        assert_eq!(config.hls_list_size, 12);
        assert_eq!(config.hls_time_secs, DEFAULT_HLS_TIME_SECS);
    }

    #[test]
    fn test_json_file_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        match CoreConfig::from_json_file(file.path()) {
            Err(CoreError::JsonParseError(_)) => {}
            other => panic!("expected JsonParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CoreConfig::default();
        config.readiness_factor = 0.5;
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.readiness_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.hardware_acceleration = HardwareAccelerationMode::Vaapi;
        assert!(config.validate().is_err());
        config.vaapi_device = Some("/dev/dri/renderD128".to_string());
        assert!(config.validate().is_ok());

        let mut config = CoreConfig::default();
        config.ffmpeg_path = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
