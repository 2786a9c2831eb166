// ============================================================================
// tvstream-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// This module implements the builder pattern for the CoreConfig structure,
// providing a fluent API for creating and configuring CoreConfig instances.
// Every field starts from the CoreConfig default, so callers only name the
// values they want to change.
//
// KEY COMPONENTS:
// - CoreConfigBuilder: Builder struct for creating CoreConfig instances
//
// AI-ASSISTANT-INFO: Builder pattern implementation for CoreConfig

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::CoreConfig;
use crate::pipeline::HardwareAccelerationMode;

/// Builder for creating CoreConfig instances.
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new builder seeded with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one loaded from a file.
    #[must_use]
    pub fn from_config(config: CoreConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_path = path.into();
        self
    }

    #[must_use]
    pub fn stream_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.stream_output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn hardware_acceleration(mut self, mode: HardwareAccelerationMode) -> Self {
        self.config.hardware_acceleration = mode;
        self
    }

    #[must_use]
    pub fn vaapi_device(mut self, device: &str) -> Self {
        self.config.vaapi_device = Some(device.to_string());
        self
    }

    #[must_use]
    pub fn vaapi_driver(mut self, driver: &str) -> Self {
        self.config.vaapi_driver = Some(driver.to_string());
        self
    }

    /// Sets the encoder thread count. Zero means "let the transcoder decide".
    #[must_use]
    pub fn thread_count(mut self, threads: u32) -> Self {
        self.config.thread_count = (threads > 0).then_some(threads);
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: &str) -> Self {
        self.config.log_level = level.to_string();
        self
    }

    #[must_use]
    pub fn scaling_algorithm(mut self, algorithm: &str) -> Self {
        self.config.scaling_algorithm = algorithm.to_string();
        self
    }

    #[must_use]
    pub fn deinterlace_filter(mut self, filter: &str) -> Self {
        self.config.deinterlace_filter = filter.to_string();
        self
    }

    #[must_use]
    pub fn hls_time_secs(mut self, secs: u32) -> Self {
        self.config.hls_time_secs = secs;
        self
    }

    #[must_use]
    pub fn hls_list_size(mut self, size: u32) -> Self {
        self.config.hls_list_size = size;
        self
    }

    #[must_use]
    pub fn idle_grace(mut self, grace: Duration) -> Self {
        self.config.idle_grace_ms = grace.as_millis() as u64;
        self
    }

    /// Sets readiness polling: retries after the first check, backoff factor
    /// and the delay before the first retry.
    #[must_use]
    pub fn readiness(mut self, attempts: u32, factor: f64, min_delay: Duration) -> Self {
        self.config.readiness_attempts = attempts;
        self.config.readiness_factor = factor;
        self.config.readiness_min_delay_ms = min_delay.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn throttle(mut self, window: Duration, capacity: usize) -> Self {
        self.config.throttle_window_ms = window.as_millis() as u64;
        self.config.throttle_capacity = capacity;
        self
    }

    /// Builds the CoreConfig instance.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
