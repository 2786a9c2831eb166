//! State threaded through one pipeline build.
//!
//! `FrameState` is the single source of truth for what the video frames look
//! like at a given point of the filter chain. Each step that changes the
//! encoded representation consumes one state and returns the next; nothing
//! mutates a state in place.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::media::{FrameSize, PixelFormat};
use crate::pipeline::types::{
    FrameDataLocation, HardwareAccelerationMode, OutputFormat, OutputLocation, VideoFormat,
};

/// Shape, format and location of the video frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameState {
    pub scaled_size: FrameSize,
    /// Size after letterboxing/pillarboxing
    pub padded_size: FrameSize,
    pub cropped_size: Option<FrameSize>,
    pub is_anamorphic: bool,
    pub realtime: bool,
    pub video_format: VideoFormat,
    pub pixel_format: Option<PixelFormat>,
    pub frame_rate: Option<u32>,
    pub video_track_timescale: Option<u32>,
    /// kbit/s
    pub video_bitrate: Option<u32>,
    /// kbit
    pub video_buffer_size: Option<u32>,
    pub frame_data_location: FrameDataLocation,
    pub interlaced: bool,
}

impl FrameState {
    /// A state with the given sizes and defaults everywhere else.
    #[must_use]
    pub fn new(scaled_size: FrameSize, padded_size: FrameSize) -> Self {
        Self {
            scaled_size,
            padded_size,
            cropped_size: None,
            is_anamorphic: false,
            realtime: false,
            video_format: VideoFormat::Mpeg2Video,
            pixel_format: None,
            frame_rate: None,
            video_track_timescale: None,
            video_bitrate: None,
            video_buffer_size: None,
            frame_data_location: FrameDataLocation::Unknown,
            interlaced: false,
        }
    }

    #[must_use]
    pub fn with_video_format(mut self, format: VideoFormat) -> Self {
        self.video_format = format;
        self
    }

    #[must_use]
    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = Some(pixel_format);
        self
    }

    #[must_use]
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    #[must_use]
    pub fn with_video_track_timescale(mut self, timescale: u32) -> Self {
        self.video_track_timescale = Some(timescale);
        self
    }

    /// Sets bitrate and buffer size in kbit/s and kbit.
    #[must_use]
    pub fn with_bitrate(mut self, bitrate: u32, buffer_size: Option<u32>) -> Self {
        self.video_bitrate = Some(bitrate);
        self.video_buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn with_interlaced(mut self, interlaced: bool) -> Self {
        self.interlaced = interlaced;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: FrameDataLocation) -> Self {
        self.frame_data_location = location;
        self
    }

    pub fn bit_depth(&self) -> u8 {
        self.pixel_format.as_ref().map_or(8, PixelFormat::bit_depth)
    }
}

/// Desired audio output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioState {
    pub encoder: String,
    pub channels: u32,
    /// kbit/s
    pub bitrate: Option<u32>,
    /// kbit
    pub buffer_size: Option<u32>,
    /// kHz
    pub sample_rate: Option<u32>,
    /// Pad the audio track to at least this length
    pub duration_ms: Option<u64>,
    /// Percent, 100 leaves the volume unchanged
    pub volume: Option<u32>,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            encoder: "aac".to_string(),
            channels: 2,
            bitrate: None,
            buffer_size: None,
            sample_rate: None,
            duration_ms: None,
            volume: None,
        }
    }
}

impl AudioState {
    pub fn is_copy(&self) -> bool {
        self.encoder == "copy"
    }
}

/// Segmented output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsSettings {
    pub playlist_path: String,
    pub segment_template: String,
    pub base_stream_url: Option<String>,
    pub segment_seconds: u32,
    pub list_size: u32,
}

impl HlsSettings {
    /// Fragmented MP4 segments are selected by an `.m4s` template.
    pub fn uses_fmp4(&self) -> bool {
        self.segment_template.contains("m4s")
    }
}

/// Process-level settings for one build: timing, output and filter defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegState {
    pub thread_count: Option<u32>,
    pub start: Option<Duration>,
    pub duration: Option<Duration>,
    /// Offset in units of the video track timescale
    pub pts_offset: Option<u64>,
    pub log_level: String,
    pub do_not_map_metadata: bool,
    pub metadata_service_provider: Option<String>,
    pub metadata_service_name: Option<String>,
    pub software_scaling_algorithm: String,
    pub software_deinterlace_filter: String,
    pub vaapi_device: Option<String>,
    pub vaapi_driver: Option<String>,
    pub output_format: OutputFormat,
    pub output_location: OutputLocation,
    pub hls: Option<HlsSettings>,
    pub user_agent: String,
}

impl Default for FfmpegState {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

impl FfmpegState {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            thread_count: config.thread_count,
            start: None,
            duration: None,
            pts_offset: None,
            log_level: config.log_level.clone(),
            do_not_map_metadata: false,
            metadata_service_provider: None,
            metadata_service_name: None,
            software_scaling_algorithm: config.scaling_algorithm.clone(),
            software_deinterlace_filter: config.deinterlace_filter.clone(),
            vaapi_device: config.vaapi_device.clone(),
            vaapi_driver: config.vaapi_driver.clone(),
            output_format: OutputFormat::MpegTs,
            output_location: OutputLocation::Stdout,
            hls: None,
            user_agent: format!("tvstream/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    #[must_use]
    pub fn with_start(mut self, start: Duration) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_hls(mut self, hls: HlsSettings) -> Self {
        self.output_format = OutputFormat::Hls;
        self.hls = Some(hls);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, provider: &str, name: &str) -> Self {
        self.metadata_service_provider = Some(provider.to_string());
        self.metadata_service_name = Some(name.to_string());
        self
    }
}

/// Hardware modes resolved for one build, read by every later sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccelState {
    pub decoder: HardwareAccelerationMode,
    pub encoder: HardwareAccelerationMode,
}

impl AccelState {
    pub const SOFTWARE: AccelState = AccelState {
        decoder: HardwareAccelerationMode::None,
        encoder: HardwareAccelerationMode::None,
    };

    pub fn is_software(&self) -> bool {
        !self.decoder.is_hardware() && !self.encoder.is_hardware()
    }
}
