// ============================================================================
// tvstream-core/src/stream/item.rs
// ============================================================================
//
// PLAYABLE ITEMS: What to Play and How the Channel Wants It
//
// A `PlayableItem` is a program (or screen) that has already been chosen and
// resolved to a path with known streams. An `OutputProfile` is the channel's
// desired output. Both are plain serde values so they can be read from JSON.
//
// KEY COMPONENTS:
// - ItemKind: program, commercial, filler, offline screen, error screen
// - PlayableItem: path, protocol, streams, seek and duration
// - OutputProfile: resolution, codecs, bitrates, hardware mode, watermark
// - WatermarkDescriptor: image and placement of a channel watermark
//
// AI-ASSISTANT-INFO: Input contract of the streaming layer

// ---- Standard library imports ----
use std::time::Duration;

// ---- External crate imports ----
use serde::{Deserialize, Serialize};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::media::{AudioStream, FrameSize, PixelFormat, StillImageStream, VideoStream};
use crate::pipeline::input::WatermarkSettings;
use crate::pipeline::state::{AudioState, FrameState};
use crate::pipeline::types::{
    Continuity, HardwareAccelerationMode, InputProtocol, OutputFormat, VideoFormat,
};
use crate::stream::throttle::ThrottleKey;

/// What kind of thing an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Program,
    Commercial,
    Filler,
    /// Shown while the channel has nothing scheduled
    Offline,
    /// Shown when the scheduled item cannot be played
    Error,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Commercial => "commercial",
            Self::Filler => "filler",
            Self::Offline => "offline",
            Self::Error => "error",
        }
    }

    /// Offline and error screens.
    pub fn is_screen(&self) -> bool {
        matches!(self, Self::Offline | Self::Error)
    }
}

/// A resolved item ready to be compiled into a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableItem {
    #[serde(default)]
    pub kind: ItemKind,
    pub path: String,
    #[serde(default)]
    pub protocol: InputProtocol,
    #[serde(default)]
    pub continuity: Continuity,
    #[serde(default)]
    pub video: Option<VideoStream>,
    /// Set instead of `video` for image-only items
    #[serde(default)]
    pub still_image: Option<StillImageStream>,
    #[serde(default)]
    pub audio: Option<AudioStream>,
    /// Audio read from a different file than the video
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub start_ms: Option<u64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl PlayableItem {
    pub fn new(path: &str, video: VideoStream) -> Self {
        Self {
            kind: ItemKind::Program,
            path: path.to_string(),
            protocol: InputProtocol::File,
            continuity: Continuity::Discrete,
            video: Some(video),
            still_image: None,
            audio: None,
            audio_path: None,
            start_ms: None,
            duration_ms: None,
        }
    }

    /// An offline or error screen showing `image` for `duration`.
    pub fn screen(kind: ItemKind, path: &str, image: StillImageStream, duration: Duration) -> Self {
        Self {
            kind,
            path: path.to_string(),
            protocol: InputProtocol::File,
            continuity: Continuity::Discrete,
            video: None,
            still_image: Some(image),
            audio: None,
            audio_path: None,
            start_ms: None,
            duration_ms: Some(duration.as_millis() as u64),
        }
    }

    #[must_use]
    pub fn with_audio(mut self, audio: AudioStream) -> Self {
        self.audio = Some(audio);
        self
    }

    #[must_use]
    pub fn with_start(mut self, start: Duration) -> Self {
        self.start_ms = Some(start.as_millis() as u64);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    pub fn start(&self) -> Option<Duration> {
        self.start_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }

    /// Rejects items the builder cannot turn into a pipeline.
    pub fn validate(&self) -> CoreResult<()> {
        if self.path.trim().is_empty() {
            return Err(CoreError::MissingField { field: "path" });
        }
        let frame_size = match (&self.video, &self.still_image) {
            (None, None) => return Err(CoreError::MissingField { field: "video stream" }),
            (Some(_), Some(_)) => {
                return Err(CoreError::InvalidDescriptor(format!(
                    "{} has both a video stream and a still image",
                    self.path
                )));
            }
            (Some(video), None) => video.frame_size,
            (None, Some(image)) => image.frame_size,
        };
        frame_size.validate()?;
        if self.duration_ms == Some(0) {
            return Err(CoreError::InvalidDescriptor(format!("{} has a zero duration", self.path)));
        }
        Ok(())
    }

    /// Key used to spot clients reconnecting to the same item in a loop.
    pub fn throttle_key(&self) -> ThrottleKey {
        ThrottleKey::new(format!("{}:{}", self.kind.as_str(), self.path), self.kind.is_screen())
    }
}

/// A channel watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkDescriptor {
    pub path: String,
    pub image: StillImageStream,
    /// Animated images are looped instead of read once
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub settings: WatermarkSettings,
}

/// Values written into the output's service metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub provider: String,
    pub name: String,
}

/// The output a channel wants, independent of the item being played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputProfile {
    pub resolution: FrameSize,
    pub video_format: VideoFormat,
    pub pixel_format: Option<PixelFormat>,
    pub frame_rate: Option<u32>,
    /// kbit/s
    pub video_bitrate: Option<u32>,
    /// kbit
    pub video_buffer_size: Option<u32>,
    pub video_track_timescale: Option<u32>,
    pub deinterlace: bool,
    pub realtime: bool,
    pub audio: AudioState,
    pub hardware_acceleration: HardwareAccelerationMode,
    pub output_format: OutputFormat,
    pub watermark: Option<WatermarkDescriptor>,
    pub metadata: Option<ServiceMetadata>,
}

impl Default for OutputProfile {
    fn default() -> Self {
        Self {
            resolution: FrameSize::new(1920, 1080),
            video_format: VideoFormat::H264,
            pixel_format: None,
            frame_rate: None,
            video_bitrate: None,
            video_buffer_size: None,
            video_track_timescale: None,
            deinterlace: true,
            realtime: true,
            audio: AudioState::default(),
            hardware_acceleration: HardwareAccelerationMode::None,
            output_format: OutputFormat::MpegTs,
            watermark: None,
            metadata: None,
        }
    }
}

impl OutputProfile {
    /// Rejects profiles with a zero resolution or watermark size.
    pub fn validate(&self) -> CoreResult<()> {
        self.resolution.validate()?;
        if let Some(watermark) = &self.watermark {
            watermark.image.frame_size.validate()?;
        }
        Ok(())
    }

    /// The frame state this profile asks for when playing `stream`.
    ///
    /// The picture is fitted inside the resolution and padded up to it.
    pub fn desired_frame_state(&self, stream: &VideoStream) -> FrameState {
        let scaled = stream.square_pixel_frame_size(self.resolution);
        let mut state = FrameState::new(scaled, self.resolution)
            .with_video_format(self.video_format.clone())
            .with_realtime(self.realtime)
            .with_interlaced(!self.deinterlace);
        state.pixel_format = self.pixel_format.clone();
        state.frame_rate = self.frame_rate;
        state.video_bitrate = self.video_bitrate;
        state.video_buffer_size = self.video_buffer_size;
        state.video_track_timescale = self.video_track_timescale;
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_from_json_uses_defaults() {
        let json = r#"{
            "path": "/media/movie.mkv",
            "video": {"index": 0, "codec": "h264", "pixel_format": "yuv420p",
                      "frame_size": {"width": 1920, "height": 1080}},
            "audio": {"index": 1, "codec": "ac3", "channels": 6},
            "start_ms": 30000
        }"#;
        let item: PlayableItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Program);
        assert_eq!(item.protocol, InputProtocol::File);
        assert_eq!(item.start(), Some(Duration::from_secs(30)));
        assert_eq!(item.duration(), None);
        item.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_missing_streams() {
        let mut item = PlayableItem::new("/media/a.mkv", VideoStream::new(0, "h264", FrameSize::new(640, 480)));
        item.video = None;
        assert!(matches!(item.validate(), Err(CoreError::MissingField { field: "video stream" })));

        item.still_image = Some(StillImageStream::new(0, FrameSize::new(640, 480)));
        item.video = Some(VideoStream::new(0, "h264", FrameSize::new(640, 480)));
        assert!(matches!(item.validate(), Err(CoreError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_validate_rejects_zero_frame_sizes() {
        let item = PlayableItem::new("/media/a.mkv", VideoStream::new(0, "h264", FrameSize::new(0, 0)));
        assert!(matches!(item.validate(), Err(CoreError::InvalidResolution(_))));

        let image = StillImageStream::new(0, FrameSize::new(1920, 0));
        let screen = PlayableItem::screen(ItemKind::Offline, "/img/offline.png", image, Duration::from_secs(5));
        assert!(matches!(screen.validate(), Err(CoreError::InvalidResolution(_))));

        let profile = OutputProfile {
            resolution: FrameSize::new(0, 720),
            ..OutputProfile::default()
        };
        match profile.validate() {
            Err(CoreError::InvalidResolution(value)) => assert_eq!(value, "0x720"),
            other => panic!("expected InvalidResolution, got {other:?}"),
        }
        assert!(OutputProfile::default().validate().is_ok());
    }

    #[test]
    fn test_zero_frame_size_in_json_fails_to_load() {
        let json = r#"{"path": "/media/a.mkv",
            "video": {"index": 0, "codec": "h264", "frame_size": {"width": 0, "height": 0}}}"#;
        assert!(serde_json::from_str::<PlayableItem>(json).is_err());
    }

    #[test]
    fn test_throttle_key_marks_screens() {
        let image = StillImageStream::new(0, FrameSize::new(1920, 1080));
        let screen = PlayableItem::screen(ItemKind::Offline, "/img/offline.png", image, Duration::from_secs(30));
        assert!(screen.throttle_key().offline);
        assert_eq!(screen.duration(), Some(Duration::from_secs(30)));

        let program = PlayableItem::new("/media/a.mkv", VideoStream::new(0, "h264", FrameSize::new(640, 480)));
        assert_eq!(program.throttle_key().key, "program:/media/a.mkv");
        assert!(!program.throttle_key().offline);
    }

    #[test]
    fn test_profile_from_partial_json() {
        let profile: OutputProfile = serde_json::from_str(
            r#"{"resolution": {"width": 1280, "height": 720}, "video_format": "hevc",
                "hardware_acceleration": "nvenc"}"#,
        )
        .unwrap();
        assert_eq!(profile.video_format, VideoFormat::Hevc);
        assert_eq!(profile.hardware_acceleration, HardwareAccelerationMode::Nvenc);
        assert_eq!(profile.output_format, OutputFormat::MpegTs);
        assert!(profile.deinterlace);
    }

    #[test]
    fn test_desired_state_letterboxes_narrow_sources() {
        let profile = OutputProfile {
            resolution: FrameSize::new(1920, 1080),
            ..OutputProfile::default()
        };
        let stream = VideoStream::new(0, "mpeg2video", FrameSize::new(720, 540));
        let desired = profile.desired_frame_state(&stream);
        assert_eq!(desired.scaled_size, FrameSize::new(1440, 1080));
        assert_eq!(desired.padded_size, FrameSize::new(1920, 1080));
        assert!(!desired.interlaced);
    }
}
