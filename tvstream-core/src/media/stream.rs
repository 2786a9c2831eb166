// ============================================================================
// tvstream-core/src/media/stream.rs
// ============================================================================
//
// MEDIA STREAMS: Read-only Elementary Stream Descriptors
//
// One value per elementary stream inside an input. Streams are parsed once
// (from a probe or supplied by the caller) and never mutated afterwards; the
// pipeline builder only reads them to decide which steps are required.
//
// KEY COMPONENTS:
// - StreamKind: audio or video
// - VideoStream: codec, pixel format, frame size, aspect and interlacing
// - AudioStream: codec and channel count
// - StillImageStream: a single frame used as a looping video source
//
// AI-ASSISTANT-INFO: Immutable media stream descriptors

// ---- Standard library imports ----
use std::fmt;

// ---- External crate imports ----
use serde::{Deserialize, Serialize};

// ---- Internal crate imports ----
use super::format::{FrameSize, PixelFormat};

/// Kind of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Audio,
    Video,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// A video elementary stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStream {
    pub index: u32,
    pub codec: String,
    pub pixel_format: Option<PixelFormat>,
    pub frame_size: FrameSize,
    #[serde(default)]
    pub is_anamorphic: bool,
    /// Sample aspect ratio as `num:den`
    #[serde(default)]
    pub pixel_aspect_ratio: Option<String>,
    #[serde(default)]
    pub interlaced: bool,
    /// Average frame rate as reported by the probe, e.g. `30000/1001`
    #[serde(default)]
    pub frame_rate: Option<String>,
}

impl VideoStream {
    #[must_use]
    pub fn new(index: u32, codec: &str, frame_size: FrameSize) -> Self {
        Self {
            index,
            codec: codec.to_string(),
            pixel_format: None,
            frame_size,
            is_anamorphic: false,
            pixel_aspect_ratio: None,
            interlaced: false,
            frame_rate: None,
        }
    }

    #[must_use]
    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = Some(pixel_format);
        self
    }

    /// Marks the stream anamorphic with the given `num:den` sample aspect ratio.
    #[must_use]
    pub fn with_anamorphic(mut self, pixel_aspect_ratio: &str) -> Self {
        self.is_anamorphic = true;
        self.pixel_aspect_ratio = Some(pixel_aspect_ratio.to_string());
        self
    }

    #[must_use]
    pub fn with_interlaced(mut self, interlaced: bool) -> Self {
        self.interlaced = interlaced;
        self
    }

    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: &str) -> Self {
        self.frame_rate = Some(frame_rate.to_string());
        self
    }

    /// Bit depth of the stream's pixel format, 8 when unknown.
    pub fn bit_depth(&self) -> u8 {
        self.pixel_format.as_ref().map_or(8, PixelFormat::bit_depth)
    }

    /// Sample aspect ratio as a numerator/denominator pair.
    pub fn sample_aspect_ratio(&self) -> Option<(u64, u64)> {
        let sar = self.pixel_aspect_ratio.as_deref()?;
        let (num, den) = sar.split_once([':', '/'])?;
        let num: u64 = num.trim().parse().ok()?;
        let den: u64 = den.trim().parse().ok()?;
        (num > 0 && den > 0).then_some((num, den))
    }

    /// Largest frame size that fits inside `resolution` while keeping the
    /// display aspect ratio of this stream.
    ///
    /// Anamorphic streams are first normalised to square pixels by widening
    /// the stored width by the sample aspect ratio; the height is unchanged.
    pub fn square_pixel_frame_size(&self, resolution: FrameSize) -> FrameSize {
        let mut width = u64::from(self.frame_size.width);
        let height = u64::from(self.frame_size.height);
        if width == 0 || height == 0 {
            return resolution;
        }

        if self.is_anamorphic {
            if let Some((num, den)) = self.sample_aspect_ratio() {
                width = (width * num / den).max(1);
            }
        }

        let target_w = u64::from(resolution.width);
        let target_h = u64::from(resolution.height);

        // Width-limited when target_w / width <= target_h / height.
        if target_w * height <= target_h * width {
            FrameSize::new(resolution.width, (height * target_w / width) as u32)
        } else {
            FrameSize::new((width * target_h / height) as u32, resolution.height)
        }
    }
}

/// An audio elementary stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStream {
    pub index: u32,
    pub codec: String,
    pub channels: u32,
}

impl AudioStream {
    #[must_use]
    pub fn new(index: u32, codec: &str, channels: u32) -> Self {
        Self {
            index,
            codec: codec.to_string(),
            channels,
        }
    }
}

/// A still image used as a video source (offline screens, watermarks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StillImageStream {
    pub index: u32,
    pub frame_size: FrameSize,
    #[serde(default)]
    pub pixel_format: Option<PixelFormat>,
}

impl StillImageStream {
    #[must_use]
    pub fn new(index: u32, frame_size: FrameSize) -> Self {
        Self {
            index,
            frame_size,
            pixel_format: None,
        }
    }

    /// The image viewed as a single-frame video stream.
    pub fn as_video_stream(&self) -> VideoStream {
        VideoStream {
            index: self.index,
            codec: "png".to_string(),
            pixel_format: self.pixel_format.clone(),
            frame_size: self.frame_size,
            is_anamorphic: false,
            pixel_aspect_ratio: None,
            interlaced: false,
            frame_rate: None,
        }
    }
}
