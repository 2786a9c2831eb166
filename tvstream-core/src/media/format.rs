//! Frame sizes and pixel formats.
//!
//! These are the scalar building blocks of the media descriptors: a
//! `FrameSize` parsed from `WIDTHxHEIGHT` strings and a closed set of
//! pixel formats with their ffmpeg names and bit depths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Width and height of a video frame in pixels.
///
/// Deserializing rejects zero dimensions; `new` does not, so descriptors
/// built in code are checked with `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Dimensions")]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize)]
struct Dimensions {
    width: u32,
    height: u32,
}

impl TryFrom<Dimensions> for FrameSize {
    type Error = CoreError;

    fn try_from(value: Dimensions) -> Result<Self, Self::Error> {
        let size = Self::new(value.width, value.height);
        size.validate()?;
        Ok(size)
    }
}

impl FrameSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parses a `WIDTHxHEIGHT` string, rejecting zero dimensions.
    pub fn parse(value: &str) -> CoreResult<Self> {
        value.parse()
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidResolution(self.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for FrameSize {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidResolution(s.to_string());
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Pixel formats the pipeline knows how to reason about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Yuv420p,
    Yuvj420p,
    Yuv420p10le,
    Yuv444p,
    Yuv444p10le,
    Nv12,
    P010le,
    Yuva420p,
    /// Any other format reported by the probe, kept verbatim.
    Other(String),
}

impl PixelFormat {
    /// Name used on the ffmpeg command line.
    pub fn ffmpeg_name(&self) -> &str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuvj420p => "yuvj420p",
            Self::Yuv420p10le => "yuv420p10le",
            Self::Yuv444p => "yuv444p",
            Self::Yuv444p10le => "yuv444p10le",
            Self::Nv12 => "nv12",
            Self::P010le => "p010le",
            Self::Yuva420p => "yuva420p",
            Self::Other(name) => name,
        }
    }

    pub fn bit_depth(&self) -> u8 {
        match self {
            Self::Yuv420p10le | Self::Yuv444p10le | Self::P010le => 10,
            Self::Other(name) if name.contains("10") || name.contains("p010") => 10,
            Self::Other(name) if name.contains("12") => 12,
            _ => 8,
        }
    }

    /// Hardware surface format matching this format's bit depth.
    pub fn hardware_surface_format(&self) -> PixelFormat {
        if self.bit_depth() > 8 {
            PixelFormat::P010le
        } else {
            PixelFormat::Nv12
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

impl FromStr for PixelFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(CoreError::InvalidPixelFormat(s.to_string()));
        }
        Ok(match name {
            "yuv420p" => Self::Yuv420p,
            "yuvj420p" => Self::Yuvj420p,
            "yuv420p10le" => Self::Yuv420p10le,
            "yuv444p" => Self::Yuv444p,
            "yuv444p10le" => Self::Yuv444p10le,
            "nv12" => Self::Nv12,
            "p010le" | "p010" => Self::P010le,
            "yuva420p" => Self::Yuva420p,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Serialize for PixelFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.ffmpeg_name())
    }
}

impl<'de> Deserialize<'de> for PixelFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_parse() {
        assert_eq!(FrameSize::parse("1920x1080").unwrap(), FrameSize::new(1920, 1080));
        assert_eq!(FrameSize::parse(" 640X480 ").unwrap(), FrameSize::new(640, 480));
    }

    #[test]
    fn test_frame_size_parse_rejects_malformed() {
        for bad in ["", "1920", "1920x", "x1080", "0x720", "1280x0", "axb", "-1x720"] {
            match FrameSize::parse(bad) {
                Err(CoreError::InvalidResolution(value)) => assert_eq!(value, bad),
                other => panic!("expected InvalidResolution for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_frame_size_is_rejected() {
        assert!(FrameSize::new(1280, 720).validate().is_ok());
        match FrameSize::new(0, 720).validate() {
            Err(CoreError::InvalidResolution(value)) => assert_eq!(value, "0x720"),
            other => panic!("expected InvalidResolution, got {other:?}"),
        }

        let err = serde_json::from_str::<FrameSize>(r#"{"width": 0, "height": 0}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid resolution"), "{err}");
        let size: FrameSize = serde_json::from_str(r#"{"width": 640, "height": 480}"#).unwrap();
        assert_eq!(size, FrameSize::new(640, 480));
    }

    #[test]
    fn test_pixel_format_bit_depth() {
        assert_eq!(PixelFormat::Yuv420p.bit_depth(), 8);
        assert_eq!(PixelFormat::Yuv420p10le.bit_depth(), 10);
        assert_eq!("yuv422p10le".parse::<PixelFormat>().unwrap().bit_depth(), 10);
        assert_eq!(PixelFormat::Yuv420p10le.hardware_surface_format(), PixelFormat::P010le);
        assert_eq!(PixelFormat::Yuv420p.hardware_surface_format(), PixelFormat::Nv12);
    }

    #[test]
    fn test_pixel_format_rejects_empty() {
        assert!("".parse::<PixelFormat>().is_err());
        assert!("yuv 420p".parse::<PixelFormat>().is_err());
    }
}
