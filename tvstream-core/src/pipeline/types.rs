// ============================================================================
// tvstream-core/src/pipeline/types.rs
// ============================================================================
//
// PIPELINE TYPES: Closed Enumerations Shared by the Pipeline Compiler
//
// Every decision the builder makes is keyed on one of these small enums.
// They are closed on purpose: adding a hardware backend or output format
// forces every `match` that depends on it to be revisited.
//
// KEY COMPONENTS:
// - HardwareAccelerationMode: none / nvenc / qsv / vaapi
// - FrameDataLocation: where decoded frames currently live
// - VideoFormat: target or source video codec
// - OutputFormat / OutputLocation: muxer and destination
// - InputProtocol / Continuity / InputRole: how an input is read
//
// AI-ASSISTANT-INFO: Enumerations used by the transcode pipeline compiler

// ---- Standard library imports ----
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ---- External crate imports ----
use serde::{Deserialize, Serialize};

/// Hardware backend used for decode and/or encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareAccelerationMode {
    #[default]
    None,
    Nvenc,
    Qsv,
    Vaapi,
}

impl HardwareAccelerationMode {
    pub const ALL: [HardwareAccelerationMode; 4] = [Self::None, Self::Nvenc, Self::Qsv, Self::Vaapi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Nvenc => "nvenc",
            Self::Qsv => "qsv",
            Self::Vaapi => "vaapi",
        }
    }

    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for HardwareAccelerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HardwareAccelerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "software" | "" => Ok(Self::None),
            "nvenc" | "nvidia" | "cuda" => Ok(Self::Nvenc),
            "qsv" => Ok(Self::Qsv),
            "vaapi" => Ok(Self::Vaapi),
            other => Err(format!(
                "unknown hardware acceleration mode '{other}' (expected none, nvenc, qsv or vaapi)"
            )),
        }
    }
}

/// Where decoded frame data currently resides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameDataLocation {
    #[default]
    Unknown,
    Software,
    Hardware(HardwareAccelerationMode),
}

impl FrameDataLocation {
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_))
    }

    pub fn is_software(&self) -> bool {
        matches!(self, Self::Software)
    }
}

/// Video codec names as used by the transcoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VideoFormat {
    Hevc,
    H264,
    Mpeg2Video,
    Mpeg4,
    Vc1,
    Vp9,
    Av1,
    Copy,
    Other(String),
}

impl VideoFormat {
    pub fn name(&self) -> &str {
        match self {
            Self::Hevc => "hevc",
            Self::H264 => "h264",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg4 => "mpeg4",
            Self::Vc1 => "vc1",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::Copy => "copy",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for VideoFormat {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hevc" | "h265" => Self::Hevc,
            "h264" | "avc" => Self::H264,
            "mpeg2video" | "mpeg2" => Self::Mpeg2Video,
            "mpeg4" => Self::Mpeg4,
            "vc1" => Self::Vc1,
            "vp9" => Self::Vp9,
            "av1" => Self::Av1,
            "copy" => Self::Copy,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for VideoFormat {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<VideoFormat> for String {
    fn from(value: VideoFormat) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output muxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    MpegTs,
    Mkv,
    Mp4,
    Nut,
    Hls,
}

/// Destination of the muxed output. HLS output always writes its playlist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputLocation {
    #[default]
    Stdout,
    File(PathBuf),
}

/// How an input is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputProtocol {
    #[default]
    File,
    Http,
    /// Generated by a libavfilter source, e.g. `color=c=black`
    Lavfi,
}

/// Whether an input is a finite item or an endless feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Continuity {
    #[default]
    Discrete,
    Continuous,
}

/// Role an input plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputRole {
    Video,
    StillImage,
    Audio,
    Watermark,
    Concat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_mode_parse_aliases() {
        assert_eq!("cuda".parse::<HardwareAccelerationMode>().unwrap(), HardwareAccelerationMode::Nvenc);
        assert_eq!("Software".parse::<HardwareAccelerationMode>().unwrap(), HardwareAccelerationMode::None);
        assert!("videotoolbox".parse::<HardwareAccelerationMode>().is_err());
    }

    #[test]
    fn test_hardware_mode_round_trips_display() {
        for mode in HardwareAccelerationMode::ALL {
            assert_eq!(mode.to_string().parse::<HardwareAccelerationMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_video_format_aliases_and_other() {
        assert_eq!(VideoFormat::from("H265"), VideoFormat::Hevc);
        assert_eq!(VideoFormat::from("mpeg2"), VideoFormat::Mpeg2Video);
        assert_eq!(VideoFormat::from("prores"), VideoFormat::Other("prores".to_string()));
        assert_eq!(VideoFormat::from("prores").name(), "prores");
    }
}
