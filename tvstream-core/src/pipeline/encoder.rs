//! Video and audio encoders.
//!
//! `select_encoder` is the hardware table and returns `None` for a codec the
//! backend cannot encode; `software_encoder` is the fallback table and fails
//! the build for a codec it does not know.

use crate::error::{CoreError, CoreResult};
use crate::pipeline::state::FrameState;
use crate::pipeline::step::FrameStateUpdate;
use crate::pipeline::types::{FrameDataLocation, HardwareAccelerationMode, VideoFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoEncoder {
    Libx265,
    Libx264,
    Mpeg2Video,
    Copy,
    /// Uncompressed output for the NUT intermediate format
    RawVideo,
    NvencHevc,
    NvencH264,
    QsvHevc,
    QsvH264,
    QsvMpeg2,
    VaapiHevc,
    VaapiH264,
    VaapiMpeg2,
}

impl VideoEncoder {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Libx265 => "libx265",
            Self::Libx264 => "libx264",
            Self::Mpeg2Video => "mpeg2video",
            Self::Copy => "copy",
            Self::RawVideo => "rawvideo",
            Self::NvencHevc => "hevc_nvenc",
            Self::NvencH264 => "h264_nvenc",
            Self::QsvHevc => "hevc_qsv",
            Self::QsvH264 => "h264_qsv",
            Self::QsvMpeg2 => "mpeg2_qsv",
            Self::VaapiHevc => "hevc_vaapi",
            Self::VaapiH264 => "h264_vaapi",
            Self::VaapiMpeg2 => "mpeg2_vaapi",
        }
    }

    /// Backend that runs this encoder, `None` for software encoders.
    pub fn hardware_mode(&self) -> HardwareAccelerationMode {
        match self {
            Self::Libx265 | Self::Libx264 | Self::Mpeg2Video | Self::Copy | Self::RawVideo => {
                HardwareAccelerationMode::None
            }
            Self::NvencHevc | Self::NvencH264 => HardwareAccelerationMode::Nvenc,
            Self::QsvHevc | Self::QsvH264 | Self::QsvMpeg2 => HardwareAccelerationMode::Qsv,
            Self::VaapiHevc | Self::VaapiH264 | Self::VaapiMpeg2 => HardwareAccelerationMode::Vaapi,
        }
    }

    pub fn is_hardware(&self) -> bool {
        self.hardware_mode().is_hardware()
    }

    pub fn output_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.name().to_string()];
        let extra: &[&str] = match self {
            Self::Libx265 => &["-tag:v", "hvc1", "-x265-params", "log-level=error"],
            Self::NvencHevc => &["-b_ref_mode", "0"],
            Self::QsvHevc | Self::QsvH264 | Self::QsvMpeg2 => &["-low_power", "0", "-look_ahead", "0"],
            Self::VaapiHevc | Self::VaapiH264 | Self::VaapiMpeg2 => &["-rc_mode", "VBR"],
            _ => &[],
        };
        args.extend(extra.iter().map(|s| (*s).to_string()));
        args
    }
}

impl FrameStateUpdate for VideoEncoder {
    fn affects_frame_state(&self) -> bool {
        matches!(self, Self::Libx265)
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        match self {
            Self::Libx265 => current.clone().with_location(FrameDataLocation::Software),
            _ => current.clone(),
        }
    }
}

/// Audio encoder by transcoder name, e.g. `aac`, `ac3` or `copy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioEncoder(pub String);

impl AudioEncoder {
    pub fn copy() -> Self {
        Self("copy".to_string())
    }

    pub fn output_args(&self) -> Vec<String> {
        vec!["-c:a".to_string(), self.0.clone()]
    }
}

/// Hardware encoder for `format` on `mode`, if the backend has one.
pub fn select_encoder(format: &VideoFormat, mode: HardwareAccelerationMode) -> Option<VideoEncoder> {
    match mode {
        HardwareAccelerationMode::None => None,
        HardwareAccelerationMode::Nvenc => match format {
            VideoFormat::Hevc => Some(VideoEncoder::NvencHevc),
            VideoFormat::H264 => Some(VideoEncoder::NvencH264),
            _ => None,
        },
        HardwareAccelerationMode::Qsv => match format {
            VideoFormat::Hevc => Some(VideoEncoder::QsvHevc),
            VideoFormat::H264 => Some(VideoEncoder::QsvH264),
            VideoFormat::Mpeg2Video => Some(VideoEncoder::QsvMpeg2),
            _ => None,
        },
        HardwareAccelerationMode::Vaapi => match format {
            VideoFormat::Hevc => Some(VideoEncoder::VaapiHevc),
            VideoFormat::H264 => Some(VideoEncoder::VaapiH264),
            VideoFormat::Mpeg2Video => Some(VideoEncoder::VaapiMpeg2),
            _ => None,
        },
    }
}

/// Software encoder for `format`. `mode` is only used to describe the failure.
pub fn software_encoder(format: &VideoFormat, mode: HardwareAccelerationMode) -> CoreResult<VideoEncoder> {
    match format {
        VideoFormat::Hevc => Ok(VideoEncoder::Libx265),
        VideoFormat::H264 => Ok(VideoEncoder::Libx264),
        VideoFormat::Mpeg2Video => Ok(VideoEncoder::Mpeg2Video),
        VideoFormat::Copy => Ok(VideoEncoder::Copy),
        other => Err(CoreError::NoEncoder {
            codec: other.name().to_string(),
            mode: mode.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FrameSize;

    #[test]
    fn test_libx265_args_and_state() {
        let encoder = software_encoder(&VideoFormat::Hevc, HardwareAccelerationMode::None).unwrap();
        assert_eq!(
            encoder.output_args(),
            vec!["-c:v", "libx265", "-tag:v", "hvc1", "-x265-params", "log-level=error"]
        );
        let state = FrameState::new(FrameSize::new(1280, 720), FrameSize::new(1280, 720))
            .with_location(FrameDataLocation::Hardware(HardwareAccelerationMode::Nvenc));
        assert!(encoder.affects_frame_state());
        assert_eq!(encoder.next_state(&state).frame_data_location, FrameDataLocation::Software);
    }

    #[test]
    fn test_hardware_tables() {
        assert_eq!(
            select_encoder(&VideoFormat::Hevc, HardwareAccelerationMode::Nvenc),
            Some(VideoEncoder::NvencHevc)
        );
        assert_eq!(select_encoder(&VideoFormat::Mpeg2Video, HardwareAccelerationMode::Nvenc), None);
        assert_eq!(
            select_encoder(&VideoFormat::Mpeg2Video, HardwareAccelerationMode::Qsv),
            Some(VideoEncoder::QsvMpeg2)
        );
        assert_eq!(select_encoder(&VideoFormat::H264, HardwareAccelerationMode::None), None);
    }

    #[test]
    fn test_every_hardware_encoder_reports_its_backend() {
        for mode in HardwareAccelerationMode::ALL {
            for format in [VideoFormat::Hevc, VideoFormat::H264, VideoFormat::Mpeg2Video] {
                if let Some(encoder) = select_encoder(&format, mode) {
                    assert_eq!(encoder.hardware_mode(), mode);
                }
            }
        }
    }

    #[test]
    fn test_unknown_software_format_is_an_error() {
        let err = software_encoder(&VideoFormat::Av1, HardwareAccelerationMode::Qsv).unwrap_err();
        match err {
            CoreError::NoEncoder { codec, mode } => {
                assert_eq!(codec, "av1");
                assert_eq!(mode, "qsv");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_qsv_encoder_args() {
        assert_eq!(
            VideoEncoder::QsvH264.output_args(),
            vec!["-c:v", "h264_qsv", "-low_power", "0", "-look_ahead", "0"]
        );
        assert_eq!(AudioEncoder::copy().output_args(), vec!["-c:a", "copy"]);
    }
}
