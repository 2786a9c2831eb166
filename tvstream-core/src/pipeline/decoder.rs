//! Decoder selection.
//!
//! Decoders render as input options placed before the video input's `-i`.
//! Selection is total: every (codec, backend) pair maps to a decoder, and a
//! codec the backend cannot decode maps to the implicit software decoder.

use crate::media::VideoStream;
use crate::pipeline::state::FrameState;
use crate::pipeline::step::FrameStateUpdate;
use crate::pipeline::types::{FrameDataLocation, HardwareAccelerationMode, VideoFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoder {
    /// Let the transcoder pick its software decoder.
    Implicit,
    /// NVIDIA cuvid decoder, frames stay in CUDA memory.
    Cuvid(&'static str),
    /// Intel Quick Sync decoder, frames stay on QSV surfaces.
    Qsv(&'static str),
    /// VAAPI hwaccel decode, frames stay on VAAPI surfaces.
    Vaapi,
}

impl Decoder {
    pub fn input_args(&self) -> Vec<String> {
        match self {
            Self::Implicit => Vec::new(),
            Self::Cuvid(name) => vec![
                "-c:v".to_string(),
                (*name).to_string(),
                "-hwaccel_output_format".to_string(),
                "cuda".to_string(),
            ],
            Self::Qsv(name) => vec!["-c:v".to_string(), (*name).to_string()],
            Self::Vaapi => vec!["-hwaccel_output_format".to_string(), "vaapi".to_string()],
        }
    }

    pub fn output_location(&self) -> FrameDataLocation {
        match self {
            Self::Implicit => FrameDataLocation::Software,
            Self::Cuvid(_) => FrameDataLocation::Hardware(HardwareAccelerationMode::Nvenc),
            Self::Qsv(_) => FrameDataLocation::Hardware(HardwareAccelerationMode::Qsv),
            Self::Vaapi => FrameDataLocation::Hardware(HardwareAccelerationMode::Vaapi),
        }
    }
}

impl FrameStateUpdate for Decoder {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        current.clone().with_location(self.output_location())
    }
}

/// Name of the cuvid decoder for `codec`, if one exists.
pub fn nvidia_decoder_name(codec: &VideoFormat) -> Option<&'static str> {
    match codec {
        VideoFormat::H264 => Some("h264_cuvid"),
        VideoFormat::Hevc => Some("hevc_cuvid"),
        VideoFormat::Mpeg2Video => Some("mpeg2_cuvid"),
        VideoFormat::Mpeg4 => Some("mpeg4_cuvid"),
        VideoFormat::Vc1 => Some("vc1_cuvid"),
        VideoFormat::Vp9 => Some("vp9_cuvid"),
        VideoFormat::Av1 => Some("av1_cuvid"),
        VideoFormat::Copy | VideoFormat::Other(_) => None,
    }
}

/// Name of the QSV decoder for `codec`, if one exists.
pub fn qsv_decoder_name(codec: &VideoFormat) -> Option<&'static str> {
    match codec {
        VideoFormat::H264 => Some("h264_qsv"),
        VideoFormat::Hevc => Some("hevc_qsv"),
        VideoFormat::Mpeg2Video => Some("mpeg2_qsv"),
        VideoFormat::Vc1 => Some("vc1_qsv"),
        VideoFormat::Vp9 => Some("vp9_qsv"),
        VideoFormat::Av1 => Some("av1_qsv"),
        VideoFormat::Mpeg4 | VideoFormat::Copy | VideoFormat::Other(_) => None,
    }
}

/// Whether VAAPI hwaccel can decode `codec`.
pub fn vaapi_can_decode(codec: &VideoFormat) -> bool {
    matches!(
        codec,
        VideoFormat::H264
            | VideoFormat::Hevc
            | VideoFormat::Mpeg2Video
            | VideoFormat::Vc1
            | VideoFormat::Vp9
            | VideoFormat::Av1
    )
}

/// Selects the decoder for `stream` under the resolved decoder `mode`.
pub fn select_decoder(stream: &VideoStream, mode: HardwareAccelerationMode) -> Decoder {
    let codec = VideoFormat::from(stream.codec.as_str());
    match mode {
        HardwareAccelerationMode::None => Decoder::Implicit,
        HardwareAccelerationMode::Nvenc => {
            nvidia_decoder_name(&codec).map_or(Decoder::Implicit, Decoder::Cuvid)
        }
        HardwareAccelerationMode::Qsv => {
            qsv_decoder_name(&codec).map_or(Decoder::Implicit, Decoder::Qsv)
        }
        HardwareAccelerationMode::Vaapi => {
            if vaapi_can_decode(&codec) {
                Decoder::Vaapi
            } else {
                Decoder::Implicit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FrameSize;

    fn stream(codec: &str) -> VideoStream {
        VideoStream::new(0, codec, FrameSize::new(1920, 1080))
    }

    #[test]
    fn test_software_decoder_is_implicit() {
        let decoder = select_decoder(&stream("h264"), HardwareAccelerationMode::None);
        assert_eq!(decoder, Decoder::Implicit);
        assert!(decoder.input_args().is_empty());
    }

    #[test]
    fn test_cuvid_decoder_args() {
        let decoder = select_decoder(&stream("hevc"), HardwareAccelerationMode::Nvenc);
        assert_eq!(
            decoder.input_args(),
            vec!["-c:v", "hevc_cuvid", "-hwaccel_output_format", "cuda"]
        );
        assert!(decoder.output_location().is_hardware());
    }

    #[test]
    fn test_unknown_codec_falls_back_to_implicit() {
        for mode in HardwareAccelerationMode::ALL {
            assert_eq!(select_decoder(&stream("prores"), mode), Decoder::Implicit);
        }
    }

    #[test]
    fn test_decoder_updates_location() {
        let state = FrameState::new(FrameSize::new(640, 480), FrameSize::new(640, 480));
        let next = Decoder::Vaapi.next_state(&state);
        assert_eq!(
            next.frame_data_location,
            FrameDataLocation::Hardware(HardwareAccelerationMode::Vaapi)
        );
    }
}
