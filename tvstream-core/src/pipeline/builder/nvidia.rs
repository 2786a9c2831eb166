//! NVIDIA strategy: cuvid decoders, CUDA filters and NVENC encoders.

use log::debug;

use crate::media::VideoStream;
use crate::pipeline::builder::{
    BuildContext, HardwareStrategy, needs_deinterlace, output_allows_hardware_encode,
};
use crate::pipeline::decoder::nvidia_decoder_name;
use crate::pipeline::encoder::select_encoder;
use crate::pipeline::filter::Filter;
use crate::pipeline::options::GlobalOption;
use crate::pipeline::state::{AccelState, FfmpegState, FrameState};
use crate::pipeline::step::PipelineStep;
use crate::pipeline::types::{HardwareAccelerationMode, VideoFormat};

const MODE: HardwareAccelerationMode = HardwareAccelerationMode::Nvenc;

#[derive(Debug, Clone, Copy, Default)]
pub struct NvidiaStrategy;

impl HardwareStrategy for NvidiaStrategy {
    fn mode(&self) -> HardwareAccelerationMode {
        MODE
    }

    fn resolve_accel(
        &self,
        stream: &VideoStream,
        desired: &FrameState,
        ffmpeg_state: &FfmpegState,
    ) -> AccelState {
        let codec = VideoFormat::from(stream.codec.as_str());
        let mut can_decode = nvidia_decoder_name(&codec).is_some();
        // cuvid has no 10-bit h264 profile
        if codec == VideoFormat::H264 && stream.bit_depth() > 8 {
            debug!("Disabling NVIDIA decode of 10-bit h264");
            can_decode = false;
        }
        // interlaced mpeg2 goes through the software deinterlacer
        if codec == VideoFormat::Mpeg2Video && needs_deinterlace(stream, desired) {
            debug!("Disabling NVIDIA decode of interlaced mpeg2");
            can_decode = false;
        }
        let can_encode = select_encoder(&desired.video_format, MODE).is_some()
            && output_allows_hardware_encode(ffmpeg_state);

        AccelState {
            decoder: if can_decode { MODE } else { HardwareAccelerationMode::None },
            encoder: if can_encode { MODE } else { HardwareAccelerationMode::None },
        }
    }

    fn hardware_accel_steps(&self, ctx: &BuildContext<'_>) -> Vec<PipelineStep> {
        if ctx.accel.is_software() {
            return Vec::new();
        }
        vec![PipelineStep::Global(GlobalOption::CudaHardwareAcceleration)]
    }

    fn hardware_deinterlace(&self) -> Option<Filter> {
        Some(Filter::YadifCuda)
    }

    fn hardware_scale(&self, current: &FrameState, ctx: &BuildContext<'_>) -> Option<Filter> {
        Some(Filter::ScaleCuda {
            scaled: ctx.desired.scaled_size,
            padded: ctx.desired.padded_size,
            anamorphic: current.is_anamorphic,
            upload: !current.frame_data_location.is_hardware(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{FrameSize, PixelFormat};
    use crate::pipeline::types::OutputFormat;

    fn desired(format: VideoFormat) -> FrameState {
        FrameState::new(FrameSize::new(1280, 720), FrameSize::new(1280, 720)).with_video_format(format)
    }

    #[test]
    fn test_ten_bit_h264_decodes_in_software() {
        let stream = VideoStream::new(0, "h264", FrameSize::new(1920, 1080))
            .with_pixel_format(PixelFormat::Yuv420p10le);
        let accel = NvidiaStrategy.resolve_accel(&stream, &desired(VideoFormat::Hevc), &FfmpegState::default());
        assert_eq!(accel.decoder, HardwareAccelerationMode::None);
        assert_eq!(accel.encoder, MODE);
    }

    #[test]
    fn test_interlaced_mpeg2_decodes_in_software() {
        let stream = VideoStream::new(0, "mpeg2video", FrameSize::new(720, 480)).with_interlaced(true);
        let accel = NvidiaStrategy.resolve_accel(&stream, &desired(VideoFormat::H264), &FfmpegState::default());
        assert_eq!(accel.decoder, HardwareAccelerationMode::None);
    }

    #[test]
    fn test_nut_output_never_encodes_on_gpu() {
        let stream = VideoStream::new(0, "hevc", FrameSize::new(1920, 1080));
        let ffmpeg = FfmpegState::default().with_output_format(OutputFormat::Nut);
        let accel = NvidiaStrategy.resolve_accel(&stream, &desired(VideoFormat::Hevc), &ffmpeg);
        assert_eq!(accel.decoder, MODE);
        assert_eq!(accel.encoder, HardwareAccelerationMode::None);
    }
}
