//! Intel Quick Sync strategy.

use crate::media::VideoStream;
use crate::pipeline::builder::{BuildContext, HardwareStrategy, output_allows_hardware_encode};
use crate::pipeline::decoder::qsv_decoder_name;
use crate::pipeline::encoder::select_encoder;
use crate::pipeline::filter::Filter;
use crate::pipeline::options::GlobalOption;
use crate::pipeline::state::{AccelState, FfmpegState, FrameState};
use crate::pipeline::step::PipelineStep;
use crate::pipeline::types::{HardwareAccelerationMode, VideoFormat};

const MODE: HardwareAccelerationMode = HardwareAccelerationMode::Qsv;

#[derive(Debug, Clone, Copy, Default)]
pub struct QsvStrategy;

impl HardwareStrategy for QsvStrategy {
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
        let ten_bit_avc_or_hevc =
            matches!(codec, VideoFormat::H264 | VideoFormat::Hevc) && stream.bit_depth() > 8;
        let can_decode = qsv_decoder_name(&codec).is_some() && !ten_bit_avc_or_hevc;
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
        vec![PipelineStep::Global(GlobalOption::QsvHardwareAcceleration {
            device: ctx.ffmpeg_state.vaapi_device.clone(),
            decode: ctx.accel.decoder.is_hardware(),
        })]
    }

    fn hardware_deinterlace(&self) -> Option<Filter> {
        Some(Filter::DeinterlaceQsv)
    }

    fn hardware_scale(&self, current: &FrameState, ctx: &BuildContext<'_>) -> Option<Filter> {
        let sample_aspect_ratio = if current.is_anamorphic {
            ctx.video_stream.pixel_aspect_ratio.clone()
        } else {
            None
        };
        Some(Filter::ScaleQsv {
            scaled: ctx.desired.scaled_size,
            sample_aspect_ratio,
            upload: !current.frame_data_location.is_hardware(),
        })
    }
}
