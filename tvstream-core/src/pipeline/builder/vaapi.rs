//! VAAPI strategy. Requires a render device; without one every build is software.

use log::debug;

use crate::media::VideoStream;
use crate::pipeline::builder::{BuildContext, HardwareStrategy, output_allows_hardware_encode};
use crate::pipeline::decoder::vaapi_can_decode;
use crate::pipeline::encoder::select_encoder;
use crate::pipeline::filter::Filter;
use crate::pipeline::options::{EnvironmentVariable, GlobalOption};
use crate::pipeline::state::{AccelState, FfmpegState, FrameState};
use crate::pipeline::step::PipelineStep;
use crate::pipeline::types::{HardwareAccelerationMode, VideoFormat};

const MODE: HardwareAccelerationMode = HardwareAccelerationMode::Vaapi;

#[derive(Debug, Clone, Copy, Default)]
pub struct VaapiStrategy;

impl HardwareStrategy for VaapiStrategy {
    fn mode(&self) -> HardwareAccelerationMode {
        MODE
    }

    fn resolve_accel(
        &self,
        stream: &VideoStream,
        desired: &FrameState,
        ffmpeg_state: &FfmpegState,
    ) -> AccelState {
        if ffmpeg_state.vaapi_device.is_none() {
            debug!("No VAAPI device configured");
            return AccelState::SOFTWARE;
        }
        let codec = VideoFormat::from(stream.codec.as_str());
        let can_decode = vaapi_can_decode(&codec);
        let can_encode = select_encoder(&desired.video_format, MODE).is_some()
            && output_allows_hardware_encode(ffmpeg_state);

        AccelState {
            decoder: if can_decode { MODE } else { HardwareAccelerationMode::None },
            encoder: if can_encode { MODE } else { HardwareAccelerationMode::None },
        }
    }

    fn hardware_accel_steps(&self, ctx: &BuildContext<'_>) -> Vec<PipelineStep> {
        let Some(device) = ctx.ffmpeg_state.vaapi_device.clone() else {
            return Vec::new();
        };
        if ctx.accel.is_software() {
            return Vec::new();
        }
        let mut steps = vec![PipelineStep::Global(GlobalOption::VaapiHardwareAcceleration {
            device,
            decode: ctx.accel.decoder.is_hardware(),
        })];
        if let Some(driver) = &ctx.ffmpeg_state.vaapi_driver {
            steps.push(PipelineStep::Environment(EnvironmentVariable::VaapiDriver(driver.clone())));
        }
        steps
    }

    fn hardware_deinterlace(&self) -> Option<Filter> {
        Some(Filter::DeinterlaceVaapi)
    }

    fn hardware_scale(&self, current: &FrameState, ctx: &BuildContext<'_>) -> Option<Filter> {
        Some(Filter::ScaleVaapi {
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
    use crate::media::FrameSize;

    #[test]
    fn test_no_device_means_software() {
        let stream = VideoStream::new(0, "h264", FrameSize::new(1920, 1080));
        let desired = FrameState::new(FrameSize::new(1280, 720), FrameSize::new(1280, 720))
            .with_video_format(VideoFormat::H264);
        let accel = VaapiStrategy.resolve_accel(&stream, &desired, &FfmpegState::default());
        assert!(accel.is_software());

        let mut ffmpeg = FfmpegState::default();
        ffmpeg.vaapi_device = Some("/dev/dri/renderD128".to_string());
        let accel = VaapiStrategy.resolve_accel(&stream, &desired, &ffmpeg);
        assert_eq!(accel.decoder, MODE);
        assert_eq!(accel.encoder, MODE);
    }
}
