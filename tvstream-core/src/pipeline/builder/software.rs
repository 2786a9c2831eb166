//! Software strategy: every default of `HardwareStrategy`.

use crate::pipeline::builder::HardwareStrategy;
use crate::pipeline::types::HardwareAccelerationMode;

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareStrategy;

impl HardwareStrategy for SoftwareStrategy {
    fn mode(&self) -> HardwareAccelerationMode {
        HardwareAccelerationMode::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{FrameSize, VideoStream};
    use crate::pipeline::state::{AccelState, FfmpegState, FrameState};

    #[test]
    fn test_software_never_accelerates() {
        let stream = VideoStream::new(0, "h264", FrameSize::new(1920, 1080));
        let desired = FrameState::new(FrameSize::new(1280, 720), FrameSize::new(1280, 720));
        let accel = SoftwareStrategy.resolve_accel(&stream, &desired, &FfmpegState::default());
        assert_eq!(accel, AccelState::SOFTWARE);
        assert!(SoftwareStrategy.hardware_deinterlace().is_none());
    }
}
