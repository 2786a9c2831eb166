//! Input sources.
//!
//! An `InputSource` is one `-i` on the transcoder command line together with
//! the options rendered before it and the filters that apply to its streams.
//! The typed wrappers carry the stream descriptors each role needs.

use serde::{Deserialize, Serialize};

use crate::media::{AudioStream, StillImageStream, VideoStream};
use crate::pipeline::filter::Filter;
use crate::pipeline::options::InputOption;
use crate::pipeline::state::AudioState;
use crate::pipeline::types::{Continuity, InputProtocol, InputRole};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    pub path: String,
    pub protocol: InputProtocol,
    pub continuity: Continuity,
    pub role: InputRole,
    options: Vec<InputOption>,
    filter_steps: Vec<Filter>,
}

impl InputSource {
    pub fn new(path: &str, protocol: InputProtocol, continuity: Continuity, role: InputRole) -> Self {
        let mut source = Self {
            path: path.to_string(),
            protocol,
            continuity,
            role,
            options: Vec::new(),
            filter_steps: Vec::new(),
        };
        if protocol == InputProtocol::Lavfi {
            source.options.push(InputOption::Lavfi);
        }
        source
    }

    /// Attaches `option` if it applies to this input. Returns whether it was kept.
    pub fn add_option(&mut self, option: InputOption) -> bool {
        if option.applies_to(self) {
            self.options.push(option);
            true
        } else {
            false
        }
    }

    pub fn options(&self) -> &[InputOption] {
        &self.options
    }

    pub fn add_filter(&mut self, filter: Filter) {
        self.filter_steps.push(filter);
    }

    pub fn filter_steps(&self) -> &[Filter] {
        &self.filter_steps
    }

    pub fn is_http(&self) -> bool {
        self.protocol == InputProtocol::Http
    }

    /// Options followed by `-i <path>`.
    pub fn input_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.options.iter().flat_map(InputOption::args).collect();
        args.push("-i".to_string());
        args.push(self.path.clone());
        args
    }
}

/// The primary input. Its streams are always input index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInputSource {
    pub source: InputSource,
    pub streams: Vec<VideoStream>,
}

impl VideoInputSource {
    pub fn new(path: &str, protocol: InputProtocol, continuity: Continuity, stream: VideoStream) -> Self {
        Self {
            source: InputSource::new(path, protocol, continuity, InputRole::Video),
            streams: vec![stream],
        }
    }

    /// A still image played as video.
    pub fn still_image(path: &str, image: &StillImageStream) -> Self {
        Self {
            source: InputSource::new(
                path,
                InputProtocol::File,
                Continuity::Discrete,
                InputRole::StillImage,
            ),
            streams: vec![image.as_video_stream()],
        }
    }

    pub fn is_still_image(&self) -> bool {
        self.source.role == InputRole::StillImage
    }

    pub fn first_stream(&self) -> Option<&VideoStream> {
        self.streams.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInputSource {
    pub source: InputSource,
    pub streams: Vec<AudioStream>,
    pub desired_state: AudioState,
}

impl AudioInputSource {
    pub fn new(
        path: &str,
        protocol: InputProtocol,
        continuity: Continuity,
        stream: AudioStream,
        desired_state: AudioState,
    ) -> Self {
        Self {
            source: InputSource::new(path, protocol, continuity, InputRole::Audio),
            streams: vec![stream],
            desired_state,
        }
    }
}

/// Corner the watermark is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

/// Placement of a watermark. Margins and width are percentages of the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    pub position: WatermarkPosition,
    pub width_percent: f64,
    pub horizontal_margin: f64,
    pub vertical_margin: f64,
    /// 0-100
    pub opacity: u32,
    /// Keep the image's own size instead of scaling to `width_percent`
    pub fixed_size: bool,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            position: WatermarkPosition::BottomRight,
            width_percent: 10.0,
            horizontal_margin: 5.0,
            vertical_margin: 5.0,
            opacity: 100,
            fixed_size: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkInputSource {
    pub source: InputSource,
    pub stream: StillImageStream,
    pub is_still_image: bool,
    pub settings: WatermarkSettings,
}

impl WatermarkInputSource {
    pub fn new(path: &str, stream: StillImageStream, is_still_image: bool, settings: WatermarkSettings) -> Self {
        Self {
            source: InputSource::new(path, InputProtocol::File, Continuity::Discrete, InputRole::Watermark),
            stream,
            is_still_image,
            settings,
        }
    }
}

/// A concat demuxer list, local or served over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatInputSource {
    pub source: InputSource,
}

impl ConcatInputSource {
    pub fn new(path: &str, protocol: InputProtocol) -> Self {
        Self {
            source: InputSource::new(path, protocol, Continuity::Continuous, InputRole::Concat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FrameSize;
    use std::time::Duration;

    #[test]
    fn test_add_option_filters_inapplicable_options() {
        let image = StillImageStream::new(0, FrameSize::new(1920, 1080));
        let mut input = VideoInputSource::still_image("offline.png", &image);
        assert!(!input.source.add_option(InputOption::StreamSeek(Duration::from_secs(5))));
        assert!(input.source.options().is_empty());
        assert!(input.is_still_image());
    }

    #[test]
    fn test_lavfi_inputs_get_format_option() {
        let input = InputSource::new("anullsrc", InputProtocol::Lavfi, Continuity::Discrete, InputRole::Audio);
        assert_eq!(input.input_args(), vec!["-f", "lavfi", "-i", "anullsrc"]);
    }

    #[test]
    fn test_input_args_place_options_before_path() {
        let mut input = InputSource::new("movie.mkv", InputProtocol::File, Continuity::Discrete, InputRole::Video);
        input.add_option(InputOption::StreamSeek(Duration::from_millis(2500)));
        assert_eq!(input.input_args(), vec!["-ss", "2500ms", "-i", "movie.mkv"]);
    }

    #[test]
    fn test_watermark_position_serde() {
        let json = serde_json::to_string(&WatermarkPosition::TopLeft).unwrap();
        assert_eq!(json, "\"top-left\"");
    }
}
