//! Complex filter graph.
//!
//! Per-stream filters collected during a build are folded into a single
//! `-filter_complex` graph plus explicit `-map` directives. Input indices
//! follow first-seen order of distinct paths, video first.

use crate::pipeline::filter::Filter;
use crate::pipeline::input::{AudioInputSource, VideoInputSource, WatermarkInputSource};

/// Video filters collected by the builder, in the order they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    pub video_filter_steps: Vec<Filter>,
    pub watermark_overlay_filter_steps: Vec<Filter>,
    pub pixel_format_filter_steps: Vec<Filter>,
}

impl FilterChain {
    pub fn is_empty(&self) -> bool {
        self.video_filter_steps.is_empty()
            && self.watermark_overlay_filter_steps.is_empty()
            && self.pixel_format_filter_steps.is_empty()
    }
}

/// The rendered graph and the labels mapped into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexFilter {
    graph: String,
    audio_map: String,
    video_map: String,
}

fn joined(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(Filter::text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn index_of(paths: &mut Vec<String>, path: &str) -> usize {
    match paths.iter().position(|p| p == path) {
        Some(index) => index,
        None => {
            paths.push(path.to_string());
            paths.len() - 1
        }
    }
}

impl ComplexFilter {
    pub fn new(
        video: &VideoInputSource,
        audio: Option<&AudioInputSource>,
        watermark: Option<&WatermarkInputSource>,
        chain: &FilterChain,
    ) -> Self {
        let mut paths = vec![video.source.path.clone()];
        let audio_index = audio.map(|a| index_of(&mut paths, &a.source.path));
        // The watermark carries its own input options, so it is always a new `-i`
        let watermark_index = watermark.map(|w| {
            paths.push(w.source.path.clone());
            paths.len() - 1
        });

        let mut chains: Vec<String> = Vec::new();

        // Watermark input chain, ending in [wm] when it has filters.
        let watermark_label = match (watermark, watermark_index) {
            (Some(watermark), Some(index)) => {
                let raw = format!("[{index}:{}]", watermark.stream.index);
                let filters = joined(watermark.source.filter_steps());
                if filters.is_empty() {
                    Some(raw)
                } else {
                    chains.push(format!("{raw}{filters}[wm]"));
                    Some("[wm]".to_string())
                }
            }
            _ => None,
        };

        // Video: filters, overlay, pixel format; each non-empty stage is one chain.
        let video_stream_index = video.first_stream().map_or(0, |s| s.index);
        let raw_video = format!("0:{video_stream_index}");

        let mut stages: Vec<String> = Vec::new();
        let video_filters = joined(&chain.video_filter_steps);
        if !video_filters.is_empty() {
            stages.push(video_filters);
        }
        if let Some(label) = &watermark_label {
            let overlay = joined(&chain.watermark_overlay_filter_steps);
            if !overlay.is_empty() {
                stages.push(format!("{label}{overlay}"));
            }
        }
        let pixel_format = joined(&chain.pixel_format_filter_steps);
        if !pixel_format.is_empty() {
            stages.push(pixel_format);
        }

        let video_map = if stages.is_empty() {
            raw_video
        } else {
            let mut current = format!("[{raw_video}]");
            let last = stages.len() - 1;
            for (i, stage) in stages.iter().enumerate() {
                let out = if i == last { "[v]".to_string() } else { format!("[v{i}]") };
                chains.push(format!("{current}{stage}{out}"));
                current = out;
            }
            "[v]".to_string()
        };

        // Audio labelling does not depend on the watermark.
        let audio_map = match (audio, audio_index) {
            (Some(audio), Some(index)) => {
                let stream_index = audio.streams.first().map_or(0, |s| s.index);
                let raw = format!("{index}:{stream_index}");
                let filters = joined(audio.source.filter_steps());
                if filters.is_empty() {
                    raw
                } else {
                    chains.push(format!("[{raw}]{filters}[a]"));
                    "[a]".to_string()
                }
            }
            _ => "0:a?".to_string(),
        };

        Self {
            graph: chains.join(";"),
            audio_map,
            video_map,
        }
    }

    pub fn graph(&self) -> &str {
        &self.graph
    }

    pub fn audio_map(&self) -> &str {
        &self.audio_map
    }

    pub fn video_map(&self) -> &str {
        &self.video_map
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.graph.is_empty() {
            args.push("-filter_complex".to_string());
            args.push(self.graph.clone());
        }
        args.extend([
            "-map".to_string(),
            self.audio_map.clone(),
            "-map".to_string(),
            self.video_map.clone(),
        ]);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{AudioStream, FrameSize, PixelFormat, StillImageStream, VideoStream};
    use crate::pipeline::input::{WatermarkPosition, WatermarkSettings};
    use crate::pipeline::state::AudioState;
    use crate::pipeline::types::{Continuity, InputProtocol};

    fn video() -> VideoInputSource {
        VideoInputSource::new(
            "movie.mkv",
            InputProtocol::File,
            Continuity::Discrete,
            VideoStream::new(0, "h264", FrameSize::new(1920, 1080)),
        )
    }

    fn audio(path: &str) -> AudioInputSource {
        AudioInputSource::new(
            path,
            InputProtocol::File,
            Continuity::Discrete,
            AudioStream::new(1, "aac", 2),
            AudioState::default(),
        )
    }

    #[test]
    fn test_no_filters_maps_raw_labels() {
        let filter = ComplexFilter::new(&video(), Some(&audio("movie.mkv")), None, &FilterChain::default());
        assert_eq!(filter.args(), vec!["-map", "0:1", "-map", "0:0"]);
    }

    #[test]
    fn test_audio_is_labelled_without_watermark() {
        let mut audio = audio("movie.mkv");
        audio.source.add_filter(Filter::AudioFirstPts);
        let filter = ComplexFilter::new(&video(), Some(&audio), None, &FilterChain::default());
        assert_eq!(filter.graph(), "[0:1]aresample=async=1:first_pts=0[a]");
        assert_eq!(filter.audio_map(), "[a]");
        assert_eq!(filter.video_map(), "0:0");
    }

    #[test]
    fn test_separate_audio_input_gets_next_index() {
        let filter = ComplexFilter::new(&video(), Some(&audio("music.flac")), None, &FilterChain::default());
        assert_eq!(filter.audio_map(), "1:1");
    }

    #[test]
    fn test_watermark_on_audio_path_is_not_shared() {
        let watermark = WatermarkInputSource::new(
            "music.flac",
            StillImageStream::new(0, FrameSize::new(200, 100)),
            true,
            WatermarkSettings::default(),
        );
        let chain = FilterChain {
            watermark_overlay_filter_steps: vec![Filter::Overlay {
                position: WatermarkPosition::TopLeft,
                x: 0,
                y: 0,
                ten_bit: false,
            }],
            ..FilterChain::default()
        };
        let filter = ComplexFilter::new(&video(), Some(&audio("music.flac")), Some(&watermark), &chain);
        assert_eq!(filter.audio_map(), "1:1");
        assert_eq!(filter.graph(), "[0:0][2:0]overlay=x=0:y=0:format=0[v]");
    }

    #[test]
    fn test_missing_audio_input_maps_optional_audio() {
        let filter = ComplexFilter::new(&video(), None, None, &FilterChain::default());
        assert_eq!(filter.audio_map(), "0:a?");
    }

    #[test]
    fn test_watermark_overlay_stages() {
        let mut watermark = WatermarkInputSource::new(
            "logo.png",
            StillImageStream::new(0, FrameSize::new(200, 100)),
            true,
            WatermarkSettings::default(),
        );
        watermark.source.add_filter(Filter::WatermarkScale { width: 192 });
        let chain = FilterChain {
            video_filter_steps: vec![Filter::Pad {
                padded: FrameSize::new(1920, 1080),
                download_as: None,
            }],
            watermark_overlay_filter_steps: vec![Filter::Overlay {
                position: WatermarkPosition::TopLeft,
                x: 10,
                y: 10,
                ten_bit: false,
            }],
            pixel_format_filter_steps: vec![Filter::PixelFormat(PixelFormat::Yuv420p)],
        };
        let filter = ComplexFilter::new(&video(), Some(&audio("movie.mkv")), Some(&watermark), &chain);
        assert_eq!(
            filter.graph(),
            "[1:0]scale=192:-1[wm];\
             [0:0]pad=1920:1080:-1:-1:color=black[v0];\
             [v0][wm]overlay=x=10:y=10:format=0[v1];\
             [v1]format=yuv420p[v]"
        );
        assert_eq!(filter.video_map(), "[v]");
        assert_eq!(filter.audio_map(), "0:1");
    }
}
