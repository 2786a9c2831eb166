//! Stream discovery via ffprobe.
//!
//! `probe_media` runs ffprobe (through the `ffprobe` crate) and turns its
//! output into the read-only stream descriptors the pipeline builder uses.
//! The conversion itself works on a small intermediate record so it can be
//! exercised without an ffprobe binary.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::media::format::{FrameSize, PixelFormat};
use crate::media::stream::{AudioStream, VideoStream};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;
use std::time::Duration;

/// Streams discovered in one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbedMedia {
    pub video_streams: Vec<VideoStream>,
    pub audio_streams: Vec<AudioStream>,
    pub duration: Option<Duration>,
}

/// The subset of an ffprobe stream entry that descriptors are built from.
#[derive(Debug, Clone, Default)]
pub struct RawStream {
    pub index: i64,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub pix_fmt: Option<String>,
    pub sample_aspect_ratio: Option<String>,
    pub field_order: Option<String>,
    pub avg_frame_rate: Option<String>,
    pub channels: Option<i64>,
}

impl From<&ffprobe::Stream> for RawStream {
    fn from(stream: &ffprobe::Stream) -> Self {
        Self {
            index: stream.index,
            codec_type: stream.codec_type.clone(),
            codec_name: stream.codec_name.clone(),
            width: stream.width,
            height: stream.height,
            pix_fmt: stream.pix_fmt.clone(),
            sample_aspect_ratio: stream.sample_aspect_ratio.clone(),
            field_order: stream.field_order.clone(),
            avg_frame_rate: Some(stream.avg_frame_rate.clone()),
            channels: stream.channels,
        }
    }
}

/// Probes `input_path` and returns its audio and video stream descriptors.
pub fn probe_media(input_path: &Path) -> CoreResult<ProbedMedia> {
    log::debug!("Running ffprobe for stream discovery on: {}", input_path.display());
    match ffprobe(input_path) {
        Ok(metadata) => {
            let raw: Vec<RawStream> = metadata.streams.iter().map(RawStream::from).collect();
            let mut media = parse_streams(&raw)?;
            media.duration = metadata
                .format
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(Duration::from_secs_f64);
            if media.video_streams.is_empty() && media.audio_streams.is_empty() {
                log::warn!("No audio or video streams found in {}", input_path.display());
            }
            Ok(media)
        }
        Err(err) => {
            log::error!("ffprobe failed on {}: {:?}", input_path.display(), err);
            Err(map_ffprobe_error(err, "stream discovery"))
        }
    }
}

/// Converts raw ffprobe stream entries into descriptors.
///
/// Streams of other kinds (subtitles, data, attachments) are skipped. A video
/// stream without usable dimensions is an error rather than a guess.
pub fn parse_streams(streams: &[RawStream]) -> CoreResult<ProbedMedia> {
    let mut media = ProbedMedia::default();

    for stream in streams {
        let index = u32::try_from(stream.index).map_err(|_| {
            CoreError::FfprobeParse(format!("invalid stream index {}", stream.index))
        })?;
        let codec = stream.codec_name.clone().unwrap_or_default();

        match stream.codec_type.as_deref() {
            Some("video") => {
                let (width, height) = match (stream.width, stream.height) {
                    (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
                    (w, h) => {
                        return Err(CoreError::FfprobeParse(format!(
                            "video stream {index} has invalid dimensions: width={w:?}, height={h:?}"
                        )));
                    }
                };

                let mut video = VideoStream::new(index, &codec, FrameSize::new(width, height));
                video.pixel_format = stream
                    .pix_fmt
                    .as_deref()
                    .and_then(|p| p.parse::<PixelFormat>().ok());
                if let Some(sar) = stream.sample_aspect_ratio.as_deref() {
                    if is_anamorphic_sar(sar) {
                        video = video.with_anamorphic(sar);
                    }
                }
                video.interlaced = is_interlaced_field_order(stream.field_order.as_deref());
                video.frame_rate = stream
                    .avg_frame_rate
                    .clone()
                    .filter(|r| !r.is_empty() && r != "0/0");
                media.video_streams.push(video);
            }
            Some("audio") => {
                let channels = stream.channels.unwrap_or(0).max(0) as u32;
                media.audio_streams.push(AudioStream::new(index, &codec, channels));
            }
            _ => {}
        }
    }

    Ok(media)
}

fn is_anamorphic_sar(sar: &str) -> bool {
    match sar.split_once(':') {
        Some((num, den)) => {
            let (Ok(num), Ok(den)) = (num.parse::<u64>(), den.parse::<u64>()) else {
                return false;
            };
            num > 0 && den > 0 && num != den
        }
        None => false,
    }
}

fn is_interlaced_field_order(field_order: Option<&str>) -> bool {
    matches!(field_order, Some("tt" | "bb" | "tb" | "bt"))
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => CoreError::JsonParseError(format!(
            "ffprobe {context} output deserialization: {err}"
        )),
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error during {context}: {err:?}")),
    }
}
