//! From playable items to pipelines and session specs.
//!
//! Every item, including offline and error screens, goes through the same
//! `PipelineBuilder`. Screens are still images played for a fixed duration;
//! when a screen cannot be played a generated black frame with silence is
//! used instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::media::{AudioStream, PixelFormat, VideoStream};
use crate::pipeline::builder::PipelineBuilder;
use crate::pipeline::command::Pipeline;
use crate::pipeline::input::{
    AudioInputSource, ConcatInputSource, VideoInputSource, WatermarkInputSource,
};
use crate::pipeline::state::{AudioState, FfmpegState, HlsSettings};
use crate::pipeline::types::{Continuity, InputProtocol, OutputFormat};
use crate::stream::concat::ConcatList;
use crate::stream::item::{OutputProfile, PlayableItem};
use crate::stream::process::TranscodeRequest;
use crate::stream::session::{SessionOutput, SessionSpec};
use crate::temp_files::session_dir_name;

pub const PLAYLIST_NAME: &str = "stream.m3u8";
const SEGMENT_TEMPLATE: &str = "data%06d.ts";
const SILENCE_SOURCE: &str = "anullsrc=channel_layout=stereo:sample_rate=48000";
const FALLBACK_FRAME_RATE: u32 = 30;

/// Directory a channel's segmented output is written to.
pub fn session_dir(config: &CoreConfig, channel: &str) -> PathBuf {
    config.stream_output_dir.join(session_dir_name(channel))
}

/// Segmented output settings for `dir`.
pub fn hls_settings(config: &CoreConfig, dir: &Path) -> HlsSettings {
    HlsSettings {
        playlist_path: dir.join(PLAYLIST_NAME).display().to_string(),
        segment_template: dir.join(SEGMENT_TEMPLATE).display().to_string(),
        base_stream_url: None,
        segment_seconds: config.hls_time_secs,
        list_size: config.hls_list_size,
    }
}

fn base_state(profile: &OutputProfile, config: &CoreConfig) -> FfmpegState {
    let mut state = FfmpegState::from_config(config).with_output_format(profile.output_format);
    if let Some(metadata) = &profile.metadata {
        state = state.with_metadata(&metadata.provider, &metadata.name);
    }
    state
}

/// Compiles `item` for `profile` with the default output state.
pub fn compile_item(item: &PlayableItem, profile: &OutputProfile, config: &CoreConfig) -> CoreResult<Pipeline> {
    compile_item_with(item, profile, base_state(profile, config))
}

/// Compiles `item` on top of a caller-prepared output state.
pub fn compile_item_with(
    item: &PlayableItem,
    profile: &OutputProfile,
    mut ffmpeg_state: FfmpegState,
) -> CoreResult<Pipeline> {
    item.validate()?;
    profile.validate()?;

    // Screens never seek.
    if !item.kind.is_screen() {
        if let Some(start) = item.start() {
            ffmpeg_state = ffmpeg_state.with_start(start);
        }
    }
    if let Some(duration) = item.duration() {
        ffmpeg_state = ffmpeg_state.with_duration(duration);
    }

    let (video, stream) = match (&item.video, &item.still_image) {
        (Some(stream), _) => (
            VideoInputSource::new(&item.path, item.protocol, item.continuity, stream.clone()),
            stream.clone(),
        ),
        (None, Some(image)) => (VideoInputSource::still_image(&item.path, image), image.as_video_stream()),
        (None, None) => return Err(CoreError::MissingField { field: "video stream" }),
    };
    let desired = profile.desired_frame_state(&stream);

    let mut audio_state = profile.audio.clone();
    if audio_state.duration_ms.is_none() {
        audio_state.duration_ms = item.duration_ms;
    }

    let mut builder = PipelineBuilder::new(profile.hardware_acceleration, video);
    match &item.audio {
        Some(audio) => {
            let path = item.audio_path.as_deref().unwrap_or(&item.path);
            builder = builder.with_audio(AudioInputSource::new(
                path,
                item.protocol,
                item.continuity,
                audio.clone(),
                audio_state,
            ));
        }
        None if item.kind.is_screen() => {
            debug!("Adding generated silence to {} screen", item.kind.as_str());
            builder = builder.with_audio(silence(audio_state));
        }
        None => {}
    }
    if let Some(watermark) = &profile.watermark {
        builder = builder.with_watermark(WatermarkInputSource::new(
            &watermark.path,
            watermark.image.clone(),
            !watermark.animated,
            watermark.settings.clone(),
        ));
    }

    builder.build(&ffmpeg_state, &desired)
}

fn silence(audio_state: AudioState) -> AudioInputSource {
    AudioInputSource::new(
        SILENCE_SOURCE,
        InputProtocol::Lavfi,
        Continuity::Continuous,
        AudioStream::new(0, "pcm_s16le", 2),
        audio_state,
    )
}

/// Generated black frame with silence at the profile's resolution.
pub fn fallback_screen(
    profile: &OutputProfile,
    duration: Option<Duration>,
    ffmpeg_state: FfmpegState,
) -> CoreResult<Pipeline> {
    profile.resolution.validate()?;
    let frame_rate = profile.frame_rate.unwrap_or(FALLBACK_FRAME_RATE);
    let source = format!("color=c=black:s={}:r={frame_rate}", profile.resolution);
    let stream = VideoStream::new(0, "rawvideo", profile.resolution).with_pixel_format(PixelFormat::Yuv420p);
    let desired = profile.desired_frame_state(&stream);

    let mut ffmpeg_state = ffmpeg_state;
    ffmpeg_state.start = None;
    ffmpeg_state.duration = duration;

    let mut audio_state = profile.audio.clone();
    audio_state.duration_ms = duration.map(|d| d.as_millis() as u64);

    // no watermark: only generated inputs
    PipelineBuilder::new(
        profile.hardware_acceleration,
        VideoInputSource::new(&source, InputProtocol::Lavfi, Continuity::Continuous, stream),
    )
    .with_audio(silence(audio_state))
    .build(&ffmpeg_state, &desired)
}

/// Session spec playing one item, as a byte stream or segmented per the profile.
pub fn item_session(
    channel: &str,
    item: &PlayableItem,
    profile: &OutputProfile,
    config: &CoreConfig,
) -> CoreResult<SessionSpec> {
    let mut state = base_state(profile, config);
    let output = if profile.output_format == OutputFormat::Hls {
        let dir = session_dir(config, channel);
        state = state.with_hls(hls_settings(config, &dir));
        SessionOutput::Segmented {
            playlist: dir.join(PLAYLIST_NAME),
            dir,
        }
    } else {
        SessionOutput::Pipe
    };

    let pipeline = compile_item_with(item, profile, state.clone())?;
    let request = TranscodeRequest::from_pipeline(&config.ffmpeg_path, &pipeline)?;

    let fallback = if item.kind.is_screen() {
        let pipeline = fallback_screen(profile, item.duration(), state)?;
        Some(TranscodeRequest::from_pipeline(&config.ffmpeg_path, &pipeline)?)
    } else {
        None
    };

    Ok(SessionSpec {
        channel: channel.to_string(),
        request,
        output,
        fallback,
        concat: None,
        scratch_files: Vec::new(),
    })
}

/// Session spec playing `list` back to back on one process.
pub fn concat_session(
    channel: &str,
    list: ConcatList,
    config: &CoreConfig,
    segmented: bool,
) -> CoreResult<SessionSpec> {
    let list_path = list.write_to(&config.stream_output_dir, &format!("concat_{}", session_dir_name(channel)))?;
    let mut state = FfmpegState::from_config(config);
    let output = if segmented {
        let dir = session_dir(config, channel);
        state = state.with_hls(hls_settings(config, &dir));
        SessionOutput::Segmented {
            playlist: dir.join(PLAYLIST_NAME),
            dir,
        }
    } else {
        SessionOutput::Pipe
    };

    let input = ConcatInputSource::new(&list_path.display().to_string(), InputProtocol::File);
    let pipeline = PipelineBuilder::concat(input, &state)?;
    Ok(SessionSpec {
        channel: channel.to_string(),
        request: TranscodeRequest::from_pipeline(&config.ffmpeg_path, &pipeline)?,
        output,
        fallback: None,
        concat: Some(list),
        scratch_files: vec![list_path],
    })
}
