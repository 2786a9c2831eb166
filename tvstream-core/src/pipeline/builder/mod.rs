// ============================================================================
// tvstream-core/src/pipeline/builder/mod.rs
// ============================================================================
//
// PIPELINE BUILDER: Compiles Media Descriptors Into an Ordered Pipeline
//
// The builder owns the order of concerns for one build: thread count,
// global flags, input options, the video sub-pipeline, the audio
// sub-pipeline, metadata, output format, the complex filter and the audio
// copy fallback. A `HardwareStrategy` decides how each backend declares
// acceleration and which hardware-native filters and encoders it can use.
// When neither decode nor encode can run on the requested backend the
// build switches to the software strategy, so the result is identical to
// a software build.
//
// KEY COMPONENTS:
// - PipelineBuilder: inputs + requested mode, consumed by `build`
// - BuildContext: read-only values shared by every sub-step of one build
// - HardwareStrategy: per-backend overrides with software defaults
// - strategy_for: exhaustive mode -> strategy mapping
//
// AI-ASSISTANT-INFO: Template of the pipeline build and the strategy seam

mod nvidia;
mod qsv;
mod software;
mod vaapi;

// ---- External crate imports ----
use log::debug;

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::media::{PixelFormat, VideoStream};
use crate::pipeline::command::{Pipeline, PipelineInputs};
use crate::pipeline::decoder::{Decoder, select_decoder};
use crate::pipeline::encoder::{AudioEncoder, VideoEncoder, select_encoder, software_encoder};
use crate::pipeline::filter::{ComplexFilter, Filter, FilterChain};
use crate::pipeline::input::{
    AudioInputSource, ConcatInputSource, VideoInputSource, WatermarkInputSource,
};
use crate::pipeline::options::{GlobalOption, InputOption, OutputOption};
use crate::pipeline::state::{AccelState, FfmpegState, FrameState};
use crate::pipeline::step::{FrameStateUpdate, PipelineStep};
use crate::pipeline::types::{
    Continuity, FrameDataLocation, HardwareAccelerationMode, OutputFormat, OutputLocation,
    VideoFormat,
};

pub use nvidia::NvidiaStrategy;
pub use qsv::QsvStrategy;
pub use software::SoftwareStrategy;
pub use vaapi::VaapiStrategy;

/// Values shared by every sub-step of one build.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub video_stream: &'a VideoStream,
    pub ffmpeg_state: &'a FfmpegState,
    pub desired: &'a FrameState,
    pub accel: AccelState,
    /// Mode the caller asked for, before any fallback
    pub requested_mode: HardwareAccelerationMode,
    pub has_watermark: bool,
    pub is_still_image: bool,
}

/// Per-backend behaviour. Default bodies are the software behaviour.
pub trait HardwareStrategy: Sync {
    fn mode(&self) -> HardwareAccelerationMode;

    /// Decode and encode modes this backend can take for the build.
    fn resolve_accel(
        &self,
        _stream: &VideoStream,
        _desired: &FrameState,
        _ffmpeg_state: &FfmpegState,
    ) -> AccelState {
        AccelState::SOFTWARE
    }

    /// Global options and environment that declare the backend.
    fn hardware_accel_steps(&self, _ctx: &BuildContext<'_>) -> Vec<PipelineStep> {
        Vec::new()
    }

    fn decoder(&self, ctx: &BuildContext<'_>) -> Decoder {
        select_decoder(ctx.video_stream, ctx.accel.decoder)
    }

    /// Deinterlace filter for frames already on this backend's surfaces.
    fn hardware_deinterlace(&self) -> Option<Filter> {
        None
    }

    /// Scale filter running on this backend, uploading first if needed.
    fn hardware_scale(&self, _current: &FrameState, _ctx: &BuildContext<'_>) -> Option<Filter> {
        None
    }

    fn encoder(&self, ctx: &BuildContext<'_>) -> Option<VideoEncoder> {
        select_encoder(&ctx.desired.video_format, ctx.accel.encoder)
    }
}

static SOFTWARE: SoftwareStrategy = SoftwareStrategy;
static NVIDIA: NvidiaStrategy = NvidiaStrategy;
static QSV: QsvStrategy = QsvStrategy;
static VAAPI: VaapiStrategy = VaapiStrategy;

/// The strategy implementing `mode`.
pub fn strategy_for(mode: HardwareAccelerationMode) -> &'static dyn HardwareStrategy {
    match mode {
        HardwareAccelerationMode::None => &SOFTWARE,
        HardwareAccelerationMode::Nvenc => &NVIDIA,
        HardwareAccelerationMode::Qsv => &QSV,
        HardwareAccelerationMode::Vaapi => &VAAPI,
    }
}

/// Whether the source must be deinterlaced to reach the desired state.
pub fn needs_deinterlace(stream: &VideoStream, desired: &FrameState) -> bool {
    stream.interlaced && !desired.interlaced
}

/// Output muxers that take raw frames cannot use a hardware encoder.
pub fn output_allows_hardware_encode(ffmpeg_state: &FfmpegState) -> bool {
    ffmpeg_state.output_format != OutputFormat::Nut
}

/// Surface format frames are downloaded as.
fn surface_format(current: &FrameState) -> PixelFormat {
    current
        .pixel_format
        .as_ref()
        .map_or(PixelFormat::Nv12, PixelFormat::hardware_surface_format)
}

fn download_format(current: &FrameState) -> Option<PixelFormat> {
    current
        .frame_data_location
        .is_hardware()
        .then(|| surface_format(current))
}

fn thread_count(ctx: &BuildContext<'_>) -> Option<u32> {
    if !ctx.accel.is_software() {
        return Some(1);
    }
    if ctx.ffmpeg_state.start.is_some() && ctx.desired.realtime {
        return Some(1);
    }
    ctx.ffmpeg_state.thread_count.filter(|count| *count > 0)
}

fn standard_globals(log_level: &str) -> Vec<PipelineStep> {
    [
        GlobalOption::NoStdIn,
        GlobalOption::HideBanner,
        GlobalOption::NoStats,
        GlobalOption::LogLevel(log_level.to_string()),
        GlobalOption::StandardFormatFlags,
    ]
    .into_iter()
    .map(PipelineStep::Global)
    .collect()
}

fn metadata_steps(ffmpeg_state: &FfmpegState) -> Vec<PipelineStep> {
    let mut steps = Vec::new();
    if ffmpeg_state.do_not_map_metadata {
        steps.push(PipelineStep::Output(OutputOption::DoNotMapMetadata));
    }
    if let Some(provider) = &ffmpeg_state.metadata_service_provider {
        steps.push(PipelineStep::Output(OutputOption::MetadataServiceProvider(provider.clone())));
    }
    if let Some(name) = &ffmpeg_state.metadata_service_name {
        steps.push(PipelineStep::Output(OutputOption::MetadataServiceName(name.clone())));
    }
    steps
}

fn location_target(location: &OutputLocation) -> OutputOption {
    match location {
        OutputLocation::Stdout => OutputOption::PipeTarget,
        OutputLocation::File(path) => OutputOption::FileTarget(path.display().to_string()),
    }
}

/// Compiles one playable item into a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    mode: HardwareAccelerationMode,
    video: VideoInputSource,
    audio: Option<AudioInputSource>,
    watermark: Option<WatermarkInputSource>,
}

impl PipelineBuilder {
    pub fn new(mode: HardwareAccelerationMode, video: VideoInputSource) -> Self {
        Self {
            mode,
            video,
            audio: None,
            watermark: None,
        }
    }

    #[must_use]
    pub fn with_audio(mut self, audio: AudioInputSource) -> Self {
        self.audio = Some(audio);
        self
    }

    #[must_use]
    pub fn with_watermark(mut self, watermark: WatermarkInputSource) -> Self {
        self.watermark = Some(watermark);
        self
    }

    pub fn mode(&self) -> HardwareAccelerationMode {
        self.mode
    }

    /// Builds the pipeline that moves frames from the source's state to `desired`.
    pub fn build(self, ffmpeg_state: &FfmpegState, desired: &FrameState) -> CoreResult<Pipeline> {
        let Self {
            mode,
            mut video,
            audio,
            watermark,
        } = self;

        let stream = video
            .first_stream()
            .cloned()
            .ok_or(CoreError::MissingField { field: "video stream" })?;
        let is_copy = desired.video_format == VideoFormat::Copy;
        let mut audio = audio.filter(|a| !a.streams.is_empty());
        let mut watermark = if is_copy { None } else { watermark };

        let requested = strategy_for(mode);
        let accel = if is_copy {
            AccelState::SOFTWARE
        } else {
            requested.resolve_accel(&stream, desired, ffmpeg_state)
        };
        let strategy = if accel.is_software() {
            if mode.is_hardware() {
                debug!(
                    "Neither decode nor encode of {} -> {} is possible with {mode}; using software",
                    stream.codec, desired.video_format
                );
            }
            strategy_for(HardwareAccelerationMode::None)
        } else {
            requested
        };
        debug!(
            "Hardware modes for {}: decoder={}, encoder={}",
            video.source.path, accel.decoder, accel.encoder
        );

        let ctx = BuildContext {
            video_stream: &stream,
            ffmpeg_state,
            desired,
            accel,
            requested_mode: mode,
            has_watermark: watermark.is_some(),
            is_still_image: video.is_still_image(),
        };

        let mut steps = Vec::new();
        if let Some(threads) = thread_count(&ctx) {
            steps.push(PipelineStep::Global(GlobalOption::ThreadCount(threads)));
        }
        steps.extend(standard_globals(&ffmpeg_state.log_level));
        steps.extend(strategy.hardware_accel_steps(&ctx));

        steps.push(PipelineStep::Output(OutputOption::NoDemuxDecodeDelay));
        steps.push(PipelineStep::Output(OutputOption::ClosedGop));
        let fragmented = match ffmpeg_state.output_format {
            OutputFormat::Mp4 => true,
            OutputFormat::Hls => ffmpeg_state.hls.as_ref().is_some_and(|hls| hls.uses_fmp4()),
            _ => false,
        };
        steps.push(PipelineStep::Output(if fragmented {
            OutputOption::Mp4Flags
        } else {
            OutputOption::FastStart
        }));

        // ---- Input options ----
        if let Some(start) = ffmpeg_state.start {
            video.source.add_option(InputOption::StreamSeek(start));
            if let Some(audio) = audio.as_mut() {
                audio.source.add_option(InputOption::StreamSeek(start));
            }
        }
        if desired.realtime {
            video.source.add_option(InputOption::Readrate { initial_burst: 0 });
            if let Some(audio) = audio.as_mut() {
                audio.source.add_option(InputOption::Readrate { initial_burst: 0 });
            }
        }
        if let Some(duration) = ffmpeg_state.duration {
            steps.push(PipelineStep::Output(OutputOption::TimeLimit(duration)));
        }
        if video.source.continuity == Continuity::Discrete {
            video.source.add_option(InputOption::HttpReconnect);
        }
        video.source.add_option(InputOption::UserAgent(ffmpeg_state.user_agent.clone()));
        if let Some(audio) = audio.as_mut() {
            if audio.source.path != video.source.path {
                if audio.source.continuity == Continuity::Discrete {
                    audio.source.add_option(InputOption::HttpReconnect);
                }
                audio.source.add_option(InputOption::UserAgent(ffmpeg_state.user_agent.clone()));
            }
        }

        if !is_copy {
            if let (Some(offset), Some(timescale)) =
                (ffmpeg_state.pts_offset, desired.video_track_timescale)
            {
                if offset > 0 {
                    steps.push(PipelineStep::Output(OutputOption::OutputTsOffset { offset, timescale }));
                }
            }
        }

        // ---- Video ----
        let mut chain = FilterChain::default();
        if is_copy {
            steps.push(PipelineStep::VideoEncoder(VideoEncoder::Copy));
        } else {
            let final_state = build_video(
                strategy,
                &ctx,
                &mut video,
                watermark.as_mut(),
                &mut chain,
                &mut steps,
            )?;
            debug!("Final frame state: {final_state:?}");
        }

        // ---- Audio ----
        if let Some(audio) = audio.as_mut() {
            build_audio(audio, &mut steps);
        }

        steps.extend(metadata_steps(ffmpeg_state));

        // ---- Output format ----
        match ffmpeg_state.output_format {
            OutputFormat::MpegTs => steps.push(PipelineStep::Output(OutputOption::MpegTsFormat)),
            OutputFormat::Mkv => steps.push(PipelineStep::Output(OutputOption::MatroskaFormat)),
            OutputFormat::Mp4 => steps.push(PipelineStep::Output(OutputOption::Mp4Format)),
            OutputFormat::Nut => steps.push(PipelineStep::Output(if desired.bit_depth() > 8 {
                OutputOption::NutFormat
            } else {
                OutputOption::MatroskaFormat
            })),
            OutputFormat::Hls => {
                let settings = ffmpeg_state
                    .hls
                    .clone()
                    .ok_or(CoreError::MissingField { field: "hls" })?;
                let playlist = settings.playlist_path.clone();
                let key_frame_seconds = (!is_copy).then_some(settings.segment_seconds);
                steps.push(PipelineStep::Output(OutputOption::Hls {
                    settings,
                    key_frame_seconds,
                }));
                steps.push(PipelineStep::Output(OutputOption::FileTarget(playlist)));
            }
        }
        if ffmpeg_state.output_format != OutputFormat::Hls {
            steps.push(PipelineStep::Output(location_target(&ffmpeg_state.output_location)));
        }

        steps.push(PipelineStep::ComplexFilter(ComplexFilter::new(
            &video,
            audio.as_ref(),
            watermark.as_ref(),
            &chain,
        )));

        if audio.is_none() {
            steps.push(PipelineStep::AudioEncoder(AudioEncoder::copy()));
        }

        let inputs = PipelineInputs {
            video: Some(video),
            audio,
            watermark,
            concat: None,
        };
        Ok(Pipeline::new(steps, inputs, accel))
    }

    /// Copy-only pipeline reading a concat list; used for continuous channel output.
    pub fn concat(mut input: ConcatInputSource, ffmpeg_state: &FfmpegState) -> CoreResult<Pipeline> {
        let mut steps = Vec::new();
        if let Some(threads) = ffmpeg_state.thread_count.filter(|count| *count > 0) {
            steps.push(PipelineStep::Global(GlobalOption::ThreadCount(threads)));
        }
        steps.extend(standard_globals(&ffmpeg_state.log_level));

        input.source.add_option(InputOption::ConcatFormat);
        input.source.add_option(InputOption::Readrate { initial_burst: 0 });
        input.source.add_option(InputOption::InfiniteLoop);
        input.source.add_option(InputOption::UserAgent(ffmpeg_state.user_agent.clone()));
        input.source.add_option(InputOption::ConcatHttpReconnect);

        steps.extend(
            [
                OutputOption::NoDemuxDecodeDelay,
                OutputOption::FastStart,
                OutputOption::ClosedGop,
                OutputOption::NoSceneDetect,
            ]
            .into_iter()
            .map(PipelineStep::Output),
        );
        steps.push(PipelineStep::CopyAll);
        steps.extend(metadata_steps(ffmpeg_state));

        match ffmpeg_state.output_format {
            OutputFormat::Hls => {
                let settings = ffmpeg_state
                    .hls
                    .clone()
                    .ok_or(CoreError::MissingField { field: "hls" })?;
                let playlist = settings.playlist_path.clone();
                steps.push(PipelineStep::Output(OutputOption::HlsConcat { settings }));
                steps.push(PipelineStep::Output(OutputOption::FileTarget(playlist)));
            }
            _ => {
                steps.push(PipelineStep::Output(OutputOption::MpegTsFormat));
                steps.push(PipelineStep::Output(OutputOption::PipeTarget));
            }
        }

        let inputs = PipelineInputs {
            video: None,
            audio: None,
            watermark: None,
            concat: Some(input),
        };
        Ok(Pipeline::new(steps, inputs, AccelState::SOFTWARE))
    }
}

/// Video sub-pipeline. Returns the frame state after the encoder.
fn build_video(
    strategy: &dyn HardwareStrategy,
    ctx: &BuildContext<'_>,
    video: &mut VideoInputSource,
    watermark: Option<&mut WatermarkInputSource>,
    chain: &mut FilterChain,
    steps: &mut Vec<PipelineStep>,
) -> CoreResult<FrameState> {
    let desired = ctx.desired;
    let stream = ctx.video_stream;

    let decoder = strategy.decoder(ctx);
    if decoder != Decoder::Implicit {
        video.source.add_option(InputOption::Decoder(decoder.clone()));
    }

    if let Some(rate) = desired.frame_rate {
        steps.push(PipelineStep::Output(OutputOption::FrameRate(rate)));
    }
    if let Some(timescale) = desired.video_track_timescale {
        steps.push(PipelineStep::Output(OutputOption::VideoTrackTimescale(timescale)));
    }
    if let Some(bitrate) = desired.video_bitrate {
        steps.push(PipelineStep::Output(OutputOption::VideoBitrate(bitrate)));
    }
    if let Some(buffer) = desired.video_buffer_size {
        steps.push(PipelineStep::Output(OutputOption::VideoBufferSize(buffer)));
    }

    let mut current = desired.clone();
    current.scaled_size = stream.frame_size;
    current.padded_size = stream.frame_size;
    current.is_anamorphic = stream.is_anamorphic;
    current.pixel_format = stream.pixel_format.clone();
    current.interlaced = stream.interlaced;
    current.frame_data_location = FrameDataLocation::Unknown;
    current = decoder.next_state(&current);

    let mut push_video = |filter: Filter, current: &mut FrameState| {
        *current = filter.next_state(current);
        chain.video_filter_steps.push(filter);
    };

    // ---- Deinterlace ----
    if needs_deinterlace(stream, desired) {
        let filter = match strategy.hardware_deinterlace() {
            Some(filter) if current.frame_data_location.is_hardware() => filter,
            _ => Filter::SoftwareDeinterlace {
                filter: ctx.ffmpeg_state.software_deinterlace_filter.clone(),
                download_as: download_format(&current),
            },
        };
        push_video(filter, &mut current);
    }

    // ---- Scale ----
    if current.scaled_size != desired.scaled_size {
        let needs_pad = desired.scaled_size != desired.padded_size;
        let hardware = ctx.accel.decoder.is_hardware()
            && ctx.accel.encoder.is_hardware()
            && !(needs_pad && current.frame_data_location.is_software());
        let hardware_filter = if hardware {
            strategy.hardware_scale(&current, ctx)
        } else {
            None
        };
        let filter = hardware_filter.unwrap_or_else(|| Filter::SoftwareScale {
            scaled: desired.scaled_size,
            padded: desired.padded_size,
            algorithm: ctx.ffmpeg_state.software_scaling_algorithm.clone(),
            anamorphic: current.is_anamorphic,
            download_as: download_format(&current),
        });
        push_video(filter, &mut current);
    }

    // ---- Pad ----
    if current.padded_size != desired.padded_size {
        let filter = Filter::Pad {
            padded: desired.padded_size,
            download_as: download_format(&current),
        };
        push_video(filter, &mut current);
    }

    // ---- Still image ----
    if ctx.is_still_image {
        push_video(Filter::Loop, &mut current);
        if desired.realtime {
            push_video(Filter::Realtime, &mut current);
        }
    }

    // ---- Watermark ----
    if let Some(watermark) = watermark {
        if current.frame_data_location.is_hardware() {
            push_video(
                Filter::HardwareDownload {
                    format: surface_format(&current),
                },
                &mut current,
            );
        }
        if !watermark.is_still_image {
            watermark.source.add_option(InputOption::DoNotIgnoreLoop);
        }

        let settings = watermark.settings.clone();
        let frame = desired.padded_size;
        if !settings.fixed_size {
            let width = (settings.width_percent / 100.0 * f64::from(frame.width)).round() as u32;
            watermark.source.add_filter(Filter::WatermarkScale { width });
        }
        if settings.opacity < 100 {
            watermark.source.add_filter(Filter::WatermarkOpacity {
                percent: settings.opacity,
            });
        }
        watermark.source.add_filter(Filter::PixelFormat(PixelFormat::Yuva420p));

        let overlay = Filter::Overlay {
            position: settings.position,
            x: (settings.horizontal_margin / 100.0 * f64::from(frame.width)).round() as u32,
            y: (settings.vertical_margin / 100.0 * f64::from(frame.height)).round() as u32,
            ten_bit: desired.bit_depth() == 10,
        };
        current = overlay.next_state(&current);
        chain.watermark_overlay_filter_steps.push(overlay);
    }

    // ---- Encoder ----
    let encoder = if ctx.ffmpeg_state.output_format == OutputFormat::Nut {
        VideoEncoder::RawVideo
    } else {
        match strategy.encoder(ctx) {
            Some(encoder) => encoder,
            None => software_encoder(&desired.video_format, ctx.requested_mode)?,
        }
    };
    debug!("Selected video encoder {}", encoder.name());
    steps.push(PipelineStep::VideoEncoder(encoder));

    // ---- Pixel format ----
    let mut push_format = |filter: Filter, current: &mut FrameState| {
        *current = filter.next_state(current);
        chain.pixel_format_filter_steps.push(filter);
    };

    if !encoder.is_hardware() && current.frame_data_location.is_hardware() {
        push_format(
            Filter::HardwareDownload {
                format: surface_format(&current),
            },
            &mut current,
        );
    }

    if let Some(target) = desired.pixel_format.clone() {
        let location = current.frame_data_location;
        match location {
            FrameDataLocation::Hardware(mode) => {
                let surface = target.hardware_surface_format();
                if current.pixel_format.as_ref() != Some(&surface) {
                    push_format(Filter::HardwareFormat { mode, format: surface }, &mut current);
                }
            }
            _ if current.pixel_format.as_ref() == Some(&target) => {}
            _ if encoder.hardware_mode() == HardwareAccelerationMode::Vaapi => {
                push_format(Filter::PixelFormat(target), &mut current);
            }
            _ => {
                current.pixel_format = Some(target.clone());
                steps.push(PipelineStep::Output(OutputOption::PixelFormat(target)));
            }
        }
    }

    if encoder.hardware_mode() == HardwareAccelerationMode::Vaapi
        && !current.frame_data_location.is_hardware()
    {
        push_format(Filter::HardwareUploadVaapi, &mut current);
    }

    Ok(encoder.next_state(&current))
}

/// Audio sub-pipeline: encoder, channel reconciliation, rate control and filters.
fn build_audio(audio: &mut AudioInputSource, steps: &mut Vec<PipelineStep>) {
    let desired = audio.desired_state.clone();
    steps.push(PipelineStep::AudioEncoder(AudioEncoder(desired.encoder.clone())));
    if desired.is_copy() {
        return;
    }

    if let Some(stream) = audio.streams.first() {
        let downmix_aac = stream.codec.eq_ignore_ascii_case("aac") && desired.channels > 2;
        if stream.channels != desired.channels || downmix_aac {
            steps.push(PipelineStep::Output(OutputOption::AudioChannels(desired.channels)));
        }
    }
    if let Some(bitrate) = desired.bitrate {
        steps.push(PipelineStep::Output(OutputOption::AudioBitrate(bitrate)));
    }
    if let Some(buffer) = desired.buffer_size {
        steps.push(PipelineStep::Output(OutputOption::AudioBufferSize(buffer)));
    }
    if let Some(rate) = desired.sample_rate {
        steps.push(PipelineStep::Output(OutputOption::AudioSampleRate(rate)));
    }

    audio.source.add_filter(Filter::AudioFirstPts);
    if let Some(volume) = desired.volume.filter(|v| *v != 100) {
        audio.source.add_filter(Filter::Volume { percent: volume });
    }
    if let Some(duration_ms) = desired.duration_ms {
        audio.source.add_filter(Filter::AudioPad { duration_ms });
    }
}
